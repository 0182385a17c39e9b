mod engine;
mod types;

pub use engine::run_projection;
pub use types::{Inputs, Projection, YearIncrement, YearRecord, round_to_display};
