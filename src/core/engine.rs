use super::types::{Inputs, Projection, YearRecord};

/// Applies each year's increment to the running value, in the order given.
///
/// The value carried into the next year is the exact closing value; display
/// rounding happens downstream and never feeds back into the recurrence.
pub fn run_projection(inputs: &Inputs) -> Projection {
    let mut records = Vec::with_capacity(inputs.increments.len());
    let mut current = inputs.initial_value;

    for step in &inputs.increments {
        let closing = current * (1.0 + step.percent / 100.0);
        records.push(YearRecord {
            year: step.year,
            opening_value: current,
            increment_percent: step.percent,
            closing_value: closing,
        });
        current = closing;
    }

    Projection { records }
}
