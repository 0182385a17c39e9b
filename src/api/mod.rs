use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{Inputs, Projection, YearIncrement, YearRecord, round_to_display, run_projection};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

// Widget bounds from the reference form; collected values are clamped into
// these, never rejected.
const MIN_INCREMENT_PERCENT: f64 = 0.0;
const MAX_INCREMENT_PERCENT: f64 = 100.0;
const MAX_YEAR_SPAN: i64 = 100;

#[derive(Parser, Debug)]
#[command(
    name = "payrise",
    about = "Year-wise compounding salary projection (package, increment, post increment)"
)]
struct Cli {
    #[arg(
        long,
        default_value_t = 8.5,
        help = "Salary at the start of the first year, in lacs"
    )]
    initial_salary: f64,
    #[arg(long, default_value_t = 2014, help = "First year of the projection")]
    start_year: i32,
    #[arg(
        long,
        default_value_t = 2025,
        help = "Last year of the projection, inclusive"
    )]
    end_year: i32,
    #[arg(
        long,
        default_value_t = 8.0,
        help = "Increment percent for years without an explicit override"
    )]
    default_increment: f64,
    #[arg(
        long = "increment",
        value_parser = parse_year_increment,
        help = "Per-year override as YEAR=PERCENT; may be repeated"
    )]
    increments: Vec<(i32, f64)>,
}

fn parse_year_increment(raw: &str) -> Result<(i32, f64), String> {
    let Some((year, percent)) = raw.split_once('=') else {
        return Err(format!("expected YEAR=PERCENT, got '{raw}'"));
    };
    let year = year
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("invalid year in '{raw}'"))?;
    let percent = percent
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid percent in '{raw}'"))?;
    Ok((year, percent))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    initial_salary: Option<f64>,
    start_year: Option<i32>,
    end_year: Option<i32>,
    default_increment: Option<f64>,
    increments: Option<Vec<IncrementOverride>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncrementOverride {
    year: i32,
    percent: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    start_year: i32,
    end_year: i32,
    initial_salary: f64,
    final_salary: f64,
    total_growth_percent: Option<f64>,
    records: Vec<YearRecord>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<Inputs, String> {
    if !cli.initial_salary.is_finite() {
        return Err("--initial-salary must be a finite number".to_string());
    }

    if !cli.default_increment.is_finite() {
        return Err("--default-increment must be a finite number".to_string());
    }

    if cli.end_year < cli.start_year {
        return Err("--end-year must be >= --start-year".to_string());
    }

    let span = i64::from(cli.end_year) - i64::from(cli.start_year) + 1;
    if span > MAX_YEAR_SPAN {
        return Err(format!(
            "--end-year must be within {MAX_YEAR_SPAN} years of --start-year"
        ));
    }

    let mut overrides: Vec<(i32, f64)> = Vec::with_capacity(cli.increments.len());
    for (year, percent) in &cli.increments {
        if !percent.is_finite() {
            return Err(format!("--increment {year} must carry a finite percent"));
        }
        if *year < cli.start_year || *year > cli.end_year {
            return Err(format!(
                "--increment year {year} is outside {}..={}",
                cli.start_year, cli.end_year
            ));
        }
        if overrides.iter().any(|(existing, _)| existing == year) {
            return Err(format!("--increment year {year} is given more than once"));
        }
        overrides.push((*year, *percent));
    }

    let initial_value = cli.initial_salary.max(0.0);
    let increments = (cli.start_year..=cli.end_year)
        .map(|year| {
            let percent = overrides
                .iter()
                .find(|(y, _)| *y == year)
                .map(|(_, p)| *p)
                .unwrap_or(cli.default_increment);
            YearIncrement {
                year,
                percent: percent.clamp(MIN_INCREMENT_PERCENT, MAX_INCREMENT_PERCENT),
            }
        })
        .collect();

    Ok(Inputs {
        initial_value,
        increments,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("payrise HTTP API listening on http://{addr}");
    tracing::info!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let inputs = match api_request_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let projection = run_projection(&inputs);
    tracing::debug!(years = projection.records.len(), "computed projection");
    json_response(StatusCode::OK, build_project_response(&inputs, &projection))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<Inputs, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ProjectPayload) -> Result<Inputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_salary {
        cli.initial_salary = v;
    }
    if let Some(v) = payload.start_year {
        cli.start_year = v;
    }
    if let Some(v) = payload.end_year {
        cli.end_year = v;
    }
    if let Some(v) = payload.default_increment {
        cli.default_increment = v;
    }
    if let Some(overrides) = payload.increments {
        cli.increments = overrides.into_iter().map(|o| (o.year, o.percent)).collect();
    }

    build_inputs(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_salary: 8.5,
        start_year: 2014,
        end_year: 2025,
        default_increment: 8.0,
        increments: Vec::new(),
    }
}

fn build_project_response(inputs: &Inputs, projection: &Projection) -> ProjectResponse {
    let start_year = inputs.increments.first().map(|s| s.year).unwrap_or(0);
    let end_year = inputs.increments.last().map(|s| s.year).unwrap_or(0);
    let final_salary = projection
        .final_record()
        .map(|r| r.closing_display())
        .unwrap_or_else(|| round_to_display(inputs.initial_value));
    let total_growth_percent = projection
        .total_growth_ratio()
        .map(|ratio| round_to_display((ratio - 1.0) * 100.0));

    ProjectResponse {
        start_year,
        end_year,
        initial_salary: round_to_display(inputs.initial_value),
        final_salary,
        total_growth_percent,
        records: projection.records.clone(),
    }
}

pub fn run_table_command(args: &[String]) -> Result<String, String> {
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    let inputs = build_inputs(cli)?;
    let projection = run_projection(&inputs);
    Ok(render_table(&projection))
}

fn render_table(projection: &Projection) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:>16} {:>15} {:>22}\n",
        "Year", "Package (Lacs)", "Increment (%)", "Post Increment (Lacs)"
    ));

    for record in &projection.records {
        out.push_str(&format!(
            "{:<6} {:>16.2} {:>15.2} {:>22.2}\n",
            record.year,
            record.opening_display(),
            record.increment_percent,
            record.closing_display(),
        ));
    }

    if let Some(last) = projection.final_record() {
        match projection.total_growth_ratio() {
            Some(ratio) => out.push_str(&format!(
                "\nFinal salary after {}: {:.2} ({:.1}% total growth)\n",
                last.year,
                last.closing_display(),
                (ratio - 1.0) * 100.0
            )),
            None => out.push_str(&format!(
                "\nFinal salary after {}: {:.2}\n",
                last.year,
                last.closing_display()
            )),
        }
    }

    out
}
