use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    ContributionTiming, Frequency, GoalSolveConfig, GoalSolveIteration, GoalSolveResult,
    GoalType, GrowthError, GrowthPoint, GrowthSummary, InvestmentParameters, compute_series,
    compute_summary, solve_goal,
};
use crate::output::{OutputFormat, write_report};

const MAX_DURATION_YEARS: u32 = 10_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliFrequency {
    Annually,
    SemiAnnually,
    Quarterly,
    Monthly,
}

impl From<CliFrequency> for Frequency {
    fn from(value: CliFrequency) -> Self {
        match value {
            CliFrequency::Annually => Frequency::Annually,
            CliFrequency::SemiAnnually => Frequency::SemiAnnually,
            CliFrequency::Quarterly => Frequency::Quarterly,
            CliFrequency::Monthly => Frequency::Monthly,
        }
    }
}

impl From<Frequency> for CliFrequency {
    fn from(value: Frequency) -> Self {
        match value {
            Frequency::Annually => CliFrequency::Annually,
            Frequency::SemiAnnually => CliFrequency::SemiAnnually,
            Frequency::Quarterly => CliFrequency::Quarterly,
            Frequency::Monthly => CliFrequency::Monthly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliTiming {
    Beginning,
    End,
}

impl From<CliTiming> for ContributionTiming {
    fn from(value: CliTiming) -> Self {
        match value {
            CliTiming::Beginning => ContributionTiming::Beginning,
            CliTiming::End => ContributionTiming::End,
        }
    }
}

/// Frequency as sent by web clients: either a label ("monthly", "Semi-Annually")
/// or a period count (12). Query strings always deliver the string form.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
enum ApiFrequency {
    Periods(u32),
    Label(String),
}

impl ApiFrequency {
    fn resolve(&self, field: &str) -> Result<CliFrequency, String> {
        let frequency = match self {
            ApiFrequency::Periods(n) => Frequency::from_periods(*n),
            ApiFrequency::Label(label) => {
                let normalized = label.trim().to_ascii_lowercase().replace(['_', ' '], "-");
                if let Ok(n) = normalized.parse::<u32>() {
                    Frequency::from_periods(n)
                } else {
                    match normalized.as_str() {
                        "annually" | "annual" | "yearly" => Ok(Frequency::Annually),
                        "semi-annually" | "semiannually" | "semi-annual" => {
                            Ok(Frequency::SemiAnnually)
                        }
                        "quarterly" => Ok(Frequency::Quarterly),
                        "monthly" => Ok(Frequency::Monthly),
                        _ => return Err(format!("--{field}: unknown frequency '{label}'")),
                    }
                }
            }
        };
        frequency
            .map(CliFrequency::from)
            .map_err(|e| format!("--{field}: {e}"))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ApiTiming {
    #[serde(alias = "Beginning", alias = "start")]
    Beginning,
    #[serde(alias = "End")]
    End,
}

impl ApiTiming {
    pub(crate) fn label(self) -> &'static str {
        match self {
            ApiTiming::Beginning => "beginning",
            ApiTiming::End => "end",
        }
    }
}

impl From<ApiTiming> for CliTiming {
    fn from(value: ApiTiming) -> Self {
        match value {
            ApiTiming::Beginning => CliTiming::Beginning,
            ApiTiming::End => CliTiming::End,
        }
    }
}

impl From<ContributionTiming> for ApiTiming {
    fn from(value: ContributionTiming) -> Self {
        match value {
            ContributionTiming::Beginning => ApiTiming::Beginning,
            ContributionTiming::End => ApiTiming::End,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiGoalType {
    #[serde(
        alias = "requiredContribution",
        alias = "required_contribution",
        alias = "contribution"
    )]
    RequiredContribution,
    #[serde(alias = "requiredRate", alias = "required_rate", alias = "rate")]
    RequiredRate,
}

impl From<ApiGoalType> for GoalType {
    fn from(value: ApiGoalType) -> Self {
        match value {
            ApiGoalType::RequiredContribution => GoalType::RequiredContribution,
            ApiGoalType::RequiredRate => GoalType::RequiredRate,
        }
    }
}

impl From<GoalType> for ApiGoalType {
    fn from(value: GoalType) -> Self {
        match value {
            GoalType::RequiredContribution => ApiGoalType::RequiredContribution,
            GoalType::RequiredRate => ApiGoalType::RequiredRate,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    #[serde(alias = "initial_amount", alias = "initial")]
    initial_amount: Option<f64>,
    #[serde(alias = "duration_years", alias = "duration", alias = "years")]
    duration_years: Option<u32>,
    #[serde(alias = "interest_rate", alias = "annualRatePercent", alias = "rate")]
    interest_rate: Option<f64>,
    #[serde(alias = "compounding_frequency", alias = "compoundFreq")]
    compounding_frequency: Option<ApiFrequency>,
    #[serde(alias = "additionalContribution", alias = "contributionAmount")]
    contribution: Option<f64>,
    #[serde(alias = "contribution_frequency", alias = "contributionFreq")]
    contribution_frequency: Option<ApiFrequency>,
    #[serde(alias = "contribute_at", alias = "contributionTiming", alias = "timing")]
    contribute_at: Option<ApiTiming>,
    #[serde(alias = "summary_only")]
    summary_only: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SolvePayload {
    #[serde(flatten)]
    params: CalculatePayload,
    goal: Option<ApiGoalType>,
    #[serde(alias = "target_amount", alias = "target")]
    target_amount: Option<f64>,
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "growth",
    about = "Compound interest projection with periodic contributions",
    after_help = "Run `growth serve [port]` to start the JSON HTTP API instead."
)]
pub struct Cli {
    #[arg(long, default_value_t = 1000.0, help = "Initial deposit")]
    initial_amount: f64,
    #[arg(long, default_value_t = 10)]
    duration_years: u32,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Nominal annual interest rate in percent, e.g. 5"
    )]
    interest_rate: f64,
    #[arg(long, value_enum, default_value_t = CliFrequency::Annually)]
    compounding_frequency: CliFrequency,
    #[arg(
        long,
        default_value_t = 100.0,
        help = "Additional contribution per contribution period"
    )]
    contribution: f64,
    #[arg(long, value_enum, default_value_t = CliFrequency::Monthly)]
    contribution_frequency: CliFrequency,
    #[arg(long, value_enum, default_value_t = CliTiming::Beginning)]
    contribute_at: CliTiming,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(long, help = "Only print the final amount, total invested and profit")]
    summary_only: bool,
}

#[derive(Debug)]
struct SolveRequest {
    params: InvestmentParameters,
    config: GoalSolveConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CalculateResponse {
    pub(crate) compounding_frequency: &'static str,
    pub(crate) contribution_frequency: &'static str,
    pub(crate) contribute_at: ApiTiming,
    pub(crate) base_frequency: u32,
    pub(crate) total_contributions: u64,
    pub(crate) summary: GrowthSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) series: Option<Vec<GrowthPoint>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveIterationResponse {
    iteration: u32,
    lower_bound: f64,
    upper_bound: f64,
    candidate_value: f64,
    final_amount: f64,
}

impl From<&GoalSolveIteration> for SolveIterationResponse {
    fn from(value: &GoalSolveIteration) -> Self {
        Self {
            iteration: value.iteration,
            lower_bound: value.lower_bound,
            upper_bound: value.upper_bound,
            candidate_value: value.candidate_value,
            final_amount: value.final_amount,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveResponse {
    goal: ApiGoalType,
    target_amount: f64,
    search_min: f64,
    search_max: f64,
    tolerance: f64,
    max_iterations: u32,
    solved_value: Option<f64>,
    achieved_final_amount: Option<f64>,
    converged: bool,
    feasible: bool,
    message: String,
    iterations: Vec<SolveIterationResponse>,
}

impl From<&GoalSolveResult> for SolveResponse {
    fn from(value: &GoalSolveResult) -> Self {
        Self {
            goal: value.goal_type.into(),
            target_amount: value.target_amount,
            search_min: value.search_min,
            search_max: value.search_max,
            tolerance: value.tolerance,
            max_iterations: value.max_iterations,
            solved_value: value.solved_value,
            achieved_final_amount: value.achieved_final_amount,
            converged: value.converged,
            feasible: value.feasible,
            message: value.message.clone(),
            iterations: value.iterations.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_params(cli: &Cli) -> Result<InvestmentParameters, String> {
    if !cli.initial_amount.is_finite() || cli.initial_amount < 0.0 {
        return Err("--initial-amount must be >= 0".to_string());
    }

    if cli.duration_years == 0 {
        return Err("--duration-years must be >= 1".to_string());
    }

    if cli.duration_years > MAX_DURATION_YEARS {
        return Err(format!("--duration-years must be <= {MAX_DURATION_YEARS}"));
    }

    if !cli.interest_rate.is_finite() || cli.interest_rate < 0.0 {
        return Err("--interest-rate must be >= 0".to_string());
    }

    if !cli.contribution.is_finite() || cli.contribution < 0.0 {
        return Err("--contribution must be >= 0".to_string());
    }

    Ok(InvestmentParameters {
        initial_amount: cli.initial_amount,
        duration_years: cli.duration_years,
        annual_rate_percent: cli.interest_rate,
        compounding_frequency: cli.compounding_frequency.into(),
        contribution_amount: cli.contribution,
        contribution_frequency: cli.contribution_frequency.into(),
        contribution_timing: cli.contribute_at.into(),
    })
}

pub(crate) fn build_calculate_response(
    params: &InvestmentParameters,
    include_series: bool,
) -> Result<CalculateResponse, GrowthError> {
    let summary = compute_summary(params)?;
    let curve = compute_series(params)?;
    let timeline = *curve.timeline();
    let series = include_series.then(|| curve.collect());

    Ok(CalculateResponse {
        compounding_frequency: params.compounding_frequency.label(),
        contribution_frequency: params.contribution_frequency.label(),
        contribute_at: params.contribution_timing.into(),
        base_frequency: timeline.base_frequency,
        total_contributions: timeline.total_contributions,
        summary,
        series,
    })
}

/// Runs one calculation from parsed command-line flags and prints it to stdout.
pub fn run_cli(cli: Cli) -> Result<(), String> {
    let params = build_params(&cli)?;
    let response =
        build_calculate_response(&params, !cli.summary_only).map_err(|e| e.to_string())?;
    let stdout = io::stdout();
    write_report(cli.output, &response, stdout.lock())
        .map_err(|e| format!("Failed to write output: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .route("/api/solve", post(solve_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("Growth HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/calculate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_get_handler(Query(payload): Query<CalculatePayload>) -> Response {
    calculate_handler_impl(payload).await
}

async fn calculate_post_handler(Json(payload): Json<CalculatePayload>) -> Response {
    calculate_handler_impl(payload).await
}

async fn calculate_handler_impl(payload: CalculatePayload) -> Response {
    let include_series = !payload.summary_only.unwrap_or(false);
    let params = match params_from_payload(payload) {
        Ok(params) => params,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match build_calculate_response(&params, include_series) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => growth_error_response(&e),
    }
}

async fn solve_handler(Json(payload): Json<SolvePayload>) -> Response {
    let request = match solve_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match solve_goal(&request.params, request.config) {
        Ok(result) => json_response(StatusCode::OK, SolveResponse::from(&result)),
        Err(e) => growth_error_response(&e),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
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

fn growth_error_status(err: &GrowthError) -> StatusCode {
    match err {
        GrowthError::OutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        GrowthError::InvalidFrequency(_) | GrowthError::InvalidInput { .. } => {
            StatusCode::BAD_REQUEST
        }
    }
}

fn growth_error_response(err: &GrowthError) -> Response {
    error_response(growth_error_status(err), &err.to_string())
}

#[cfg(test)]
fn params_from_json(json: &str) -> Result<InvestmentParameters, String> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    params_from_payload(payload)
}

fn params_from_payload(payload: CalculatePayload) -> Result<InvestmentParameters, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_amount {
        cli.initial_amount = v;
    }
    if let Some(v) = payload.duration_years {
        cli.duration_years = v;
    }
    if let Some(v) = payload.interest_rate {
        cli.interest_rate = v;
    }
    if let Some(v) = payload.compounding_frequency {
        cli.compounding_frequency = v.resolve("compounding-frequency")?;
    }
    if let Some(v) = payload.contribution {
        cli.contribution = v;
    }
    if let Some(v) = payload.contribution_frequency {
        cli.contribution_frequency = v.resolve("contribution-frequency")?;
    }
    if let Some(v) = payload.contribute_at {
        cli.contribute_at = v.into();
    }

    build_params(&cli)
}

fn solve_request_from_payload(payload: SolvePayload) -> Result<SolveRequest, String> {
    let params = params_from_payload(payload.params)?;

    let Some(goal) = payload.goal else {
        return Err("--goal is required (required-contribution or required-rate)".to_string());
    };
    let Some(target_amount) = payload.target_amount else {
        return Err("--target-amount is required".to_string());
    };

    let mut config = GoalSolveConfig::with_defaults(goal.into(), target_amount);
    if let Some(v) = payload.search_min {
        config.search_min = v;
    }
    if let Some(v) = payload.search_max {
        config.search_max = v;
    }
    if let Some(v) = payload.tolerance {
        config.tolerance = v;
    }
    if let Some(v) = payload.max_iterations {
        config.max_iterations = v;
    }

    Ok(SolveRequest { params, config })
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_amount: 1_000.0,
        duration_years: 10,
        interest_rate: 5.0,
        compounding_frequency: CliFrequency::Annually,
        contribution: 100.0,
        contribution_frequency: CliFrequency::Monthly,
        contribute_at: CliTiming::Beginning,
        output: OutputFormat::Json,
        summary_only: false,
    }
}
