use super::engine::compute_summary;
use super::error::{GrowthError, GrowthResult};
use super::types::InvestmentParameters;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GoalType {
    RequiredContribution,
    RequiredRate,
}

#[derive(Debug, Clone, Copy)]
pub struct GoalSolveConfig {
    pub goal_type: GoalType,
    pub target_amount: f64,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl GoalSolveConfig {
    pub fn with_defaults(goal_type: GoalType, target_amount: f64) -> Self {
        let (search_max, tolerance) = match goal_type {
            GoalType::RequiredContribution => (target_amount.max(1.0), 0.01),
            GoalType::RequiredRate => (100.0, 1e-6),
        };
        Self {
            goal_type,
            target_amount,
            search_min: 0.0,
            search_max,
            tolerance,
            max_iterations: 200,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GoalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub final_amount: f64,
}

#[derive(Debug, Clone)]
pub struct GoalSolveResult {
    pub goal_type: GoalType,
    pub target_amount: f64,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub solved_value: Option<f64>,
    pub achieved_final_amount: Option<f64>,
    pub iterations: Vec<GoalSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

/// Finds the smallest contribution (or annual rate in percent) for which the
/// projected final amount reaches `config.target_amount`. Final amount is
/// non-decreasing in both, so bisection over the search bounds applies.
pub fn solve_goal(
    params: &InvestmentParameters,
    config: GoalSolveConfig,
) -> GrowthResult<GoalSolveResult> {
    validate_config(config)?;

    let mut iterations = Vec::new();
    let low_amount = evaluate_candidate(params, config.goal_type, config.search_min)?;
    let high_amount = evaluate_candidate(params, config.goal_type, config.search_max)?;

    let mut solved_value = None;
    let mut converged = false;
    let feasible;
    let message;

    if low_amount >= config.target_amount {
        solved_value = Some(config.search_min);
        converged = true;
        feasible = true;
        message = "Already meets target at lower bound.".to_string();
    } else if high_amount < config.target_amount {
        feasible = false;
        message = "No feasible value found within the search bounds.".to_string();
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let final_amount = evaluate_candidate(params, config.goal_type, mid)?;
            iterations.push(GoalSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_value: mid,
                final_amount,
            });

            if final_amount >= config.target_amount {
                hi = mid;
            } else {
                lo = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                break;
            }
        }
        solved_value = Some(hi);
        feasible = true;
        message = match (converged, config.goal_type) {
            (true, GoalType::RequiredContribution) => "Solved required contribution.".to_string(),
            (true, GoalType::RequiredRate) => "Solved required interest rate.".to_string(),
            (false, _) => {
                "Reached max iterations before tolerance was met; returning best estimate."
                    .to_string()
            }
        };
    }

    let achieved_final_amount = match solved_value {
        Some(value) => Some(evaluate_candidate(params, config.goal_type, value)?),
        None => None,
    };

    Ok(GoalSolveResult {
        goal_type: config.goal_type,
        target_amount: config.target_amount,
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
        solved_value,
        achieved_final_amount,
        iterations,
        converged,
        feasible,
        message,
    })
}

fn evaluate_candidate(
    base_params: &InvestmentParameters,
    goal_type: GoalType,
    candidate_value: f64,
) -> GrowthResult<f64> {
    let mut params = base_params.clone();
    match goal_type {
        GoalType::RequiredContribution => params.contribution_amount = candidate_value.max(0.0),
        GoalType::RequiredRate => params.annual_rate_percent = candidate_value.max(0.0),
    }

    match compute_summary(&params) {
        Ok(summary) => Ok(summary.final_amount),
        // Overflow only happens far above any finite target.
        Err(GrowthError::OutOfRange { .. }) => Ok(f64::INFINITY),
        Err(e) => Err(e),
    }
}

fn validate_config(config: GoalSolveConfig) -> GrowthResult<()> {
    if !config.target_amount.is_finite() || config.target_amount <= 0.0 {
        return Err(GrowthError::invalid("target_amount", "must be > 0"));
    }
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err(GrowthError::invalid("search_bounds", "must be finite"));
    }
    if config.search_min < 0.0 {
        return Err(GrowthError::invalid("search_min", "must be >= 0"));
    }
    if config.search_max <= config.search_min {
        return Err(GrowthError::invalid(
            "search_max",
            "must be greater than search_min",
        ));
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(GrowthError::invalid("tolerance", "must be > 0"));
    }
    if config.max_iterations == 0 {
        return Err(GrowthError::invalid("max_iterations", "must be > 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ContributionTiming, Frequency};

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn zero_rate_params() -> InvestmentParameters {
        InvestmentParameters {
            initial_amount: 1_000.0,
            duration_years: 10,
            annual_rate_percent: 0.0,
            compounding_frequency: Frequency::Annually,
            contribution_amount: 0.0,
            contribution_frequency: Frequency::Monthly,
            contribution_timing: ContributionTiming::End,
        }
    }

    #[test]
    fn required_contribution_solver_finds_linear_solution() {
        let params = zero_rate_params();
        let config = GoalSolveConfig {
            goal_type: GoalType::RequiredContribution,
            target_amount: 13_000.0,
            search_min: 0.0,
            search_max: 500.0,
            tolerance: 0.01,
            max_iterations: 64,
        };

        let result = solve_goal(&params, config).expect("must solve");
        assert!(result.feasible);
        assert!(result.converged);
        assert!(!result.iterations.is_empty());
        assert_close(result.solved_value.expect("value expected"), 100.0, 0.02);
        assert!(result.achieved_final_amount.expect("amount expected") >= 13_000.0);
    }

    #[test]
    fn required_rate_solver_recovers_known_rate() {
        let mut params = zero_rate_params();
        params.contribution_amount = 100.0;
        params.annual_rate_percent = 5.0;
        let target = compute_summary(&params).expect("summary").final_amount;
        params.annual_rate_percent = 0.0;

        let config = GoalSolveConfig::with_defaults(GoalType::RequiredRate, target);
        let result = solve_goal(&params, config).expect("must solve");
        assert!(result.feasible);
        assert!(result.converged);
        assert_close(result.solved_value.expect("rate expected"), 5.0, 1e-4);
    }

    #[test]
    fn solver_reports_target_already_met() {
        let params = zero_rate_params();
        let config = GoalSolveConfig::with_defaults(GoalType::RequiredContribution, 500.0);
        let result = solve_goal(&params, config).expect("must return result");
        assert!(result.feasible);
        assert_eq!(result.solved_value, Some(0.0));
        assert!(result.iterations.is_empty());
    }

    #[test]
    fn solver_reports_infeasible_when_bounds_too_low() {
        let params = zero_rate_params();
        let config = GoalSolveConfig {
            goal_type: GoalType::RequiredContribution,
            target_amount: 13_000.0,
            search_min: 0.0,
            search_max: 50.0,
            tolerance: 0.5,
            max_iterations: 16,
        };

        let result = solve_goal(&params, config).expect("must return result");
        assert!(!result.feasible);
        assert!(result.solved_value.is_none());
        assert!(result.achieved_final_amount.is_none());
    }

    #[test]
    fn solver_treats_overflowing_candidates_as_reaching_target() {
        let mut params = zero_rate_params();
        params.duration_years = 5_000;
        params.compounding_frequency = Frequency::Monthly;
        let config = GoalSolveConfig {
            goal_type: GoalType::RequiredRate,
            target_amount: 1e12,
            search_min: 0.0,
            search_max: 1e6,
            tolerance: 1e-6,
            max_iterations: 200,
        };

        let result = solve_goal(&params, config).expect("must solve");
        assert!(result.feasible);
        let rate = result.solved_value.expect("rate expected");
        assert!(rate > 0.0 && rate < 1.0, "unexpected rate {rate}");
    }

    #[test]
    fn solver_rejects_invalid_config() {
        let params = zero_rate_params();
        let mut config = GoalSolveConfig::with_defaults(GoalType::RequiredContribution, 10_000.0);
        config.search_max = config.search_min;
        let err = solve_goal(&params, config).expect_err("must reject bounds");
        assert!(err.to_string().contains("search_max"));

        let config = GoalSolveConfig::with_defaults(GoalType::RequiredRate, -1.0);
        let err = solve_goal(&params, config).expect_err("must reject target");
        assert!(err.to_string().contains("target_amount"));
    }
}
