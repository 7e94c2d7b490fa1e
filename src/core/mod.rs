mod engine;
mod error;
mod solver;
mod types;

pub use engine::{GrowthCurve, Timeline, compute_series, compute_summary};
pub use error::{GrowthError, GrowthResult};
pub use solver::{GoalSolveConfig, GoalSolveIteration, GoalSolveResult, GoalType, solve_goal};
pub use types::{ContributionTiming, Frequency, GrowthPoint, GrowthSummary, InvestmentParameters};
