use std::iter::FusedIterator;

use super::error::{GrowthError, GrowthResult};
use super::types::{ContributionTiming, GrowthPoint, GrowthSummary, InvestmentParameters};

/// Common period grid on which both compounding and contribution events land on
/// integer boundaries, plus the per-period rates derived for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeline {
    pub base_frequency: u32,
    pub base_rate: f64,
    pub steps_per_contribution: u32,
    pub contribution_step_rate: f64,
    pub total_contributions: u64,
    pub total_steps: u64,
    // ln(1 + base_rate); growth over n steps is exp(n * log_step_growth).
    log_step_growth: f64,
}

impl Timeline {
    pub fn new(params: &InvestmentParameters) -> GrowthResult<Self> {
        validate_parameters(params)?;

        let k = params.compounding_frequency.periods_per_year();
        let m = params.contribution_frequency.periods_per_year();
        let base_frequency = lcm(k, m);
        let steps_per_contribution = base_frequency / m;

        let nominal = params.annual_rate_percent / 100.0;
        let log_step_growth = (k as f64 / base_frequency as f64) * (nominal / k as f64).ln_1p();
        let base_rate = log_step_growth.exp_m1();
        let contribution_step_rate = (steps_per_contribution as f64 * log_step_growth).exp_m1();
        if !base_rate.is_finite() || !contribution_step_rate.is_finite() {
            return Err(GrowthError::out_of_range("per-period rate"));
        }

        let years = u64::from(params.duration_years);
        Ok(Self {
            base_frequency,
            base_rate,
            steps_per_contribution,
            contribution_step_rate,
            total_contributions: u64::from(m) * years,
            total_steps: u64::from(base_frequency) * years,
            log_step_growth,
        })
    }

    pub fn growth_factor(&self, steps: u64) -> f64 {
        (steps as f64 * self.log_step_growth).exp()
    }

    /// Future value of one unit contributed per interval, `count` times.
    pub fn annuity_factor(&self, count: u64, timing: ContributionTiming) -> f64 {
        let rate = self.contribution_step_rate;
        if rate == 0.0 {
            return count as f64;
        }
        let log_interval_growth = self.steps_per_contribution as f64 * self.log_step_growth;
        let ordinary = (count as f64 * log_interval_growth).exp_m1() / rate;
        match timing {
            ContributionTiming::End => ordinary,
            ContributionTiming::Beginning => ordinary * (1.0 + rate),
        }
    }

    /// Contribution events elapsed by the end of base period `step`.
    pub fn contributions_elapsed(&self, step: u64) -> u64 {
        step / u64::from(self.steps_per_contribution)
    }
}

pub fn compute_summary(params: &InvestmentParameters) -> GrowthResult<GrowthSummary> {
    let projection = Projection::new(params)?;
    let last = projection.checked_final_point()?;
    let total_invested = last.baseline_value;
    Ok(GrowthSummary {
        final_amount: last.portfolio_value,
        total_invested,
        total_profit: last.portfolio_value - total_invested,
    })
}

pub fn compute_series(params: &InvestmentParameters) -> GrowthResult<GrowthCurve> {
    let projection = Projection::new(params)?;
    projection.checked_final_point()?;
    Ok(GrowthCurve {
        projection,
        next_step: 0,
    })
}

/// Lazy growth curve over base periods `0..=total_steps`.
///
/// Cloning before iteration gives an independent copy of the remaining samples.
#[derive(Debug, Clone)]
pub struct GrowthCurve {
    projection: Projection,
    next_step: u64,
}

impl GrowthCurve {
    pub fn timeline(&self) -> &Timeline {
        &self.projection.timeline
    }

    pub fn final_point(&self) -> GrowthPoint {
        self.projection.point(self.projection.timeline.total_steps)
    }
}

impl Iterator for GrowthCurve {
    type Item = GrowthPoint;

    fn next(&mut self) -> Option<GrowthPoint> {
        if self.next_step > self.projection.timeline.total_steps {
            return None;
        }
        let point = self.projection.point(self.next_step);
        self.next_step += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.projection.timeline.total_steps + 1).saturating_sub(self.next_step);
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GrowthCurve {}

impl FusedIterator for GrowthCurve {}

#[derive(Debug, Clone, Copy)]
struct Projection {
    timeline: Timeline,
    initial_amount: f64,
    contribution_amount: f64,
    timing: ContributionTiming,
}

impl Projection {
    fn new(params: &InvestmentParameters) -> GrowthResult<Self> {
        Ok(Self {
            timeline: Timeline::new(params)?,
            initial_amount: params.initial_amount,
            contribution_amount: params.contribution_amount,
            timing: params.contribution_timing,
        })
    }

    fn point(&self, step: u64) -> GrowthPoint {
        let timeline = &self.timeline;
        let elapsed = timeline.contributions_elapsed(step);

        let fv_initial = scaled(self.initial_amount, || timeline.growth_factor(step));
        let fv_contrib = scaled(self.contribution_amount, || {
            timeline.annuity_factor(elapsed, self.timing)
        });

        let baseline_count = match self.timing {
            ContributionTiming::Beginning => (elapsed + 1).min(timeline.total_contributions),
            ContributionTiming::End => elapsed.min(timeline.total_contributions),
        };

        GrowthPoint {
            step,
            time_years: step as f64 / timeline.base_frequency as f64,
            portfolio_value: fv_initial + fv_contrib,
            baseline_value: self.initial_amount + self.contribution_amount * baseline_count as f64,
        }
    }

    // Every sample is bounded above by the final one, so a finite final sample
    // means the whole curve is finite.
    fn checked_final_point(&self) -> GrowthResult<GrowthPoint> {
        let last = self.point(self.timeline.total_steps);
        if !last.portfolio_value.is_finite() {
            return Err(GrowthError::out_of_range("final portfolio value"));
        }
        if !last.baseline_value.is_finite() {
            return Err(GrowthError::out_of_range("total invested"));
        }
        Ok(last)
    }
}

// A zero amount contributes nothing even when its growth factor overflows.
fn scaled(amount: f64, factor: impl FnOnce() -> f64) -> f64 {
    if amount == 0.0 { 0.0 } else { amount * factor() }
}

fn validate_parameters(params: &InvestmentParameters) -> GrowthResult<()> {
    if !params.initial_amount.is_finite() || params.initial_amount < 0.0 {
        return Err(GrowthError::invalid(
            "initial_amount",
            "must be a finite value >= 0",
        ));
    }
    if params.duration_years == 0 {
        return Err(GrowthError::invalid("duration_years", "must be >= 1"));
    }
    if !params.annual_rate_percent.is_finite() || params.annual_rate_percent < 0.0 {
        return Err(GrowthError::invalid(
            "annual_rate_percent",
            "must be a finite value >= 0",
        ));
    }
    if !params.contribution_amount.is_finite() || params.contribution_amount < 0.0 {
        return Err(GrowthError::invalid(
            "contribution_amount",
            "must be a finite value >= 0",
        ));
    }
    Ok(())
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: u32, b: u32) -> u32 {
    a / gcd(a, b) * b
}
