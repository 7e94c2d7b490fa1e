use serde::Serialize;

use super::error::GrowthError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Frequency {
    Annually,
    SemiAnnually,
    Quarterly,
    Monthly,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Annually,
        Frequency::SemiAnnually,
        Frequency::Quarterly,
        Frequency::Monthly,
    ];

    pub const fn periods_per_year(self) -> u32 {
        match self {
            Frequency::Annually => 1,
            Frequency::SemiAnnually => 2,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
        }
    }

    pub fn from_periods(periods: u32) -> Result<Self, GrowthError> {
        match periods {
            1 => Ok(Frequency::Annually),
            2 => Ok(Frequency::SemiAnnually),
            4 => Ok(Frequency::Quarterly),
            12 => Ok(Frequency::Monthly),
            other => Err(GrowthError::InvalidFrequency(other)),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Frequency::Annually => "Annually",
            Frequency::SemiAnnually => "Semi-Annually",
            Frequency::Quarterly => "Quarterly",
            Frequency::Monthly => "Monthly",
        }
    }
}

impl TryFrom<u32> for Frequency {
    type Error = GrowthError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Frequency::from_periods(value)
    }
}

/// When each periodic contribution is posted within its interval.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ContributionTiming {
    /// Annuity-due: the contribution earns growth over its own interval.
    Beginning,
    /// Ordinary annuity.
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentParameters {
    pub initial_amount: f64,
    pub duration_years: u32,
    pub annual_rate_percent: f64,
    pub compounding_frequency: Frequency,
    pub contribution_amount: f64,
    pub contribution_frequency: Frequency,
    pub contribution_timing: ContributionTiming,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthSummary {
    pub final_amount: f64,
    pub total_invested: f64,
    pub total_profit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPoint {
    pub step: u64,
    pub time_years: f64,
    pub portfolio_value: f64,
    pub baseline_value: f64,
}
