use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrowthError {
    #[error("Invalid frequency: {0} periods per year (expected 1, 2, 4 or 12)")]
    InvalidFrequency(u32),

    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Result out of range in {context}")]
    OutOfRange { context: String },
}

pub type GrowthResult<T> = Result<T, GrowthError>;

impl GrowthError {
    pub(crate) fn invalid(field: &str, reason: &str) -> Self {
        GrowthError::InvalidInput {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn out_of_range(context: impl Into<String>) -> Self {
        GrowthError::OutOfRange {
            context: context.into(),
        }
    }
}
