// =============================================================================
// Error types for the indicator engine
// =============================================================================
//
// Every indicator fails fast: an error is raised at the point of detection and
// propagated to the caller.  Nothing is zero-filled or silently truncated.

use thiserror::Error;

use crate::market_data::store::StoreError;

/// Result type alias for indicator operations.
pub type Result<T> = std::result::Result<T, IndicatorError>;

#[derive(Debug, Error)]
pub enum IndicatorError {
    /// Out-of-range or inconsistent parameters (zero periods, `long < short`,
    /// an interval amount larger than the available bars, ...).
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A formula hit a zero divisor, e.g. a flat bar with `high == low`.
    #[error("division by zero in {context}")]
    DivisionByZero { context: String },

    /// A series is shorter than the computation (including warm-up) needs.
    #[error("insufficient data for {context}: need {required}, got {available}")]
    InsufficientData {
        context: String,
        required: usize,
        available: usize,
    },

    /// A bar field could not be parsed as a real number.
    #[error("malformed bar at {timestamp}: field `{field}` has value {value:?}")]
    MalformedBar {
        timestamp: String,
        field: String,
        value: String,
    },

    /// An operation that needs at least one observation got none.
    #[error("empty input for {context}")]
    EmptyInput { context: String },

    /// The bar store could not satisfy a fetch.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IndicatorError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn division_by_zero(context: impl Into<String>) -> Self {
        Self::DivisionByZero {
            context: context.into(),
        }
    }

    pub fn insufficient_data(context: impl Into<String>, required: usize, available: usize) -> Self {
        Self::InsufficientData {
            context: context.into(),
            required,
            available,
        }
    }

    pub fn malformed_bar(
        timestamp: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::MalformedBar {
            timestamp: timestamp.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn empty_input(context: impl Into<String>) -> Self {
        Self::EmptyInput {
            context: context.into(),
        }
    }
}

/// Reject a zero period up front. Every windowed formula divides by it.
pub(crate) fn ensure_period(name: &str, period: usize) -> Result<()> {
    if period == 0 {
        return Err(IndicatorError::invalid_argument(format!(
            "{name} must be > 0"
        )));
    }
    Ok(())
}

/// Bars needed for `amount` output points plus `warm_up` earlier bars.
///
/// An amount so large that the sum leaves `usize` is an invalid argument.
pub(crate) fn lookback(amount: usize, warm_up: usize) -> Result<usize> {
    amount.checked_add(warm_up).ok_or_else(|| {
        IndicatorError::invalid_argument(format!(
            "interval amount {amount} plus {warm_up} warm-up bars overflows"
        ))
    })
}
