//! Error taxonomy of the low-pass transform.
use thiserror::Error;

/// Errors raised while designing or applying the low-pass filter.
///
/// Every variant is terminal for the invocation: nothing is written back to
/// the caller's array when one of these is returned.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Normalized cutoff is not strictly inside `(0, 1)`.
    ///
    /// With monthly sampling `Wn = 2 / period_months`, so any period `<= 2`
    /// (or a non-finite one) ends up here.
    #[error(
        "invalid filter specification: a {period_months}-month cutoff gives \
         normalized cutoff {wn}, which must lie strictly inside (0, 1)"
    )]
    InvalidFilterSpec { period_months: f64, wn: f64 },

    /// Butterworth order the section design cannot express.
    #[error("invalid filter specification: order {0} is not a positive even number")]
    UnsupportedOrder(usize),

    /// Named time dimension is not one of the variable's dimensions.
    #[error("time axis {dim:?} not found in dimensions {dims:?}")]
    AxisNotFound { dim: String, dims: Vec<String> },

    /// Axis index outside the array rank.
    #[error("axis {axis} is out of bounds for an array of rank {ndim}")]
    AxisOutOfBounds { axis: usize, ndim: usize },

    /// Too few samples along the filtering axis for the even padding.
    #[error(
        "axis {axis} has {len} samples; zero-phase filtering with padlen \
         {padlen} needs more than {padlen}"
    )]
    SeriesTooShort { axis: usize, len: usize, padlen: usize },

    /// The section design lost precision (very low normalized cutoff).
    #[error("numerically unstable design at normalized cutoff {wn:e}: {reason}")]
    NumericInstability { wn: f64, reason: String },
}

impl FilterError {
    /// `true` for the axis family (missing, out of range, too short).
    pub fn is_axis_error(&self) -> bool {
        matches!(
            self,
            FilterError::AxisNotFound { .. }
                | FilterError::AxisOutOfBounds { .. }
                | FilterError::SeriesTooShort { .. }
        )
    }

    /// `true` for a rejected filter specification (cutoff or order).
    pub fn is_invalid_spec(&self) -> bool {
        matches!(
            self,
            FilterError::InvalidFilterSpec { .. } | FilterError::UnsupportedOrder(_)
        )
    }
}
