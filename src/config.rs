//! Transform configuration.
//!
//! [`LowpassConfig`] holds the two knobs of the low-pass transform. Paths and
//! variable names are passed explicitly to [`crate::run`]; nothing here is
//! process-wide.

/// Configuration for the low-pass trend filter.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use climlpf::LowpassConfig;
///
/// let cfg = LowpassConfig {
///     period_months: 120.0,   // decadal trend
///     ..LowpassConfig::default()
/// };
/// assert_eq!(cfg.time_dim, "time");
/// ```
#[derive(Debug, Clone)]
pub struct LowpassConfig {
    /// Cutoff period in months.
    ///
    /// Variability faster than this is removed. The time axis is assumed to
    /// be sampled once per month (30.41667 days), so the normalized cutoff is
    /// `2 / period_months` and the period must be strictly greater than 2.
    ///
    /// Default: `10.0` months.
    pub period_months: f64,

    /// Name of the dimension to filter along.
    ///
    /// Every other dimension (grid cells, levels, …) is filtered
    /// independently.
    ///
    /// Default: `"time"`.
    pub time_dim: String,
}

impl Default for LowpassConfig {
    fn default() -> Self {
        Self {
            period_months: 10.0,
            time_dim: "time".to_string(),
        }
    }
}
