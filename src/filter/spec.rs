//! Filter specification derived from a cutoff period in months.
//!
//! The time axis is sampled once per calendar month, approximated as
//! 30.41667 days:
//!   • fs   = 1 / (30.41667 · 24 · 3600)  Hz
//!   • nyq  = fs / 2
//!   • fc   = fs / period
//!   • Wn   = fc / nyq  (= 2 / period)
use crate::error::FilterError;

/// Butterworth order used by the transform.
pub const BUTTER_ORDER: usize = 4;

/// Average calendar month length in days.
pub const MONTH_DAYS: f64 = 30.41667;

/// Average calendar month length in seconds (the sampling interval).
pub const MONTH_SECONDS: f64 = MONTH_DAYS * 24.0 * 3600.0;

/// Normalized cutoffs below this are accepted but logged as close to the
/// conditioning limit of the section design.
pub const LOW_CUTOFF_WARN: f64 = 1e-3;

/// Order, cutoff period and sampling interval of one low-pass design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    pub order: usize,
    pub period_months: f64,
    pub interval_secs: f64,
}

impl FilterSpec {
    /// 4th-order specification for monthly data.
    pub fn monthly(period_months: f64) -> Self {
        Self {
            order: BUTTER_ORDER,
            period_months,
            interval_secs: MONTH_SECONDS,
        }
    }

    /// Sampling frequency in Hz.
    pub fn sampling_freq(&self) -> f64 {
        1.0 / self.interval_secs
    }

    /// Half the sampling frequency.
    pub fn nyquist(&self) -> f64 {
        self.sampling_freq() / 2.0
    }

    /// Cutoff frequency in Hz.
    pub fn cutoff_freq(&self) -> f64 {
        self.sampling_freq() / self.period_months
    }

    /// Cutoff as a fraction of Nyquist.
    pub fn normalized_cutoff(&self) -> f64 {
        self.cutoff_freq() / self.nyquist()
    }

    /// Return `Wn`, or [`FilterError::InvalidFilterSpec`] unless `0 < Wn < 1`.
    ///
    /// NaN fails both comparisons and is rejected too.
    pub fn validate(&self) -> Result<f64, FilterError> {
        let wn = self.normalized_cutoff();
        if wn > 0.0 && wn < 1.0 {
            Ok(wn)
        } else {
            Err(FilterError::InvalidFilterSpec {
                period_months: self.period_months,
                wn,
            })
        }
    }

    /// Cutoff period recovered from `Wn`, in months.
    ///
    /// Should equal `period_months` up to rounding; logged as a sanity check.
    pub fn effective_period_months(&self) -> f64 {
        let wn = self.normalized_cutoff();
        (1.0 / (wn * self.nyquist())) / self.interval_secs
    }
}
