//! Low-pass trend filter for monthly series with missing values.
//!
//! `lowpass` is the whole transform:
//!   1. Wn = 2 / period_months, rejected unless 0 < Wn < 1
//!   2. 4th-order Butterworth low-pass in second-order sections
//!   3. NaN → 0, remembering the NaN mask
//!   4. forward-backward filtering along the time axis, even padding
//!   5. NaN written back wherever the input was NaN
//!
//! Zero-filling keeps a single gap from contaminating the whole series under
//! the IIR response. Samples next to a gap see a transient from the filled
//! zeros; the gap positions themselves are masked out again.
use log::info;
use ndarray::{ArrayD, ArrayViewD, Axis, Zip};

use crate::config::LowpassConfig;
use crate::dataset::Variable;
use crate::error::FilterError;
use crate::filter::{butter_lowpass_sos, sosfiltfilt, FilterSpec, BUTTER_ORDER};

/// Zero-phase low-pass filter `series` along `axis`.
///
/// Every lane along `axis` is filtered independently. The result has the
/// shape of `series`, holds NaN exactly where `series` holds NaN, and the
/// filtered value everywhere else.
///
/// # Errors
///
/// * [`FilterError::InvalidFilterSpec`] when `period_months <= 2` (or is not
///   finite and positive); checked before anything else.
/// * [`FilterError::AxisOutOfBounds`] / [`FilterError::SeriesTooShort`] when
///   `axis` does not exist or has 15 samples or fewer.
/// * [`FilterError::NumericInstability`] when the period is so long that the
///   section design is no longer trustworthy.
///
/// # Examples
///
/// ```
/// use climlpf::lowpass;
/// use ndarray::{Array1, Axis};
///
/// let x = Array1::from_elem(48, 4.0).into_dyn();
/// let y = lowpass(x.view(), Axis(0), 12.0).unwrap();
/// assert!((y[[20]] - 4.0).abs() < 1e-9);
/// ```
pub fn lowpass(
    series: ArrayViewD<'_, f64>,
    axis: Axis,
    period_months: f64,
) -> Result<ArrayD<f64>, FilterError> {
    let spec = FilterSpec::monthly(period_months);
    let wn = spec.validate()?;
    info!(
        "cutoff = {:.4} months (Wn = {wn:.6})",
        spec.effective_period_months()
    );

    let ndim = series.ndim();
    if axis.index() >= ndim {
        return Err(FilterError::AxisOutOfBounds { axis: axis.index(), ndim });
    }
    let sos = butter_lowpass_sos(spec.order, wn)?;

    let missing = series.mapv(f64::is_nan);
    let mut filtered = series.mapv(|v| if v.is_nan() { 0.0 } else { v });
    sosfiltfilt(&sos, filtered.view_mut(), axis)?;

    Zip::from(&mut filtered).and(&missing).for_each(|v, &m| {
        if m {
            *v = f64::NAN;
        }
    });
    Ok(filtered)
}

/// Filter a [`Variable`] along the dimension named `cfg.time_dim`.
///
/// Returns a new variable with the same dims, dtype and attributes, plus
/// `lowpass_period_months` and `lowpass_filter` provenance attributes.
pub fn lowpass_variable(var: &Variable, cfg: &LowpassConfig) -> Result<Variable, FilterError> {
    FilterSpec::monthly(cfg.period_months).validate()?;
    let axis = var
        .axis_of(&cfg.time_dim)
        .ok_or_else(|| FilterError::AxisNotFound {
            dim: cfg.time_dim.clone(),
            dims: var.dims.clone(),
        })?;

    let data = lowpass(var.data.view(), axis, cfg.period_months)?;
    let out = Variable {
        dims: var.dims.clone(),
        data,
        dtype: var.dtype,
        attrs: var.attrs.clone(),
    };
    Ok(out
        .with_attr("lowpass_period_months", cfg.period_months.to_string())
        .with_attr(
            "lowpass_filter",
            format!("butterworth order {BUTTER_ORDER}, sosfiltfilt, even padding"),
        ))
}
