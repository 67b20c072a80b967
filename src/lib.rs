//! # climlpf — zero-phase low-pass trends for monthly climate fields
//!
//! `climlpf` removes variability faster than a cutoff period (in months)
//! from a monthly gridded time series, leaving the long-term trend. The
//! filter matches `scipy.signal.butter(4, Wn, output='sos')` followed by
//! `scipy.signal.sosfiltfilt(..., padtype='even')`, with missing values
//! zero-filled for the pass and masked back afterwards.
//!
//! ## Pipeline overview
//!
//! ```text
//! tmp.safetensors
//!   │
//!   ├─ io::load_dataset()          safetensors → named-dimension Dataset
//!   ├─ Dataset::select(var)        variable + its coordinates
//!   ├─ FilterSpec::validate()      Wn = 2 / period, must be in (0, 1)
//!   ├─ butter_lowpass_sos()        4th-order Butterworth, 2 biquads
//!   ├─ NaN → 0, mask kept
//!   ├─ sosfiltfilt(axis = time)    forward-backward, even padding
//!   ├─ mask → NaN
//!   └─ io::write_dataset()         same dims, coords, dtype
//!        │
//!        └─→ tmp2.safetensors
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use climlpf::{run, LowpassConfig};
//! use std::path::Path;
//!
//! let cfg = LowpassConfig { period_months: 120.0, ..LowpassConfig::default() };
//! run(Path::new("tmp.safetensors"), Path::new("tmp2.safetensors"), "aa", &cfg).unwrap();
//! ```
//!
//! ## Filtering an array directly
//!
//! ```
//! use climlpf::lowpass;
//! use ndarray::{Array2, Axis};
//!
//! // 240 months × 4 grid cells, one gap.
//! let mut x = Array2::from_shape_fn((240, 4), |(t, c)| {
//!     (2.0 * std::f64::consts::PI * t as f64 / 6.0).sin() + c as f64
//! });
//! x[[100, 2]] = f64::NAN;
//!
//! let y = lowpass(x.view().into_dyn(), Axis(0), 120.0).unwrap();
//! assert_eq!(y.shape(), x.shape());
//! assert!(y[[100, 2]].is_nan());
//! assert!(y[[50, 1]].is_finite());
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod io;
pub mod lowpass;

use anyhow::{Context, Result};
use log::info;
use std::path::Path;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use config::LowpassConfig;
pub use dataset::{DType, Dataset, Variable};
pub use error::FilterError;
pub use filter::{
    butter_lowpass_sos, even_ext, sos_dc_gain, sosfilt, sosfilt_zi, sosfiltfilt, sosfiltfilt_1d,
    FilterSpec, Section, BUTTER_ORDER, MONTH_DAYS, MONTH_SECONDS,
};
pub use io::{load_dataset, write_dataset, DatasetError, StWriter};
pub use lowpass::{lowpass, lowpass_variable};

/// Low-pass filter `variable` of `ds`.
///
/// The returned dataset holds the filtered variable and the coordinate
/// variables of its dimensions, unchanged. Other variables of `ds` are
/// dropped.
pub fn filter_dataset(ds: &Dataset, variable: &str, cfg: &LowpassConfig) -> Result<Dataset> {
    let mut out = ds
        .select(variable)
        .with_context(|| format!("selecting {variable:?}"))?;
    let var = out.variable(variable)?;
    info!(
        "filtering {variable:?} {:?} {:?} along {:?}, period {} months",
        var.dims,
        var.shape(),
        cfg.time_dim,
        cfg.period_months
    );
    let filtered = lowpass::lowpass_variable(var, cfg)
        .with_context(|| format!("low-pass filtering {variable:?}"))?;
    out.insert(variable, filtered);
    Ok(out)
}

/// Load `variable` from `input`, low-pass filter it and write the result to
/// `output`.
///
/// # Errors
///
/// Fails if the input cannot be read ([`DatasetError::NotFound`] for a
/// missing file), the variable is absent, the filter specification or time
/// axis is invalid, or the output cannot be written. Nothing is written on
/// failure.
pub fn run(input: &Path, output: &Path, variable: &str, cfg: &LowpassConfig) -> Result<()> {
    let t0 = std::time::Instant::now();
    let ds = io::load_dataset(input).with_context(|| format!("loading {}", input.display()))?;
    info!("loaded {} variables from {}", ds.variables.len(), input.display());

    let out = filter_dataset(&ds, variable, cfg)?;

    io::write_dataset(&out, output).with_context(|| format!("writing {}", output.display()))?;
    info!(
        "written → {} ({:.1} ms)",
        output.display(),
        t0.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}
