//! IIR low-pass building blocks.
//!
//! - [`spec`]: cutoff period → normalized cutoff for monthly sampling.
//! - [`design`]: Butterworth low-pass in second-order sections, matching
//!   `scipy.signal.butter(output='sos')`.
//! - [`apply`]: forward-backward section filtering with even padding,
//!   matching `scipy.signal.sosfiltfilt(padtype='even')`.

pub mod apply;
pub mod design;
pub mod spec;

pub use apply::{default_padlen, even_ext, sosfilt, sosfilt_zi, sosfiltfilt, sosfiltfilt_1d};
pub use design::{butter_lowpass_sos, sos_dc_gain, Section};
pub use spec::{FilterSpec, BUTTER_ORDER, MONTH_DAYS, MONTH_SECONDS};
