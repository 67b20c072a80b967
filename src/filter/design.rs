//! Butterworth low-pass design in second-order sections, matching
//! `scipy.signal.butter(N, Wn, 'lowpass', output='sos')`.
//!
//! For an even order N and normalized cutoff Wn (fraction of Nyquist):
//!   • analog prototype poles  p_m = −exp(iπm / 2N),  m = −N+1, −N+3, …, N−1
//!   • prewarp                 ω = 4·tan(π·Wn / 2)   (bilinear at fs = 2)
//!   • bilinear transform      z = (4 + ωp) / (4 − ωp), all N zeros at z = −1
//!   • conjugate pole pairs → biquads, pair nearest the unit circle last,
//!     overall gain folded into the first numerator
use log::{debug, warn};
use num_complex::Complex64;
use std::f64::consts::PI;

use super::spec::LOW_CUTOFF_WARN;
use crate::error::FilterError;

/// One biquad: `[b0, b1, b2, a0, a1, a2]` with `a0 = 1`.
pub type Section = [f64; 6];

/// Largest tolerated deviation of the cascaded DC gain from 1.
const DC_GAIN_TOL: f64 = 1e-6;

/// Design an order-`order` Butterworth low-pass as a cascade of biquads.
///
/// `wn` is the cutoff as a fraction of Nyquist and must lie in `(0, 1)`.
/// Only even orders are supported (every section then holds one conjugate
/// pole pair).
///
/// Returns [`FilterError::NumericInstability`] when the designed cascade no
/// longer has its poles inside the unit circle or has lost its unit DC gain,
/// which happens for extremely small `wn`.
pub fn butter_lowpass_sos(order: usize, wn: f64) -> Result<Vec<Section>, FilterError> {
    if order == 0 || order % 2 != 0 {
        return Err(FilterError::UnsupportedOrder(order));
    }
    if !(wn > 0.0 && wn < 1.0) {
        return Err(FilterError::InvalidFilterSpec {
            period_months: 2.0 / wn,
            wn,
        });
    }
    if wn < LOW_CUTOFF_WARN {
        warn!("normalized cutoff {wn:e} is very low; section design is close to its precision limit");
    }

    let fs2 = 4.0;
    let warped = fs2 * (PI * wn / 2.0).tan();

    let n = order as f64;
    let analog: Vec<Complex64> = (0..order)
        .map(|i| {
            let m = 2.0 * i as f64 - n + 1.0;
            -Complex64::new(0.0, PI * m / (2.0 * n)).exp() * warped
        })
        .collect();

    // k = ω^N · Re(1 / Π(4 − p))
    let denom: Complex64 = analog.iter().map(|&p| Complex64::from(fs2) - p).product();
    let gain = (Complex64::from(warped.powi(order as i32)) / denom).re;

    // One representative per conjugate pair.
    let mut poles: Vec<Complex64> = analog
        .iter()
        .map(|&p| (fs2 + p) / (fs2 - p))
        .filter(|p| p.im > 0.0)
        .collect();
    // Farthest from the unit circle first.
    poles.sort_by(|a, b| unit_circle_distance(*b).total_cmp(&unit_circle_distance(*a)));

    let mut sos: Vec<Section> = poles
        .iter()
        .map(|p| [1.0, 2.0, 1.0, 1.0, -2.0 * p.re, p.norm_sqr()])
        .collect();
    for c in &mut sos[0][..3] {
        *c *= gain;
    }

    check_conditioning(&sos, wn)?;
    debug!("butter order {order} Wn={wn:e}: {sos:?}");
    Ok(sos)
}

/// Gain of the cascade at DC (z = 1).
pub fn sos_dc_gain(sos: &[Section]) -> f64 {
    sos.iter()
        .map(|s| (s[0] + s[1] + s[2]) / (s[3] + s[4] + s[5]))
        .product()
}

fn unit_circle_distance(p: Complex64) -> f64 {
    (1.0 - p.norm()).abs()
}

fn check_conditioning(sos: &[Section], wn: f64) -> Result<(), FilterError> {
    let unstable = |reason: String| FilterError::NumericInstability { wn, reason };

    if sos.iter().flatten().any(|c| !c.is_finite()) {
        return Err(unstable("non-finite section coefficient".into()));
    }
    // a2 = |p|² for a conjugate pair.
    if let Some(s) = sos.iter().find(|s| s[5] >= 1.0) {
        return Err(unstable(format!("pole radius² {} is not inside the unit circle", s[5])));
    }
    let g = sos_dc_gain(sos);
    if !g.is_finite() || (g - 1.0).abs() > DC_GAIN_TOL {
        return Err(unstable(format!("DC gain {g} deviates from 1")));
    }
    Ok(())
}
