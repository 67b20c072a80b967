//! Forward-backward (zero-phase) second-order-sections filtering.
//!
//! Matches `scipy.signal.sosfiltfilt(sos, x, axis, padtype='even')`:
//!   1. even-extend the signal by `padlen` samples on each side
//!   2. run the cascade forward with steady-state initial conditions
//!      scaled by the first extended sample
//!   3. reverse, run again scaled by the first sample of the reversed output
//!   4. reverse back and strip the padding
use ndarray::{ArrayView1, ArrayViewMutD, Axis};

use super::design::Section;
use crate::error::FilterError;

/// Filter every 1-D lane of `data` along `axis` in place.
///
/// The axis and its length are validated before any lane is touched, so an
/// error leaves `data` unchanged.
pub fn sosfiltfilt(
    sos: &[Section],
    mut data: ArrayViewMutD<'_, f64>,
    axis: Axis,
) -> Result<(), FilterError> {
    let ndim = data.ndim();
    if axis.index() >= ndim {
        return Err(FilterError::AxisOutOfBounds { axis: axis.index(), ndim });
    }
    let padlen = default_padlen(sos);
    let len = data.len_of(axis);
    if len <= padlen {
        return Err(FilterError::SeriesTooShort { axis: axis.index(), len, padlen });
    }

    let zi = sosfilt_zi(sos);
    for mut lane in data.lanes_mut(axis) {
        let row: Vec<f64> = lane.to_vec();
        let filtered = filtfilt_padded(sos, &zi, &row, padlen);
        lane.assign(&ArrayView1::from(&filtered));
    }
    Ok(())
}

/// Zero-phase filter a single 1-D signal.
///
/// Returns a vector of the same length as `x`.
pub fn sosfiltfilt_1d(sos: &[Section], x: &[f64]) -> Result<Vec<f64>, FilterError> {
    let padlen = default_padlen(sos);
    if x.len() <= padlen {
        return Err(FilterError::SeriesTooShort { axis: 0, len: x.len(), padlen });
    }
    Ok(filtfilt_padded(sos, &sosfilt_zi(sos), x, padlen))
}

/// Default edge padding: `3 · ntaps` with
/// `ntaps = 2·n_sections + 1 − min(#(b2 == 0), #(a2 == 0))`.
///
/// 15 for the 4th-order low-pass.
pub fn default_padlen(sos: &[Section]) -> usize {
    let zero_b2 = sos.iter().filter(|s| s[2] == 0.0).count();
    let zero_a2 = sos.iter().filter(|s| s[5] == 0.0).count();
    3 * (2 * sos.len() + 1 - zero_b2.min(zero_a2))
}

/// Steady-state initial conditions of each section for a unit step input.
///
/// Each section's state is scaled by the DC gain of the sections before it,
/// so `zi · x[0]` starts the whole cascade at rest on a constant `x[0]`.
pub fn sosfilt_zi(sos: &[Section]) -> Vec<[f64; 2]> {
    let mut scale = 1.0;
    sos.iter()
        .map(|s| {
            let zi = biquad_zi(s);
            let out = [scale * zi[0], scale * zi[1]];
            scale *= (s[0] + s[1] + s[2]) / (s[3] + s[4] + s[5]);
            out
        })
        .collect()
}

/// Run the cascade over `x` in place (transposed direct form II).
///
/// `zi` holds one `[z0, z1]` state per section and is updated to the final
/// state.
pub fn sosfilt(sos: &[Section], x: &mut [f64], zi: &mut [[f64; 2]]) {
    for (s, z) in sos.iter().zip(zi.iter_mut()) {
        let [b0, b1, b2, _, a1, a2] = *s;
        let [mut z0, mut z1] = *z;
        for v in x.iter_mut() {
            let xn = *v;
            let yn = b0 * xn + z0;
            z0 = b1 * xn - a1 * yn + z1;
            z1 = b2 * xn - a2 * yn;
            *v = yn;
        }
        *z = [z0, z1];
    }
}

/// Even extension: mirror `n` samples about each edge without repeating the
/// edge sample.
///
/// `[1, 2, 3, 4, 5]`, `n = 2` → `[3, 2, 1, 2, 3, 4, 5, 4, 3]`.
///
/// Requires `n < x.len()`.
pub fn even_ext(x: &[f64], n: usize) -> Vec<f64> {
    let len = x.len();
    debug_assert!(n < len, "even_ext needs n < len");
    let mut out = Vec::with_capacity(len + 2 * n);
    out.extend(x[1..=n].iter().rev());
    out.extend_from_slice(x);
    out.extend(x[len - 1 - n..len - 1].iter().rev());
    out
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn filtfilt_padded(sos: &[Section], zi: &[[f64; 2]], x: &[f64], padlen: usize) -> Vec<f64> {
    let mut ext = even_ext(x, padlen);

    let x0 = ext[0];
    let mut state: Vec<[f64; 2]> = zi.iter().map(|z| [z[0] * x0, z[1] * x0]).collect();
    sosfilt(sos, &mut ext, &mut state);

    ext.reverse();
    let y0 = ext[0];
    let mut state: Vec<[f64; 2]> = zi.iter().map(|z| [z[0] * y0, z[1] * y0]).collect();
    sosfilt(sos, &mut ext, &mut state);
    ext.reverse();

    ext[padlen..padlen + x.len()].to_vec()
}

/// `lfilter_zi` for one biquad with `a0 = 1`: solves `(I − Aᵀ) zi = B`
/// in closed form.
fn biquad_zi(s: &Section) -> [f64; 2] {
    let [b0, b1, b2, _, a1, a2] = *s;
    let r0 = b1 - a1 * b0;
    let r1 = b2 - a2 * b0;
    let det = 1.0 + a1 + a2;
    [(r0 + r1) / det, ((1.0 + a1) * r1 - a2 * r0) / det]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::design::butter_lowpass_sos;
    use ndarray::Array2;

    #[test]
    fn even_ext_mirrors_without_edge() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(even_ext(&x, 2), vec![3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.0]);
    }

    #[test]
    fn padlen_for_fourth_order_lowpass() {
        let sos = butter_lowpass_sos(4, 0.1).unwrap();
        assert_eq!(default_padlen(&sos), 15);
    }

    #[test]
    fn zi_starts_cascade_at_rest() {
        // With zi · c, a constant input must come out unchanged from sample 0.
        let sos = butter_lowpass_sos(4, 0.05).unwrap();
        let c = 2.5;
        let mut state: Vec<[f64; 2]> =
            sosfilt_zi(&sos).iter().map(|z| [z[0] * c, z[1] * c]).collect();
        let mut x = vec![c; 64];
        sosfilt(&sos, &mut x, &mut state);
        for v in &x {
            approx::assert_abs_diff_eq!(*v, c, epsilon = 1e-9);
        }
    }

    #[test]
    fn filtfilt_preserves_length() {
        let sos = butter_lowpass_sos(4, 0.2).unwrap();
        let x: Vec<f64> = (0..100).map(|i| (i as f64 * 0.3).sin()).collect();
        assert_eq!(sosfiltfilt_1d(&sos, &x).unwrap().len(), 100);
    }

    #[test]
    fn too_short_rejected() {
        let sos = butter_lowpass_sos(4, 0.2).unwrap();
        let err = sosfiltfilt_1d(&sos, &[1.0; 15]).unwrap_err();
        assert!(matches!(err, FilterError::SeriesTooShort { len: 15, padlen: 15, .. }));
        assert!(sosfiltfilt_1d(&sos, &[1.0; 16]).is_ok());
    }

    #[test]
    fn lanes_match_1d_filter() {
        let sos = butter_lowpass_sos(4, 0.1).unwrap();
        let mut data = Array2::from_shape_fn((3, 64), |(c, t)| ((c + 1) as f64 * t as f64 * 0.2).sin());
        let rows: Vec<Vec<f64>> = data.rows().into_iter().map(|r| r.to_vec()).collect();
        sosfiltfilt(&sos, data.view_mut().into_dyn(), Axis(1)).unwrap();
        for (c, row) in rows.iter().enumerate() {
            let expected = sosfiltfilt_1d(&sos, row).unwrap();
            for (a, b) in data.row(c).iter().zip(&expected) {
                approx::assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn bad_axis_leaves_data_untouched() {
        let sos = butter_lowpass_sos(4, 0.1).unwrap();
        let mut data = Array2::from_elem((4, 32), 1.0);
        let err = sosfiltfilt(&sos, data.view_mut().into_dyn(), Axis(2)).unwrap_err();
        assert!(err.is_axis_error());
        let err = sosfiltfilt(&sos, data.view_mut().into_dyn(), Axis(0)).unwrap_err();
        assert!(matches!(err, FilterError::SeriesTooShort { len: 4, .. }));
    }
}
