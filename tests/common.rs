/// Shared helpers for the integration tests.
use ndarray::{Array1, ArrayD};
use std::f64::consts::PI;

#[allow(unused)]
/// `amp · sin(2π t / period)` for months `t = 0..n`.
pub fn sine(n: usize, period: f64, amp: f64) -> Array1<f64> {
    Array1::from_shape_fn(n, |t| amp * (2.0 * PI * t as f64 / period).sin())
}

#[allow(unused)]
/// Maximum absolute value, ignoring NaN.
pub fn max_abs(a: &[f64]) -> f64 {
    a.iter().filter(|v| !v.is_nan()).map(|v| v.abs()).fold(0.0_f64, f64::max)
}

#[allow(unused)]
/// Index of the largest value in `lo..hi`.
pub fn argmax(a: &[f64], lo: usize, hi: usize) -> usize {
    (lo..hi).fold(lo, |best, i| if a[i] > a[best] { i } else { best })
}

#[allow(unused)]
/// Index of the smallest value in `lo..hi`.
pub fn argmin(a: &[f64], lo: usize, hi: usize) -> usize {
    (lo..hi).fold(lo, |best, i| if a[i] < a[best] { i } else { best })
}

#[allow(unused)]
/// Flatten an n-D result into a plain vector (logical order).
pub fn to_vec(a: &ArrayD<f64>) -> Vec<f64> {
    a.iter().copied().collect()
}
