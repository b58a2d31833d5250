/// Tolerance used for all near-zero comparisons.
pub const EPSILON: f64 = 1e-6;

/// Round `value` to `decimals` decimal places.
///
/// Used wherever a result is compared or becomes part of a cache key, so
/// that `0.1 + 0.2` and `0.3` land on the same bucket. Non-finite input is
/// returned unchanged.
pub fn precise_round(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // normalise -0.0 so that keys built from it compare equal
    if rounded == 0.0 { 0.0 } else { rounded }
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// Clamp into `[0, 1]`, mapping NaN to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Hermite smooth step of `t` clamped into `[0, 1]`.
pub fn smoothstep(t: f64) -> f64 {
    let t = clamp_unit(t);
    t * t * (3.0 - 2.0 * t)
}
