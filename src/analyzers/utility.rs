/// Divides `numerator` by `denominator`, returning 0.0 when the denominator
/// is zero.
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
