/// Kreisselmeier-Steinhauser smooth maximum of `values` with aggregation parameter `rho`.
///
/// Computes `(1/rho) * ln(sum(exp(rho * v)))` in the max-shifted form so that large
/// `rho * v` cannot overflow. The result is never below the true maximum and exceeds it
/// by at most `ln(n) / rho`. An empty input yields negative infinity.
pub fn kreisselmeier_steinhauser(values: &[f64], rho: f64) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = values.iter().map(|v| (rho * (v - max)).exp()).sum();
    max + sum.ln() / rho
}

/// Smooth minimum counterpart of [`kreisselmeier_steinhauser`].
pub fn kreisselmeier_steinhauser_min(values: &[f64], rho: f64) -> f64 {
    let negated: Vec<f64> = values.iter().map(|v| -v).collect();
    -kreisselmeier_steinhauser(&negated, rho)
}
