//! Population statistics helpers used by the dispersion algorithm.

/// Arithmetic mean, 0.0 for an empty population.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population (divide-by-N) standard deviation, 0.0 for an empty population.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.;
    }
    let mean = mean(values);
    let variance = values
        .iter()
        .map(|value| (value - mean) * (value - mean))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}
