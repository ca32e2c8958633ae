// src/scoring.rs

/// Blend of match probability and repository complexity, rounded to 2 places.
/// The complexity term is unbounded, so the result is not a percentage.
pub fn overall_fit_score(probability: f64, complexity_score: u64) -> f64 {
    let raw = probability * 100.0 + complexity_score as f64 * 0.1;
    (raw * 100.0).round() / 100.0
}
