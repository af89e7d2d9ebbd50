/// Mean-rank percentile of `value` within `population`, 0–100.
///
/// Ties count half, so a value drawn from the population sits in the middle of its tie group.
/// An empty population yields `0`.
pub fn percentile(value: f64, population: &[f64]) -> u8 {
    if population.is_empty() {
        return 0;
    }
    let mut below = 0usize;
    let mut equal = 0usize;
    for v in population {
        if *v < value {
            below += 1;
        } else if *v == value {
            equal += 1;
        }
    }
    let pct = (below as f64 + 0.5 * equal as f64) / population.len() as f64 * 100.0;
    pct.round().clamp(0.0, 100.0) as u8
}

/// Percentile for a lower-is-better metric.
pub fn inverted_percentile(value: f64, population: &[f64]) -> u8 {
    100 - percentile(value, population)
}
