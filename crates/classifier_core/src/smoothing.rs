//! One-dimensional Gaussian smoothing of bin-rate curves

/// Largest kernel radius, in bins, that configuration may request
pub const MAX_KERNEL_RADIUS: f64 = 1_000_000.0;

/// Normalized Gaussian kernel of radius `round(truncate * sigma)`,
/// capped at `MAX_KERNEL_RADIUS`.
pub fn gaussian_kernel(sigma: f64, truncate: f64) -> Vec<f64> {
    let radius = (truncate * sigma + 0.5).min(MAX_KERNEL_RADIUS) as i64;
    let denom = 2.0 * sigma * sigma;

    let mut weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-((x * x) as f64) / denom).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Map an out-of-range index back into `0..len` by mirror reflection
/// about the array edges (`d c b a | a b c d | d c b a`).
fn reflect_index(index: i64, len: usize) -> usize {
    let len = len as i64;
    let period = 2 * len;
    let m = index.rem_euclid(period);
    if m < len {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

/// Smooth `values` with a Gaussian of width `sigma` samples.
///
/// Edges are handled by half-sample reflection. `sigma == 0` returns the
/// input unchanged. Output is a convex combination of the input, so it
/// stays inside the input's range.
pub fn gaussian_smooth(values: &[f64], sigma: f64, truncate: f64) -> Vec<f64> {
    if values.is_empty() || sigma <= 0.0 {
        return values.to_vec();
    }

    let kernel = gaussian_kernel(sigma, truncate);
    let radius = (kernel.len() / 2) as i64;

    (0..values.len())
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let source = i as i64 + k as i64 - radius;
                    w * values[reflect_index(source, values.len())]
                })
                .sum()
        })
        .collect()
}
