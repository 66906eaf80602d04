//! Drift scalar (`sd`): the mean distance of every branch's 3D embedding
//! point to the per-axis median point across all branches.

pub fn calculate_drift(embedding: &[[f64; 3]]) -> f64 {
    if embedding.is_empty() {
        return 0.0;
    }
    let median = median_point(embedding);
    let total: f64 = embedding.iter().map(|point| euclidean_distance(point, &median)).sum();
    total / embedding.len() as f64
}

fn median_point(embedding: &[[f64; 3]]) -> [f64; 3] {
    let mut result = [0.0; 3];
    for (axis, slot) in result.iter_mut().enumerate() {
        let mut values: Vec<f64> = embedding.iter().map(|p| p[axis]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        *slot = median_of_sorted(&values);
    }
    result
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn euclidean_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}
