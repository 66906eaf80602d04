//! Classical (metric) multidimensional scaling via double-centring and
//! power iteration. No third-party linear-algebra crate is reached for:
//! the eigendecomposition only ever needs the top three eigenpairs of a
//! matrix built from small whole-number conflict-line counts, so a
//! fixed-iteration power method with deflation is both simpler and plenty.

use super::environment::DistanceMatrix;

const POWER_ITERATIONS: usize = 200;
const EMBEDDING_DIMS: usize = 3;

/// Runs classical MDS over `matrix`, producing one 3D point per branch in
/// the same order as `matrix.branches`.
pub fn classical_mds(matrix: &DistanceMatrix) -> Vec<[f64; 3]> {
    let n = matrix.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![[0.0; 3]];
    }

    let mut b = double_center_squared(&matrix.values, n);
    let mut eigenpairs = Vec::with_capacity(EMBEDDING_DIMS);
    for component in 0..EMBEDDING_DIMS {
        let (eigenvalue, eigenvector) = dominant_eigenpair(&b, n, component);
        deflate(&mut b, &eigenvector, eigenvalue, n);
        eigenpairs.push((eigenvalue, eigenvector));
    }

    let mut embedding = vec![[0.0_f64; 3]; n];
    for (axis, (eigenvalue, eigenvector)) in eigenpairs.iter().enumerate() {
        let scale = if *eigenvalue > 0.0 { eigenvalue.sqrt() } else { 0.0 };
        for (i, row) in embedding.iter_mut().enumerate() {
            row[axis] = eigenvector[i] * scale;
        }
    }
    embedding
}

/// Double-centres the squared dissimilarity matrix: `B = -0.5 * J D^2 J`
/// where `J = I - (1/n) * ones(n, n)`, expanded here without forming `J`
/// explicitly.
fn double_center_squared(values: &[Vec<f64>], n: usize) -> Vec<Vec<f64>> {
    let d2: Vec<Vec<f64>> = values
        .iter()
        .map(|row| row.iter().map(|v| v * v).collect())
        .collect();

    let row_means: Vec<f64> = d2.iter().map(|row| row.iter().sum::<f64>() / n as f64).collect();
    let grand_mean = row_means.iter().sum::<f64>() / n as f64;

    let mut b = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            b[i][j] = -0.5 * (d2[i][j] - row_means[i] - row_means[j] + grand_mean);
        }
    }
    b
}

/// Power iteration with a fixed, deterministic iteration count and a
/// component-dependent starting vector (so deflated components don't all
/// start collinear with the first).
fn dominant_eigenpair(matrix: &[Vec<f64>], n: usize, component: usize) -> (f64, Vec<f64>) {
    let mut v: Vec<f64> = (0..n)
        .map(|i| if (i + component) % 2 == 0 { 1.0 } else { 0.5 })
        .collect();
    normalize(&mut v);

    for _ in 0..POWER_ITERATIONS {
        let next = mat_vec(matrix, &v, n);
        if next.iter().all(|x| x.abs() < f64::EPSILON) {
            return (0.0, v);
        }
        v = next;
        normalize(&mut v);
    }

    let mv = mat_vec(matrix, &v, n);
    let eigenvalue = dot(&v, &mv);
    (eigenvalue, v)
}

fn deflate(matrix: &mut [Vec<f64>], eigenvector: &[f64], eigenvalue: f64, n: usize) {
    for i in 0..n {
        for j in 0..n {
            matrix[i][j] -= eigenvalue * eigenvector[i] * eigenvector[j];
        }
    }
}

fn mat_vec(matrix: &[Vec<f64>], v: &[f64], n: usize) -> Vec<f64> {
    (0..n).map(|i| (0..n).map(|j| matrix[i][j] * v[j]).sum()).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn normalize(v: &mut [f64]) {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > f64::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairwise_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
    }

    #[test]
    fn test_classical_mds_recovers_collinear_distances() {
        // Three points on a line at 0, 1, 2: distances 1, 1, 2.
        let matrix = DistanceMatrix {
            branches: vec!["a".into(), "b".into(), "c".into()],
            values: vec![
                vec![0.0, 1.0, 2.0],
                vec![1.0, 0.0, 1.0],
                vec![2.0, 1.0, 0.0],
            ],
        };
        let embedding = classical_mds(&matrix);
        assert_eq!(embedding.len(), 3);

        let d_ab = pairwise_distance(&embedding[0], &embedding[1]);
        let d_bc = pairwise_distance(&embedding[1], &embedding[2]);
        let d_ac = pairwise_distance(&embedding[0], &embedding[2]);

        assert!((d_ab - 1.0).abs() < 1e-6, "d_ab = {d_ab}");
        assert!((d_bc - 1.0).abs() < 1e-6, "d_bc = {d_bc}");
        assert!((d_ac - 2.0).abs() < 1e-6, "d_ac = {d_ac}");
    }

    #[test]
    fn test_classical_mds_zero_matrix_collapses_to_origin() {
        let matrix = DistanceMatrix::zeroed(vec!["a".into(), "b".into(), "c".into()]);
        let embedding = classical_mds(&matrix);
        for point in embedding {
            for coord in point {
                assert!(coord.abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_classical_mds_single_branch() {
        let matrix = DistanceMatrix::zeroed(vec!["solo".into()]);
        let embedding = classical_mds(&matrix);
        assert_eq!(embedding, vec![[0.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_classical_mds_empty() {
        let matrix = DistanceMatrix::zeroed(vec![]);
        assert!(classical_mds(&matrix).is_empty());
    }
}
