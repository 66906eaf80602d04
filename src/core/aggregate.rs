//! Builds a [`DistanceMatrix`] out of raw pairwise measurements.

use super::environment::DistanceMatrix;
use std::collections::HashMap;

/// Assembles `pairs` (from/to/conflicting_lines triples) into a symmetric
/// matrix over `branches`. Unlike the source's direct-index assignment, a
/// cell that receives more than one measurement (which happens when both
/// merge directions of a pair are measured independently) is averaged
/// rather than letting the last write win, so worker-pool and
/// single-thread runs aggregate identically regardless of arrival order.
pub fn build_distance_matrix(branches: &[String], pairs: &[(String, String, f64)]) -> DistanceMatrix {
    let mut matrix = DistanceMatrix::zeroed(branches.to_vec());
    let mut sums: HashMap<(usize, usize), (f64, usize)> = HashMap::new();

    for (from, to, value) in pairs {
        let (Some(i), Some(j)) = (matrix.index_of(from), matrix.index_of(to)) else {
            continue;
        };
        if i == j {
            continue;
        }
        let key = if i < j { (i, j) } else { (j, i) };
        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    for ((i, j), (sum, count)) in sums {
        let avg = sum / count as f64;
        matrix.values[i][j] = avg;
        matrix.values[j][i] = avg;
    }

    matrix
}
