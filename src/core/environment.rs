//! Shared result types produced by the analysis pipeline, independent of
//! whether the run came from Git analysis or CSV ingress.

use serde::{Deserialize, Serialize};

/// Square branch x branch conflict-line matrix, plus the branch ordering
/// that indexes it.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    pub branches: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    pub fn zeroed(branches: Vec<String>) -> Self {
        let n = branches.len();
        Self {
            values: vec![vec![0.0; n]; n],
            branches,
        }
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn index_of(&self, branch: &str) -> Option<usize> {
        self.branches.iter().position(|b| b == branch)
    }
}

/// Final artifact payload, matching the on-disk JSON shape byte-for-byte in
/// field names (see `crate::artifact`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasuredEnvironment {
    pub sd: f64,
    pub branches: Vec<String>,
    pub line_matrix: Vec<Vec<f64>>,
    #[serde(rename = "3d_embedding_lines")]
    pub embedding: Vec<[f64; 3]>,
}

impl MeasuredEnvironment {
    pub fn from_matrix(matrix: DistanceMatrix, embedding: Vec<[f64; 3]>, sd: f64) -> Self {
        Self {
            sd,
            branches: matrix.branches,
            line_matrix: matrix.values,
            embedding,
        }
    }

    /// Built when a worker or aggregation step fails: a valid, parseable
    /// artifact with an unmistakable sentinel `sd` and an all-zero matrix.
    pub fn degraded(branches: Vec<String>) -> Self {
        let n = branches.len();
        Self {
            sd: -1.0,
            line_matrix: vec![vec![0.0; n]; n],
            embedding: vec![[0.0; 3]; n],
            branches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_matrix_zeroed_shape() {
        let matrix = DistanceMatrix::zeroed(vec!["a".into(), "b".into()]);
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.values, vec![vec![0.0, 0.0], vec![0.0, 0.0]]);
    }

    #[test]
    fn test_distance_matrix_index_of() {
        let matrix = DistanceMatrix::zeroed(vec!["main".into(), "feature".into()]);
        assert_eq!(matrix.index_of("feature"), Some(1));
        assert_eq!(matrix.index_of("missing"), None);
    }

    #[test]
    fn test_degraded_environment_has_sentinel_sd() {
        let env = MeasuredEnvironment::degraded(vec!["a".into(), "b".into()]);
        assert_eq!(env.sd, -1.0);
        assert_eq!(env.line_matrix, vec![vec![0.0, 0.0], vec![0.0, 0.0]]);
        assert_eq!(env.embedding.len(), 2);
    }
}
