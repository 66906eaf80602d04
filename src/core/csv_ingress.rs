//! CSV distance-matrix ingress/export, bypassing Git analysis entirely. The
//! format is a header row of semicolon-delimited branch names, followed by
//! one semicolon-delimited row of conflict-line counts per branch, in the
//! same order as the header — a symmetric matrix with a zero diagonal.
//! Read and write both go through the `csv` crate rather than hand-rolled
//! splitting, so embedded delimiters/quoting are handled the same way any
//! other CSV consumer would expect.

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;

use super::environment::DistanceMatrix;

pub fn read_distance_matrix(path: &Path) -> Result<DistanceMatrix> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading CSV distance file {}", path.display()))?;
    parse_distance_matrix(&raw)
}

pub fn parse_distance_matrix(raw: &str) -> Result<DistanceMatrix> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let mut records = reader.records();
    let header = records
        .next()
        .context("CSV distance file is empty")?
        .context("reading CSV header row")?;
    let branches: Vec<String> = header.iter().map(|s| s.trim().to_string()).collect();
    if branches.is_empty() || branches.iter().any(|b| b.is_empty()) {
        bail!("CSV distance file has no branch columns");
    }

    let mut values = Vec::with_capacity(branches.len());
    for (row_index, record) in records.enumerate() {
        let record = record.with_context(|| format!("reading CSV row {row_index}"))?;
        let row: Result<Vec<f64>> = record
            .iter()
            .map(|cell| {
                cell.trim()
                    .parse::<f64>()
                    .with_context(|| format!("non-numeric CSV cell {cell:?} on row {row_index}"))
            })
            .collect();
        values.push(row?);
    }

    if values.len() != branches.len() {
        bail!(
            "CSV distance file declares {} branches but has {} distance rows",
            branches.len(),
            values.len()
        );
    }
    for (i, row) in values.iter().enumerate() {
        if row.len() != branches.len() {
            bail!(
                "CSV distance row {i} has {} columns, expected {}",
                row.len(),
                branches.len()
            );
        }
    }
    for i in 0..branches.len() {
        if values[i][i] != 0.0 {
            bail!("CSV distance matrix diagonal must be zero, row {i} is {}", values[i][i]);
        }
        for j in (i + 1)..branches.len() {
            if (values[i][j] - values[j][i]).abs() > f64::EPSILON {
                bail!("CSV distance matrix is not symmetric at ({i}, {j})");
            }
        }
    }

    Ok(DistanceMatrix { branches, values })
}

/// Writes `matrix` to `path` in the same semicolon-delimited shape
/// [`read_distance_matrix`] reads, enabling the CSV round-trip property.
pub fn write_distance_matrix(path: &Path, matrix: &DistanceMatrix) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .with_context(|| format!("opening CSV distance file {}", path.display()))?;

    writer.write_record(&matrix.branches).context("writing CSV header row")?;
    for row in &matrix.values {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writer.write_record(&cells).context("writing CSV distance row")?;
    }
    writer.flush().context("flushing CSV distance file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_matrix() {
        let raw = "main;feature\n0;4\n4;0\n";
        let matrix = parse_distance_matrix(raw).unwrap();
        assert_eq!(matrix.branches, vec!["main".to_string(), "feature".to_string()]);
        assert_eq!(matrix.values, vec![vec![0.0, 4.0], vec![4.0, 0.0]]);
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.csv");
        let original = DistanceMatrix {
            branches: vec!["main".to_string(), "feature".to_string(), "other".to_string()],
            values: vec![
                vec![0.0, 4.0, 2.0],
                vec![4.0, 0.0, 6.0],
                vec![2.0, 6.0, 0.0],
            ],
        };

        write_distance_matrix(&path, &original).unwrap();
        let reloaded = read_distance_matrix(&path).unwrap();
        assert_eq!(reloaded, original);
    }

    #[test]
    fn test_rejects_non_square_matrix() {
        let raw = "main;feature;third\n0;4\n4;0\n";
        assert!(parse_distance_matrix(raw).is_err());
    }

    #[test]
    fn test_rejects_row_count_mismatch() {
        let raw = "main;feature\n0;4\n";
        assert!(parse_distance_matrix(raw).is_err());
    }

    #[test]
    fn test_rejects_asymmetric_matrix() {
        let raw = "main;feature\n0;4\n9;0\n";
        assert!(parse_distance_matrix(raw).is_err());
    }

    #[test]
    fn test_rejects_nonzero_diagonal() {
        let raw = "main;feature\n2;4\n4;0\n";
        assert!(parse_distance_matrix(raw).is_err());
    }

    #[test]
    fn test_rejects_non_numeric_cell() {
        let raw = "main;feature\n0;oops\noops;0\n";
        assert!(parse_distance_matrix(raw).is_err());
    }

    #[test]
    fn test_rejects_empty_file() {
        assert!(parse_distance_matrix("").is_err());
    }
}
