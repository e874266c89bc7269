//! Plain-text rigid matrix files.
//!
//! One matrix row per line, values separated by whitespace. Blank lines and
//! lines starting with `#` are skipped.

use anyhow::{anyhow, Context, Result};
use roimap_core::transform::RigidMatrix;
use std::fs;
use std::path::Path;

/// Parse matrix rows from text.
pub fn parse_matrix_rows(text: &str) -> Result<Vec<Vec<f64>>> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(i, line)| {
            line.split_whitespace()
                .map(|v| {
                    v.parse::<f64>()
                        .with_context(|| format!("Invalid number `{}` on line {}", v, i + 1))
                })
                .collect()
        })
        .collect()
}

/// Read a 2×3 or 3×3 rigid matrix.
pub fn read_rigid_matrix<P: AsRef<Path>>(path: P) -> Result<RigidMatrix> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rigid matrix {}", path.display()))?;
    let rows = parse_matrix_rows(&text)
        .with_context(|| format!("Malformed rigid matrix {}", path.display()))?;
    RigidMatrix::from_rows(&rows)
        .map_err(|e| anyhow!("Malformed rigid matrix {}: {}", path.display(), e))
}

/// Write a rigid matrix as a 3×3 homogeneous matrix.
pub fn write_rigid_matrix<P: AsRef<Path>>(path: P, matrix: &RigidMatrix) -> Result<()> {
    let path = path.as_ref();
    let [r0, r1] = matrix.to_rows();
    let text = format!(
        "{} {} {}\n{} {} {}\n0 0 1\n",
        r0[0], r0[1], r0[2], r1[0], r1[1], r1[2]
    );
    fs::write(path, text).with_context(|| format!("Failed to write rigid matrix {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_homogeneous_matrix() -> Result<()> {
        let rows = parse_matrix_rows("0.98 -0.17 12.5\n0.17 0.98 -3\n0 0 1\n")?;
        let matrix = RigidMatrix::from_rows(&rows).map_err(|e| anyhow!("{}", e))?;
        assert_eq!(matrix.linear(), [[0.98, -0.17], [0.17, 0.98]]);
        assert_eq!(matrix.translation(), [12.5, -3.0]);
        Ok(())
    }

    #[test]
    fn test_read_two_row_matrix_with_comments() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("output_piecewise_rigid_01.mat");
        fs::write(&path, "# chunk 1\n1 0 2\n\n0   1\t-4\n")?;
        let matrix = read_rigid_matrix(&path)?;
        assert_eq!(matrix.translation(), [2.0, -4.0]);
        Ok(())
    }

    #[test]
    fn test_write_then_read() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("rigid.mat");
        let matrix = RigidMatrix::new([[0.5, -0.25], [0.25, 0.5]], [7.0, -1.5]);
        write_rigid_matrix(&path, &matrix)?;
        assert_eq!(read_rigid_matrix(&path)?, matrix);
        Ok(())
    }

    #[test]
    fn test_malformed_matrices_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.mat");

        fs::write(&path, "1 0\n0 1\n")?;
        assert!(read_rigid_matrix(&path).is_err());

        fs::write(&path, "1 0 x\n0 1 0\n")?;
        assert!(read_rigid_matrix(&path).is_err());

        assert!(read_rigid_matrix(dir.path().join("missing.mat")).is_err());
        Ok(())
    }
}
