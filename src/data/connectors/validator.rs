use super::types::DatasetHeader;
use crate::error::{Result, TinyGpError};

/// Line numbers refer to the file layout: header on line 1, case `i` on
/// line `i + 2`.
pub struct DataValidator;

impl DataValidator {
    pub fn validate_header(header: &DatasetHeader) -> Result<()> {
        if header.variable_count == 0 {
            return Err(TinyGpError::Format {
                line: 1,
                message: "variable count must be at least 1".to_string(),
            });
        }
        if !header.min_random.is_finite() || !header.max_random.is_finite() {
            return Err(TinyGpError::Format {
                line: 1,
                message: "constant bounds must be finite".to_string(),
            });
        }
        Ok(())
    }

    pub fn validate_rows(header: &DatasetHeader, rows: &[Vec<f64>]) -> Result<()> {
        let width = header.variable_count + 1;
        for (i, row) in rows.iter().enumerate() {
            Self::validate_row_width(row.len(), width, i + 2)?;
        }
        if rows.len() != header.case_count {
            return Err(TinyGpError::Format {
                line: 1,
                message: format!(
                    "header declares {} fitness case(s) but {} were found",
                    header.case_count,
                    rows.len()
                ),
            });
        }

        let non_finite = Self::count_non_finite(rows);
        if non_finite > 0 {
            log::warn!("{} non-finite value(s) in fitness cases", non_finite);
        }
        Ok(())
    }

    pub fn validate_row_width(found: usize, expected: usize, line: usize) -> Result<()> {
        if found != expected {
            return Err(TinyGpError::Format {
                line,
                message: format!("expected {} values, found {}", expected, found),
            });
        }
        Ok(())
    }

    pub fn count_non_finite(rows: &[Vec<f64>]) -> usize {
        rows.iter().flatten().filter(|v| !v.is_finite()).count()
    }
}
