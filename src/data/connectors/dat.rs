use super::types::{Dataset, DatasetHeader};
use super::validator::DataValidator;
use crate::error::{Result, TinyGpError};
use std::fmt::Write;
use std::path::Path;

/// Plain-text fitness-case files.
///
/// Line 1 is `varCount constantPoolSize minConst maxConst caseCount`; every
/// following line holds `varCount + 1` whitespace-separated numbers, the last
/// being the target. Blank lines are ignored.
pub struct DatConnector;

impl DatConnector {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let dataset = Self::parse(&contents)?;
        log::info!(
            "Loaded {} fitness case(s) with {} variable(s) from {}",
            dataset.case_count(),
            dataset.variable_count(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn parse(contents: &str) -> Result<Dataset> {
        let mut lines = contents.lines().enumerate().map(|(i, line)| (i + 1, line));

        let (_, header_line) = lines.next().ok_or_else(|| TinyGpError::Format {
            line: 1,
            message: "missing header line".to_string(),
        })?;
        let header = Self::parse_header(header_line)?;
        DataValidator::validate_header(&header)?;

        let width = header.variable_count + 1;
        let mut rows = Vec::new();
        for (line_number, line) in lines {
            if line.trim().is_empty() {
                log::debug!("Skipping blank line {}", line_number);
                continue;
            }
            let row = Self::parse_numbers(line, line_number)?;
            DataValidator::validate_row_width(row.len(), width, line_number)?;
            rows.push(row);
        }

        Dataset::from_parts(header, rows)
    }

    /// Serializes so that `parse(to_dat_string(d)) == d`.
    pub fn to_dat_string(dataset: &Dataset) -> String {
        let header = dataset.header();
        let mut out = format!(
            "{} {} {} {} {}\n",
            header.variable_count,
            header.constant_pool_size,
            header.min_random,
            header.max_random,
            dataset.case_count()
        );
        for row in dataset.rows() {
            let line = row
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            let _ = writeln!(out, "{}", line);
        }
        out
    }

    pub fn save<P: AsRef<Path>>(dataset: &Dataset, path: P) -> Result<()> {
        std::fs::write(path, Self::to_dat_string(dataset))?;
        Ok(())
    }

    fn parse_header(line: &str) -> Result<DatasetHeader> {
        let values = Self::parse_numbers(line, 1)?;
        if values.len() != 5 {
            return Err(TinyGpError::Format {
                line: 1,
                message: format!("header must have 5 fields, found {}", values.len()),
            });
        }

        Ok(DatasetHeader {
            variable_count: Self::count_field(values[0], "variable count")?,
            constant_pool_size: Self::count_field(values[1], "constant pool size")?,
            min_random: values[2],
            max_random: values[3],
            case_count: Self::count_field(values[4], "case count")?,
        })
    }

    /// Header counts may be written as floats (`1.0`) but must be whole and
    /// fit in a `u32`.
    fn count_field(value: f64, name: &str) -> Result<usize> {
        if value.is_finite() && (0.0..=u32::MAX as f64).contains(&value) && value.fract() == 0.0 {
            Ok(value as usize)
        } else {
            Err(TinyGpError::Format {
                line: 1,
                message: format!("{} must be a non-negative integer, found {}", name, value),
            })
        }
    }

    fn parse_numbers(line: &str, line_number: usize) -> Result<Vec<f64>> {
        line.split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| TinyGpError::Format {
                    line: line_number,
                    message: format!("'{}' is not a number", token),
                })
            })
            .collect()
    }
}
