use super::validator::DataValidator;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// First line of a fitness-case file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetHeader {
    pub variable_count: usize,
    pub constant_pool_size: usize,
    pub min_random: f64,
    pub max_random: f64,
    pub case_count: usize,
}

impl DatasetHeader {
    /// Header for in-memory data, using the usual constant settings.
    pub fn for_cases(variable_count: usize, case_count: usize) -> Self {
        Self {
            variable_count,
            constant_pool_size: 100,
            min_random: -5.0,
            max_random: 5.0,
            case_count,
        }
    }
}

/// Fitness cases: each row holds `variable_count` inputs followed by the target.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    header: DatasetHeader,
    rows: Vec<Vec<f64>>,
}

impl Dataset {
    pub fn new(variable_count: usize, rows: Vec<Vec<f64>>) -> Result<Self> {
        let header = DatasetHeader::for_cases(variable_count, rows.len());
        Self::from_parts(header, rows)
    }

    pub fn from_parts(header: DatasetHeader, rows: Vec<Vec<f64>>) -> Result<Self> {
        DataValidator::validate_header(&header)?;
        DataValidator::validate_rows(&header, &rows)?;
        Ok(Self { header, rows })
    }

    pub fn header(&self) -> &DatasetHeader {
        &self.header
    }

    pub fn variable_count(&self) -> usize {
        self.header.variable_count
    }

    pub fn case_count(&self) -> usize {
        self.rows.len()
    }

    /// Full rows, inputs then target.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// `(inputs, target)` per fitness case.
    pub fn cases(&self) -> impl Iterator<Item = (&[f64], f64)> + '_ {
        let width = self.header.variable_count;
        self.rows.iter().map(move |row| (&row[..width], row[width]))
    }

    pub fn inputs(&self) -> Vec<&[f64]> {
        self.cases().map(|(inputs, _)| inputs).collect()
    }

    pub fn targets(&self) -> Vec<f64> {
        self.cases().map(|(_, target)| target).collect()
    }

    /// Row-major flattening of every row.
    pub fn flattened(&self) -> Vec<f64> {
        self.rows.iter().flatten().copied().collect()
    }
}
