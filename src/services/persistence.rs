//! JSON run records.
//!
//! Individuals are stored as raw codes plus decoded symbols. The symbol
//! partition is never stored; it is derived again from the saved
//! configuration on load.

use super::evolution_runner::RunOutcome;
use crate::config::RunConfig;
use crate::data::{Dataset, DatasetHeader};
use crate::engines::generation::{Entry, EntryRecord, History, Individual, IndividualRecord};
use crate::error::{Result, TinyGpError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    pub config: RunConfig,
    pub variable_count: usize,
    /// Every fitness case, inputs then target.
    pub targets: Vec<Vec<f64>>,
    pub constant_pool: Vec<f64>,
    pub solved: bool,
    pub history: Vec<EntryRecord>,
    pub best_individual: Option<IndividualRecord>,
}

impl RunRecord {
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            saved_at: Utc::now(),
            config: outcome.config.clone(),
            variable_count: outcome.dataset.variable_count(),
            targets: outcome.dataset.rows().to_vec(),
            constant_pool: outcome.constant_pool.clone(),
            solved: outcome.solved,
            history: outcome.history.iter().map(Entry::to_record).collect(),
            best_individual: outcome.best_individual().map(Individual::to_record),
        }
    }

    /// Rebuilds the outcome, decoding every individual under a partition
    /// derived from the stored configuration.
    pub fn restore(&self) -> Result<RunOutcome> {
        if self.format_version != FORMAT_VERSION {
            return Err(TinyGpError::Decode(format!(
                "unsupported run record format version {}",
                self.format_version
            )));
        }

        let partition = self.config.partition(self.variable_count)?;

        let mut history = History::new();
        for record in &self.history {
            history.append(Entry::from_record(record, &partition)?);
        }
        let best = self
            .best_individual
            .as_ref()
            .map(|record| Individual::from_record(record, &partition))
            .transpose()?;
        if best.as_ref() != history.best_individual() {
            return Err(TinyGpError::Decode(
                "stored best individual does not match the last generation's champion".to_string(),
            ));
        }

        let header = DatasetHeader {
            variable_count: self.variable_count,
            constant_pool_size: self.config.constant_pool_size,
            min_random: self.config.min_random,
            max_random: self.config.max_random,
            case_count: self.targets.len(),
        };
        let dataset = Dataset::from_parts(header, self.targets.clone())?;

        Ok(RunOutcome {
            config: self.config.clone(),
            dataset,
            constant_pool: self.constant_pool.clone(),
            history,
            solved: self.solved,
        })
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Saved run record to {}", path.display());
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

pub fn save_outcome<P: AsRef<Path>>(outcome: &RunOutcome, path: P) -> Result<RunRecord> {
    let record = RunRecord::from_outcome(outcome);
    record.save_json(path)?;
    Ok(record)
}

pub fn load_outcome<P: AsRef<Path>>(path: P) -> Result<RunOutcome> {
    RunRecord::load_json(path)?.restore()
}
