use crate::encoding::{decode, decoded_symbols, restore, DecodedSymbol, SymbolPartition};
use crate::engines::evaluation::{evaluate, evaluate_batch};
use crate::engines::formula::to_formula;
use crate::engines::simplify::simplify;
use crate::error::{EvaluationError, Result, TinyGpError};
use crate::types::{Program, RawProgram};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A candidate expression: the engine's raw codes and the program they decode to.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    raw: RawProgram,
    program: Program,
}

impl Individual {
    pub fn decode(raw: RawProgram, constant_pool: &[f64], partition: &SymbolPartition) -> Result<Self> {
        let program = decode(&raw, constant_pool, partition)?;
        Ok(Self { raw, program })
    }

    /// Pairs an already decoded program with its raw form. Both must have one
    /// symbol per node.
    pub fn new(raw: RawProgram, program: Program) -> Result<Self> {
        if raw.len() != program.len() {
            return Err(TinyGpError::Decode(format!(
                "raw sequence has {} symbols but program has {} nodes",
                raw.len(),
                program.len()
            )));
        }
        Ok(Self { raw, program })
    }

    pub fn raw(&self) -> &[u32] {
        &self.raw
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn size(&self) -> usize {
        self.program.len()
    }

    /// Number of distinct input variables the expression reads.
    pub fn variable_count(&self) -> usize {
        self.program.variables().len()
    }

    pub fn evaluate(&self, bindings: &[f64]) -> std::result::Result<f64, EvaluationError> {
        evaluate(&self.program, bindings)
    }

    pub fn evaluate_batch<R>(&self, rows: &[R]) -> std::result::Result<Vec<f64>, EvaluationError>
    where
        R: AsRef<[f64]> + Sync,
    {
        evaluate_batch(&self.program, rows)
    }

    pub fn render(&self) -> String {
        to_formula(&self.program)
    }

    pub fn simplified(&self) -> Program {
        simplify(&self.program)
    }

    pub fn to_record(&self) -> IndividualRecord {
        IndividualRecord {
            individual_raw: self.raw.clone(),
            individual: decoded_symbols(&self.raw, &self.program),
        }
    }

    /// Rebuilds an individual from its persisted form. The partition must be
    /// the one derived from the run's configuration.
    pub fn from_record(record: &IndividualRecord, partition: &SymbolPartition) -> Result<Self> {
        let program = restore(&record.individual_raw, &record.individual, partition)?;
        Ok(Self {
            raw: record.individual_raw.clone(),
            program,
        })
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Persisted form of an [`Individual`]. Carries no partition data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualRecord {
    pub individual_raw: RawProgram,
    pub individual: Vec<DecodedSymbol>,
}
