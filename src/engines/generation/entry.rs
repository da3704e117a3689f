use super::individual::{Individual, IndividualRecord};
use crate::encoding::SymbolPartition;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistics for one generation plus that generation's champion.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub generation: u32,
    pub avg_fitness: f64,
    pub best_fitness: f64,
    pub avg_size: f64,
    pub best_individual: Individual,
}

impl Entry {
    pub fn new(
        generation: u32,
        avg_fitness: f64,
        best_fitness: f64,
        avg_size: f64,
        best_individual: Individual,
    ) -> Self {
        Self {
            generation,
            avg_fitness,
            best_fitness,
            avg_size,
            best_individual,
        }
    }

    pub fn to_record(&self) -> EntryRecord {
        EntryRecord {
            generation: self.generation,
            avg_fitness: self.avg_fitness,
            best_fitness: self.best_fitness,
            avg_size: self.avg_size,
            best_individual: self.best_individual.to_record(),
        }
    }

    pub fn from_record(record: &EntryRecord, partition: &SymbolPartition) -> Result<Self> {
        Ok(Self {
            generation: record.generation,
            avg_fitness: record.avg_fitness,
            best_fitness: record.best_fitness,
            avg_size: record.avg_size,
            best_individual: Individual::from_record(&record.best_individual, partition)?,
        })
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-----Generation: {} -----", self.generation)?;
        writeln!(f, "Average fitness: {:?}", self.avg_fitness)?;
        writeln!(f, "Best fitness: {:?}", self.best_fitness)?;
        writeln!(f, "Average size: {:?}", self.avg_size)?;
        write!(f, "Best individual: {}", self.best_individual)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    #[serde(rename = "gen")]
    pub generation: u32,
    pub avg_fitness: f64,
    pub best_fitness: f64,
    pub avg_size: f64,
    pub best_individual: IndividualRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{Operation, OperationRegistry};

    fn partition() -> SymbolPartition {
        let registry = OperationRegistry::new(&[Operation::Add, Operation::Mul]).unwrap();
        SymbolPartition::new(1, 100, registry).unwrap()
    }

    fn entry() -> Entry {
        let mut pool = vec![0.0; 110];
        pool[3] = 1.5;
        let individual = Individual::decode(vec![111, 0, 3], &pool, &partition()).unwrap();
        Entry::new(4, 12.25, 0.5, 7.0, individual)
    }

    #[test]
    fn test_display_block() {
        assert_eq!(
            entry().to_string(),
            "-----Generation: 4 -----\n\
             Average fitness: 12.25\n\
             Best fitness: 0.5\n\
             Average size: 7.0\n\
             Best individual: (X1 * 1.5)"
        );
    }

    #[test]
    fn test_record_uses_gen_key() {
        let json = serde_json::to_value(entry().to_record()).unwrap();
        assert_eq!(json["gen"], 4);
        assert_eq!(json["best_individual"]["individual_raw"], serde_json::json!([111, 0, 3]));

        let record: EntryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(Entry::from_record(&record, &partition()).unwrap(), entry());
    }
}
