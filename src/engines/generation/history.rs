use super::entry::Entry;
use super::individual::Individual;
use std::fmt;

/// Per-generation record of a run, in the order entries were appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    entries: Vec<Entry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends without checking generation order; callers append in order.
    pub fn append(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn generations(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.generation).collect()
    }

    pub fn avg_fitness(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.avg_fitness).collect()
    }

    pub fn best_fitness(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.best_fitness).collect()
    }

    pub fn avg_sizes(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.avg_size).collect()
    }

    /// Best individual of record: the last generation's champion.
    pub fn best_individual(&self) -> Option<&Individual> {
        self.last().map(|e| &e.best_individual)
    }

    /// Entry with the lowest best fitness across all generations. Ties go to
    /// the earliest generation.
    pub fn best_overall(&self) -> Option<&Entry> {
        self.entries.iter().reduce(|best, candidate| {
            if candidate.best_fitness.total_cmp(&best.best_fitness).is_lt() {
                candidate
            } else {
                best
            }
        })
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::SymbolPartition;
    use crate::functions::{Operation, OperationRegistry};

    fn individual(raw: Vec<u32>) -> Individual {
        let registry = OperationRegistry::new(&[Operation::Add, Operation::Sub]).unwrap();
        let partition = SymbolPartition::new(1, 100, registry).unwrap();
        let pool: Vec<f64> = (0..110).map(f64::from).collect();
        Individual::decode(raw, &pool, &partition).unwrap()
    }

    fn history(best: &[f64]) -> History {
        let mut history = History::new();
        for (gen, fitness) in best.iter().enumerate() {
            history.append(Entry::new(
                gen as u32,
                fitness * 10.0,
                *fitness,
                5.0 + gen as f64,
                individual(vec![110, 0, gen as u32 + 1]),
            ));
        }
        history
    }

    #[test]
    fn test_projections_keep_append_order() {
        let history = history(&[3.0, 1.0, 2.0]);
        assert_eq!(history.generations(), vec![0, 1, 2]);
        assert_eq!(history.best_fitness(), vec![3.0, 1.0, 2.0]);
        assert_eq!(history.avg_fitness(), vec![30.0, 10.0, 20.0]);
        assert_eq!(history.avg_sizes(), vec![5.0, 6.0, 7.0]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_best_individual_is_last_entry() {
        let history = history(&[3.0, 1.0, 2.0]);
        assert_eq!(history.best_individual().map(|i| i.render()), Some("(X1 + 3.0)".to_string()));
        assert_eq!(history.best_overall().map(|e| e.generation), Some(1));
    }

    #[test]
    fn test_empty_history() {
        let history = History::new();
        assert!(history.is_empty());
        assert!(history.best_individual().is_none());
        assert!(history.best_overall().is_none());
        assert_eq!(history.to_string(), "");
    }

    #[test]
    fn test_display_joins_entries() {
        let text = history(&[3.0, 1.0]).to_string();
        assert_eq!(text.matches("-----Generation:").count(), 2);
        assert!(text.contains("Best individual: (X1 + 1.0)\n-----Generation: 1 -----"));
    }
}
