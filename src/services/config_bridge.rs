use crate::config::RunConfig;
use crate::data::Dataset;
use crate::encoding::SymbolPartition;
use crate::functions::{Operation, DIVISION_GUARD, EXPONENT_GUARD};
use crate::types::FitnessFunction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the search engine needs for one run, sent once and never
/// updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineBundle {
    pub max_length: usize,
    pub population_size: usize,
    pub depth: usize,
    pub generations: u32,
    pub tournament_size: usize,
    pub min_random: f64,
    pub max_random: f64,
    pub constant_pool_size: usize,
    pub mutation_probability: f64,
    pub crossover_probability: f64,
    pub fitness_function: FitnessFunction,
    pub operations: Vec<Operation>,
    pub goal_fitness: f64,
    pub seed: u64,

    pub variable_count: usize,
    pub fitness_cases: usize,
    pub operator_base: u32,
    /// Operation name to code, for every operation.
    pub operator_codes: BTreeMap<String, u32>,
    pub binary_operator_end: u32,
    pub operator_end: u32,
    pub division_guard: f64,
    pub exponent_guard: f64,

    /// Fitness cases flattened row-major, `variable_count + 1` values per case.
    pub targets: Vec<f64>,
}

impl EngineBundle {
    pub fn build(
        config: &RunConfig,
        seed: u64,
        partition: &SymbolPartition,
        dataset: &Dataset,
    ) -> Self {
        Self {
            max_length: config.max_length,
            population_size: config.population_size,
            depth: config.depth,
            generations: config.generations,
            tournament_size: config.tournament_size,
            min_random: config.min_random,
            max_random: config.max_random,
            constant_pool_size: config.constant_pool_size,
            mutation_probability: config.mutation_probability,
            crossover_probability: config.crossover_probability,
            fitness_function: config.fitness_function,
            operations: partition.registry().selected().to_vec(),
            goal_fitness: config.goal_fitness,
            seed,
            variable_count: partition.variable_count(),
            fitness_cases: dataset.case_count(),
            operator_base: partition.operator_base(),
            operator_codes: partition.registry().code_table(),
            binary_operator_end: partition.binary_operator_end(),
            operator_end: partition.operator_end(),
            division_guard: DIVISION_GUARD,
            exponent_guard: EXPONENT_GUARD,
            targets: dataset.flattened(),
        }
    }
}
