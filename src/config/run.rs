use super::traits::{ConfigManifest, ConfigSection, FieldManifest};
use crate::data::DatasetHeader;
use crate::encoding::SymbolPartition;
use crate::error::TinyGpError;
use crate::functions::{Operation, OperationRegistry, OPERATOR_BASE};
use crate::types::FitnessFunction;
use serde::{Deserialize, Serialize};

/// Parameters of one evolutionary run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
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
    /// `None` lets the orchestrator pick one before dispatch.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_length: 10_000,
            population_size: 100_000,
            depth: 5,
            generations: 100,
            tournament_size: 2,
            min_random: -5.0,
            max_random: 5.0,
            constant_pool_size: 100,
            mutation_probability: 0.05,
            crossover_probability: 0.9,
            fitness_function: FitnessFunction::MeanAbsoluteError,
            operations: vec![Operation::Add, Operation::Sub, Operation::Mul, Operation::Div],
            goal_fitness: 1e-5,
            seed: None,
        }
    }
}

impl RunConfig {
    /// Defaults with the constant settings taken from a fitness-case file header.
    pub fn from_dataset_header(header: &DatasetHeader) -> Self {
        Self {
            constant_pool_size: header.constant_pool_size,
            min_random: header.min_random,
            max_random: header.max_random,
            ..Self::default()
        }
    }

    pub fn registry(&self) -> Result<OperationRegistry, TinyGpError> {
        OperationRegistry::new(&self.operations)
    }

    /// Symbol partition for a dataset with `variable_count` inputs.
    pub fn partition(&self, variable_count: usize) -> Result<SymbolPartition, TinyGpError> {
        SymbolPartition::new(variable_count, self.constant_pool_size, self.registry()?)
    }
}

fn require_positive(name: &str, value: usize) -> Result<(), TinyGpError> {
    if value == 0 {
        return Err(TinyGpError::Configuration(format!(
            "{name} must be greater than 0"
        )));
    }
    Ok(())
}

fn require_probability(name: &str, value: f64) -> Result<(), TinyGpError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(TinyGpError::Configuration(format!(
            "{name} must be between 0 and 1"
        )));
    }
    Ok(())
}

impl ConfigSection for RunConfig {
    fn section_name() -> &'static str {
        "run"
    }

    fn validate(&self) -> Result<(), TinyGpError> {
        self.registry()?;

        require_positive("Max length", self.max_length)?;
        require_positive("Population size", self.population_size)?;
        require_positive("Depth", self.depth)?;
        require_positive("Generations", self.generations as usize)?;
        require_positive("Tournament size", self.tournament_size)?;
        require_positive("Constant pool size", self.constant_pool_size)?;

        if self.tournament_size > self.population_size {
            return Err(TinyGpError::Configuration(
                "Tournament size cannot exceed population size".to_string(),
            ));
        }
        // At least one code below the operator base must remain for a variable.
        if self.constant_pool_size >= OPERATOR_BASE as usize {
            return Err(TinyGpError::Configuration(format!(
                "Constant pool size must be below {OPERATOR_BASE}"
            )));
        }
        if !self.min_random.is_finite() || !self.max_random.is_finite() {
            return Err(TinyGpError::Configuration(
                "Constant bounds must be finite".to_string(),
            ));
        }
        if self.min_random >= self.max_random {
            return Err(TinyGpError::Configuration(format!(
                "Constant lower bound ({}) must be below upper bound ({})",
                self.min_random, self.max_random
            )));
        }

        require_probability("Mutation probability", self.mutation_probability)?;
        require_probability("Crossover probability", self.crossover_probability)?;

        if !self.goal_fitness.is_finite() || self.goal_fitness < 0.0 {
            return Err(TinyGpError::Configuration(
                "Goal fitness must be a finite, non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        let count = |name: &str, value: usize, description: &str| {
            FieldManifest::new(name, "integer", serde_json::json!(value), description)
                .bounded(Some(1.0), None)
        };
        let probability = |name: &str, value: f64, description: &str| {
            FieldManifest::new(name, "float", serde_json::json!(value), description)
                .bounded(Some(0.0), Some(1.0))
        };

        ConfigManifest {
            section: "Run".to_string(),
            fields: vec![
                count("max_length", self.max_length, "Maximum program length"),
                count("population_size", self.population_size, "Number of individuals per generation"),
                count("depth", self.depth, "Depth of randomly created programs"),
                count("generations", self.generations as usize, "Generations to evolve"),
                count("tournament_size", self.tournament_size, "Individuals per selection tournament"),
                FieldManifest::new(
                    "min_random",
                    "float",
                    serde_json::json!(self.min_random),
                    "Lower bound of random constants",
                ),
                FieldManifest::new(
                    "max_random",
                    "float",
                    serde_json::json!(self.max_random),
                    "Upper bound of random constants",
                ),
                count("constant_pool_size", self.constant_pool_size, "Random constants available to programs")
                    .bounded(Some(1.0), Some(f64::from(OPERATOR_BASE - 1))),
                probability("mutation_probability", self.mutation_probability, "Per-symbol mutation probability"),
                probability("crossover_probability", self.crossover_probability, "Crossover probability"),
                FieldManifest::new(
                    "fitness_function",
                    "enum",
                    serde_json::json!(self.fitness_function),
                    "Per-case error summed into fitness",
                ),
                FieldManifest::new(
                    "operations",
                    "list",
                    serde_json::json!(self.operations),
                    "Operations available to programs",
                ),
                FieldManifest::new(
                    "goal_fitness",
                    "float",
                    serde_json::json!(self.goal_fitness),
                    "Fitness at which the run stops early",
                )
                .bounded(Some(0.0), None),
                FieldManifest::new("seed", "integer", serde_json::json!(self.seed), "Random seed"),
            ],
        }
    }
}
