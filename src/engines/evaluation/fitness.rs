use super::expression::evaluate;
use crate::data::Dataset;
use crate::error::EvaluationError;
use crate::types::{FitnessFunction, Program};
use rayon::prelude::*;

/// Summed per-case error of `program` over every fitness case, the same
/// quantity the search engine reports as a generation's fitness.
pub fn score(
    program: &Program,
    dataset: &Dataset,
    fitness_function: FitnessFunction,
) -> Result<f64, EvaluationError> {
    let errors = dataset
        .rows()
        .par_iter()
        .map(|row| {
            let (inputs, target) = row.split_at(dataset.variable_count());
            let result = evaluate(program, inputs)?;
            Ok(fitness_function.case_error(result, target[0]))
        })
        .collect::<Result<Vec<f64>, EvaluationError>>()?;

    Ok(errors.iter().sum())
}
