use crate::error::EvaluationError;
use crate::functions::Operation;
use crate::types::{Node, Program};
use rayon::prelude::*;

/// Evaluates `program` for one fitness case.
///
/// Operands are evaluated left to right before the operator is applied.
/// Guarded operators never fail; only a variable without a binding does.
/// Evaluation uses a heap-allocated working stack, so program depth is not
/// bounded by the thread's call stack.
pub fn evaluate(program: &Program, bindings: &[f64]) -> Result<f64, EvaluationError> {
    let mut stack: Vec<Slot> = Vec::with_capacity(program.len());
    for node in program.nodes() {
        match *node {
            Node::Operator(op) => stack.push(Slot::Pending(op)),
            Node::Constant(value) => push_value(&mut stack, value),
            Node::Variable(index) => {
                let value = bindings.get(index).ok_or(EvaluationError::OutOfRange {
                    index,
                    available: bindings.len(),
                })?;
                push_value(&mut stack, *value);
            }
        }
    }

    match stack.as_slice() {
        [Slot::Value(value)] => Ok(*value),
        _ => unreachable!("a validated program reduces to a single value"),
    }
}

/// Evaluates every row independently, in parallel.
pub fn evaluate_batch<R>(program: &Program, rows: &[R]) -> Result<Vec<f64>, EvaluationError>
where
    R: AsRef<[f64]> + Sync,
{
    rows.par_iter()
        .map(|row| evaluate(program, row.as_ref()))
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Pending(Operation),
    Value(f64),
}

/// Pushes a finished operand and applies every operator it completes.
fn push_value(stack: &mut Vec<Slot>, value: f64) {
    let mut value = value;
    loop {
        let applied = match stack.as_slice() {
            [.., Slot::Pending(op), Slot::Value(left)] if op.is_binary() => {
                Some((2, op.apply(*left, value)))
            }
            [.., Slot::Pending(op)] if !op.is_binary() => Some((1, op.apply(value, 0.0))),
            _ => None,
        };

        match applied {
            Some((consumed, result)) => {
                stack.truncate(stack.len() - consumed);
                value = result;
            }
            None => {
                stack.push(Slot::Value(value));
                break;
            }
        }
    }
}
