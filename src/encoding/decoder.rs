//! Raw code sequences to typed programs.
//!
//! This is the only place that interprets code numbers. Everything downstream
//! works on [`Node`] values.

use super::partition::{SymbolClass, SymbolPartition};
use crate::error::{Result, TinyGpError};
use crate::types::{Node, Program};
use serde::{Deserialize, Serialize};

/// One element of an individual's persisted decoded sequence: the raw code
/// for variables and operators, the literal for resolved constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodedSymbol {
    Code(u32),
    Value(f64),
}

/// Resolves each raw code into exactly one node, substituting constant-index
/// codes with their value from `constant_pool`.
pub fn decode(raw: &[u32], constant_pool: &[f64], partition: &SymbolPartition) -> Result<Program> {
    let nodes = raw
        .iter()
        .enumerate()
        .map(|(position, &code)| match classify(code, position, partition)? {
            SymbolClass::Variable(index) => Ok(Node::Variable(index)),
            SymbolClass::Operator(op) => Ok(Node::Operator(op)),
            SymbolClass::ConstantIndex(index) => constant_pool
                .get(index)
                .map(|value| Node::Constant(*value))
                .ok_or_else(|| {
                    TinyGpError::Decode(format!(
                        "constant code {code} at position {position} has no pool entry (pool size {})",
                        constant_pool.len()
                    ))
                }),
        })
        .collect::<Result<Vec<Node>>>()?;

    Program::new(nodes)
}

/// Rebuilds a program from a persisted decoded sequence.
pub fn restore(
    raw: &[u32],
    symbols: &[DecodedSymbol],
    partition: &SymbolPartition,
) -> Result<Program> {
    if raw.len() != symbols.len() {
        return Err(TinyGpError::Decode(format!(
            "raw sequence has {} symbols but decoded sequence has {}",
            raw.len(),
            symbols.len()
        )));
    }

    let nodes = raw
        .iter()
        .zip(symbols)
        .enumerate()
        .map(|(position, (&code, symbol))| {
            match (classify(code, position, partition)?, symbol) {
                (SymbolClass::ConstantIndex(_), DecodedSymbol::Value(value)) => {
                    Ok(Node::Constant(*value))
                }
                (SymbolClass::Variable(index), DecodedSymbol::Code(c)) if *c == code => {
                    Ok(Node::Variable(index))
                }
                (SymbolClass::Operator(op), DecodedSymbol::Code(c)) if *c == code => {
                    Ok(Node::Operator(op))
                }
                _ => Err(TinyGpError::Decode(format!(
                    "decoded symbol {symbol:?} at position {position} does not match raw code {code}"
                ))),
            }
        })
        .collect::<Result<Vec<Node>>>()?;

    Program::new(nodes)
}

/// Decoded sequence for persistence, aligned one-to-one with `raw`.
pub fn decoded_symbols(raw: &[u32], program: &Program) -> Vec<DecodedSymbol> {
    raw.iter()
        .zip(program.nodes())
        .map(|(&code, node)| match node {
            Node::Constant(value) => DecodedSymbol::Value(*value),
            _ => DecodedSymbol::Code(code),
        })
        .collect()
}

fn classify(code: u32, position: usize, partition: &SymbolPartition) -> Result<SymbolClass> {
    partition.classify(code).ok_or_else(|| {
        TinyGpError::Decode(format!(
            "code {code} at position {position} is outside the symbol partition"
        ))
    })
}
