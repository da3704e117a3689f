use crate::error::{Result, TinyGpError};
use crate::functions::Operation;
use serde::{Deserialize, Serialize};

/// Undecoded symbol codes as emitted by the search engine.
pub type RawProgram = Vec<u32>;

/// One decoded symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node {
    Variable(usize),
    Constant(f64),
    Operator(Operation),
}

impl Node {
    /// Number of sub-programs that must follow this node.
    pub fn arity(&self) -> usize {
        match self {
            Node::Variable(_) | Node::Constant(_) => 0,
            Node::Operator(op) => op.arity().operand_count(),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Node::Constant(_))
    }
}

/// A prefix-ordered expression tree: every operator is followed by exactly
/// as many complete sub-programs as its arity.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    nodes: Vec<Node>,
}

impl Program {
    /// Builds a program, rejecting sequences that are not exactly one tree.
    pub fn new(nodes: Vec<Node>) -> Result<Self> {
        check_single_tree(&nodes)?;
        Ok(Self { nodes })
    }

    /// For callers that only ever replace complete subtrees of an already
    /// valid program.
    pub(crate) fn from_folded(nodes: Vec<Node>) -> Self {
        debug_assert!(check_single_tree(&nodes).is_ok());
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Distinct variable indices referenced, ascending.
    pub fn variables(&self) -> Vec<usize> {
        let mut seen: Vec<usize> = self
            .nodes
            .iter()
            .filter_map(|node| match node {
                Node::Variable(i) => Some(*i),
                _ => None,
            })
            .collect();
        seen.sort_unstable();
        seen.dedup();
        seen
    }

    pub fn is_constant(&self) -> bool {
        !self.nodes.iter().any(|node| matches!(node, Node::Variable(_)))
    }
}

fn check_single_tree(nodes: &[Node]) -> Result<()> {
    if nodes.is_empty() {
        return Err(TinyGpError::Decode("empty program".to_string()));
    }

    // Number of sub-programs still owed to earlier operators.
    let mut open = 1usize;
    for (position, node) in nodes.iter().enumerate() {
        if open == 0 {
            return Err(TinyGpError::Decode(format!(
                "trailing symbols after a complete tree at position {position}"
            )));
        }
        open = open - 1 + node.arity();
    }

    if open != 0 {
        return Err(TinyGpError::Decode(format!(
            "incomplete tree: {open} operand(s) missing"
        )));
    }
    Ok(())
}

/// Per-case error accumulated into a run's fitness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessFunction {
    #[default]
    MeanAbsoluteError,
    MeanSquaredError,
}

impl FitnessFunction {
    pub fn case_error(self, result: f64, actual: f64) -> f64 {
        match self {
            FitnessFunction::MeanAbsoluteError => (result - actual).abs(),
            FitnessFunction::MeanSquaredError => (result - actual) * (result - actual),
        }
    }
}
