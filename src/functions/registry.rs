use super::operations::{Operation, OPERATOR_BASE};
use crate::error::{Result, TinyGpError};
use std::collections::BTreeMap;

/// Assigns operator codes for one run.
///
/// Selected operations receive consecutive codes from [`OPERATOR_BASE`] in
/// declaration order (binary operations precede unary ones there), then the
/// unselected operations follow in the same order, so every operation can be
/// decoded even when the run never emits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRegistry {
    codes: BTreeMap<Operation, u32>,
    by_code: Vec<Operation>,
    selected: Vec<Operation>,
    operator_end: u32,
    binary_operator_end: u32,
}

impl OperationRegistry {
    pub fn new(selected: &[Operation]) -> Result<Self> {
        if selected.is_empty() {
            return Err(TinyGpError::Configuration(
                "At least one operation must be selected".to_string(),
            ));
        }
        if !selected.iter().any(|op| op.is_binary()) {
            return Err(TinyGpError::Configuration(
                "At least one binary operation (ADD, SUB, MUL, DIV) must be selected".to_string(),
            ));
        }

        let (chosen, rest): (Vec<Operation>, Vec<Operation>) = Operation::ALL
            .iter()
            .copied()
            .partition(|op| selected.contains(op));

        let by_code: Vec<Operation> = chosen.iter().chain(rest.iter()).copied().collect();
        let codes = by_code
            .iter()
            .enumerate()
            .map(|(offset, op)| (*op, OPERATOR_BASE + offset as u32))
            .collect();

        let operator_end = OPERATOR_BASE + chosen.len() as u32 - 1;
        let binary_count = chosen.iter().filter(|op| op.is_binary()).count() as u32;
        let binary_operator_end = OPERATOR_BASE + binary_count - 1;

        Ok(Self {
            codes,
            by_code,
            selected: chosen,
            operator_end,
            binary_operator_end,
        })
    }

    pub fn code_of(&self, operation: Operation) -> u32 {
        // Every operation is assigned during construction.
        self.codes.get(&operation).copied().unwrap_or(OPERATOR_BASE)
    }

    pub fn operation_of(&self, code: u32) -> Option<Operation> {
        let offset = code.checked_sub(OPERATOR_BASE)? as usize;
        self.by_code.get(offset).copied()
    }

    /// Selected operations in code order.
    pub fn selected(&self) -> &[Operation] {
        &self.selected
    }

    pub fn is_selected(&self, operation: Operation) -> bool {
        self.selected.contains(&operation)
    }

    /// Highest code assigned to a selected operation.
    pub fn operator_end(&self) -> u32 {
        self.operator_end
    }

    /// Last selected binary code; selected unary codes follow it.
    pub fn binary_operator_end(&self) -> u32 {
        self.binary_operator_end
    }

    /// Highest code that decodes to any operation.
    pub fn last_code(&self) -> u32 {
        OPERATOR_BASE + self.by_code.len() as u32 - 1
    }

    /// Operation name to code, for every operation.
    pub fn code_table(&self) -> BTreeMap<String, u32> {
        self.codes
            .iter()
            .map(|(op, code)| (op.name().to_string(), *code))
            .collect()
    }
}
