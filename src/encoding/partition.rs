use crate::error::{Result, TinyGpError};
use crate::functions::{Operation, OperationRegistry, OPERATOR_BASE};

/// What a raw code denotes under a given partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolClass {
    Variable(usize),
    /// Index into the run's constant pool.
    ConstantIndex(usize),
    Operator(Operation),
}

/// Per-run split of the code space.
///
/// `[0, variable_count)` are variables, `[variable_count, OPERATOR_BASE)` index
/// the constant pool, and codes from `OPERATOR_BASE` up name operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolPartition {
    variable_count: usize,
    constant_pool_size: usize,
    registry: OperationRegistry,
}

impl SymbolPartition {
    pub fn new(
        variable_count: usize,
        constant_pool_size: usize,
        registry: OperationRegistry,
    ) -> Result<Self> {
        if variable_count == 0 {
            return Err(TinyGpError::Configuration(
                "At least one input variable is required".to_string(),
            ));
        }
        if variable_count + constant_pool_size > OPERATOR_BASE as usize {
            return Err(TinyGpError::Configuration(format!(
                "Variable count ({variable_count}) plus constant pool size ({constant_pool_size}) must not exceed {OPERATOR_BASE}"
            )));
        }
        Ok(Self {
            variable_count,
            constant_pool_size,
            registry,
        })
    }

    pub fn classify(&self, code: u32) -> Option<SymbolClass> {
        let index = code as usize;
        if index < self.variable_count {
            Some(SymbolClass::Variable(index))
        } else if code < OPERATOR_BASE {
            Some(SymbolClass::ConstantIndex(index))
        } else {
            self.registry.operation_of(code).map(SymbolClass::Operator)
        }
    }

    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    pub fn constant_pool_size(&self) -> usize {
        self.constant_pool_size
    }

    pub fn operator_base(&self) -> u32 {
        OPERATOR_BASE
    }

    pub fn operator_end(&self) -> u32 {
        self.registry.operator_end()
    }

    pub fn binary_operator_end(&self) -> u32 {
        self.registry.binary_operator_end()
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }
}
