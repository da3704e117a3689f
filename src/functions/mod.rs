pub mod operations;
pub mod registry;

pub use operations::{
    clipped_exp, protected_div, Arity, Operation, DIVISION_GUARD, EXPONENT_GUARD, OPERATOR_BASE,
};
pub use registry::OperationRegistry;
