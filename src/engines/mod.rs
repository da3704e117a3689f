pub mod evaluation;
pub mod formula;
pub mod generation;
pub mod simplify;

pub use formula::{to_formula, to_formula_short};
pub use simplify::simplify;
