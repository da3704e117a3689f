pub mod config;
pub mod data;
pub mod encoding;
pub mod engines;
pub mod error;
pub mod functions;
pub mod services;
pub mod types;

pub use error::{EvaluationError, Result, TinyGpError};
pub use types::{FitnessFunction, Node, Program, RawProgram};
