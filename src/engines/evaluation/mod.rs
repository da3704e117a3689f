pub mod expression;
pub mod fitness;

pub use expression::{evaluate, evaluate_batch};
pub use fitness::score;
