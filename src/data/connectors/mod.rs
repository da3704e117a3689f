mod dat;
mod types;
mod validator;

pub use dat::DatConnector;
pub use types::{Dataset, DatasetHeader};
pub use validator::DataValidator;
