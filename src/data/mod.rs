pub mod connectors;

pub use connectors::{DatConnector, DataValidator, Dataset, DatasetHeader};
