pub mod decoder;
pub mod partition;

pub use decoder::{decode, decoded_symbols, restore, DecodedSymbol};
pub use partition::{SymbolClass, SymbolPartition};
