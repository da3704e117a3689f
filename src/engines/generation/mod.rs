pub mod entry;
pub mod history;
pub mod individual;

pub use entry::{Entry, EntryRecord};
pub use history::History;
pub use individual::{Individual, IndividualRecord};
