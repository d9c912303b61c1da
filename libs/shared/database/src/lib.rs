pub mod json_file;
pub mod memory;
pub mod sequence;
pub mod store;

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;
pub use sequence::{IdSequence, SequenceMark};
pub use store::{CollectionStore, StoreError};
