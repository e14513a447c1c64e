//! Supported marker symbologies and the session's "last known good" one.
pub mod catalog;
pub mod catalog_error;
pub mod dictionary_memory;
pub mod dictionary_spec;

pub use catalog::DictionaryCatalog;
pub use catalog_error::CatalogError;
pub use dictionary_memory::DictionaryMemory;
pub use dictionary_spec::{DictionaryKey, DictionarySpec, DictionaryToken};
