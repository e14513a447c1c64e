use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Empty,
    DuplicateKey(String),
    UnknownKey(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Dictionary catalog is empty"),
            Self::DuplicateKey(key) => write!(f, "Duplicate dictionary key: {key}"),
            Self::UnknownKey(key) => write!(f, "Unknown dictionary key: {key}"),
        }
    }
}

impl std::error::Error for CatalogError {}
