use std::collections::HashSet;

use super::{catalog_error::CatalogError, dictionary_spec::DictionarySpec};

/// OpenCV's predefined ArUco dictionaries, smallest grid and capacity first.
/// Tokens are OpenCV's `PredefinedDictionaryType` ids.
pub const BUILTIN_DICTIONARIES: [DictionarySpec; 17] = [
    DictionarySpec::builtin("DICT_4X4_50", 0),
    DictionarySpec::builtin("DICT_4X4_100", 1),
    DictionarySpec::builtin("DICT_4X4_250", 2),
    DictionarySpec::builtin("DICT_4X4_1000", 3),
    DictionarySpec::builtin("DICT_5X5_50", 4),
    DictionarySpec::builtin("DICT_5X5_100", 5),
    DictionarySpec::builtin("DICT_5X5_250", 6),
    DictionarySpec::builtin("DICT_5X5_1000", 7),
    DictionarySpec::builtin("DICT_6X6_50", 8),
    DictionarySpec::builtin("DICT_6X6_100", 9),
    DictionarySpec::builtin("DICT_6X6_250", 10),
    DictionarySpec::builtin("DICT_6X6_1000", 11),
    DictionarySpec::builtin("DICT_7X7_50", 12),
    DictionarySpec::builtin("DICT_7X7_100", 13),
    DictionarySpec::builtin("DICT_7X7_250", 14),
    DictionarySpec::builtin("DICT_7X7_1000", 15),
    DictionarySpec::builtin("DICT_ARUCO_ORIGINAL", 16),
];

/// Ordered, non-empty list of dictionaries with unique keys.
///
/// The order is the search priority used when no dictionary is remembered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryCatalog {
    specs: Vec<DictionarySpec>,
}

impl DictionaryCatalog {
    /// Builds a catalog, keeping the given order.
    ///
    /// # Errors
    /// [`CatalogError::Empty`] for no specs, [`CatalogError::DuplicateKey`]
    /// if two specs share a key.
    pub fn new(specs: Vec<DictionarySpec>) -> Result<Self, CatalogError> {
        if specs.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::with_capacity(specs.len());
        for spec in &specs {
            if !seen.insert(spec.key.as_str()) {
                return Err(CatalogError::DuplicateKey(spec.key.to_string()));
            }
        }
        Ok(Self { specs })
    }

    /// Every predefined OpenCV dictionary.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            specs: BUILTIN_DICTIONARIES.to_vec(),
        }
    }

    /// A catalog holding only `keys`, in the order they are listed.
    ///
    /// # Errors
    /// [`CatalogError::UnknownKey`] if a key is not in `self`, plus the
    /// errors of [`DictionaryCatalog::new`].
    pub fn select<S: AsRef<str>>(&self, keys: &[S]) -> Result<Self, CatalogError> {
        let specs = keys
            .iter()
            .map(|key| {
                let key = key.as_ref();
                self.get(key)
                    .cloned()
                    .ok_or_else(|| CatalogError::UnknownKey(key.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(specs)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DictionarySpec> {
        self.specs.iter().find(|spec| spec.key.as_str() == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DictionarySpec> {
        self.specs.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Always false; kept for the `len`/`is_empty` pair.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<'a> IntoIterator for &'a DictionaryCatalog {
    type Item = &'a DictionarySpec;
    type IntoIter = std::slice::Iter<'a, DictionarySpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
