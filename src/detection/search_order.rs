use crate::dictionary::{DictionaryCatalog, DictionaryMemory, DictionarySpec};

/// Dictionaries to try this tick, in order.
///
/// Once a dictionary is remembered only that one is searched, even when it
/// stops matching; otherwise the whole catalog is searched in declaration
/// order.
#[must_use]
pub fn search_order<'c>(
    catalog: &'c DictionaryCatalog,
    memory: &DictionaryMemory,
) -> Vec<&'c DictionarySpec> {
    match memory.remembered().and_then(|key| catalog.get(key.as_str())) {
        Some(spec) => vec![spec],
        None => catalog.iter().collect(),
    }
}
