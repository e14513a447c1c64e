use crate::dictionary::DictionaryKey;

/// Outcome of searching one frame.
///
/// `marker_ids` is empty exactly when `succeeded` is false, and keeps the
/// order the library reported the markers in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    pub succeeded: bool,
    pub dictionary_key: Option<DictionaryKey>,
    pub marker_ids: Vec<i32>,
}

impl DetectionResult {
    /// Nothing found in any searched dictionary.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            succeeded: false,
            dictionary_key: None,
            marker_ids: Vec::new(),
        }
    }

    /// Result for `key` given the ids a detector returned.
    #[must_use]
    pub fn from_ids(key: &DictionaryKey, marker_ids: Vec<i32>) -> Self {
        if marker_ids.is_empty() {
            return Self::none();
        }
        Self {
            succeeded: true,
            dictionary_key: Some(key.clone()),
            marker_ids,
        }
    }
}
