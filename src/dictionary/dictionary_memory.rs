use super::dictionary_spec::DictionaryKey;

/// Single-slot memory of the dictionary that last produced a detection.
///
/// Written once per session: after the first success it is never
/// overwritten or cleared, only reset by starting a new session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryMemory {
    remembered: Option<DictionaryKey>,
}

impl DictionaryMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn remembered(&self) -> Option<&DictionaryKey> {
        self.remembered.as_ref()
    }

    /// Records `key` if nothing is remembered yet.
    ///
    /// Returns true when this call set the slot.
    pub fn remember(&mut self, key: &DictionaryKey) -> bool {
        if self.remembered.is_some() {
            return false;
        }
        self.remembered = Some(key.clone());
        true
    }

    pub(crate) fn reset(&mut self) {
        self.remembered = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_success_wins() {
        let mut memory = DictionaryMemory::new();
        assert!(memory.remembered().is_none());

        assert!(memory.remember(&DictionaryKey::from("D2")));
        assert!(!memory.remember(&DictionaryKey::from("D1")));
        assert_eq!(memory.remembered().map(DictionaryKey::as_str), Some("D2"));
    }

    #[test]
    fn reset_clears_for_a_new_session() {
        let mut memory = DictionaryMemory::new();
        memory.remember(&DictionaryKey::from("D2"));
        memory.reset();
        assert!(memory.remembered().is_none());
        assert!(memory.remember(&DictionaryKey::from("D1")));
    }
}
