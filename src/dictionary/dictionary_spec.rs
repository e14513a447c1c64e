use std::borrow::Cow;
use std::fmt;

/// Stable identifier of a dictionary, e.g. `DICT_6X6_250`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DictionaryKey(Cow<'static, str>);

impl DictionaryKey {
    #[must_use]
    pub const fn from_static(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for DictionaryKey {
    fn from(key: &'static str) -> Self {
        Self::from_static(key)
    }
}

impl From<String> for DictionaryKey {
    fn from(key: String) -> Self {
        Self(Cow::Owned(key))
    }
}

impl fmt::Display for DictionaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque value the vision library understands as "this code-book".
///
/// For the OpenCV binding it is the predefined dictionary id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DictionaryToken(pub i32);

/// One supported marker symbology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionarySpec {
    pub key: DictionaryKey,
    pub token: DictionaryToken,
}

impl DictionarySpec {
    pub fn new(key: impl Into<DictionaryKey>, token: i32) -> Self {
        Self {
            key: key.into(),
            token: DictionaryToken(token),
        }
    }

    #[must_use]
    pub const fn builtin(key: &'static str, token: i32) -> Self {
        Self {
            key: DictionaryKey::from_static(key),
            token: DictionaryToken(token),
        }
    }
}
