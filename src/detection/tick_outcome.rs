use std::fmt;

use super::{detection_result::DetectionResult, tick_error::TickError};

/// What one tick did. `Display` renders the status message shown to the
/// user.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    LibraryLoading,
    LibraryTimedOut,
    WaitingForFrame,
    Completed(DetectionResult),
    Failed(TickError),
}

impl TickOutcome {
    /// The detection result, if the tick got as far as searching.
    #[must_use]
    pub const fn result(&self) -> Option<&DetectionResult> {
        match self {
            Self::Completed(result) => Some(result),
            _ => None,
        }
    }

    /// True for the outcomes that touched no native resources.
    #[must_use]
    pub const fn is_waiting(&self) -> bool {
        matches!(
            self,
            Self::LibraryLoading | Self::LibraryTimedOut | Self::WaitingForFrame
        )
    }
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LibraryLoading => f.write_str("Loading vision library..."),
            Self::LibraryTimedOut => f.write_str("Vision library failed to load"),
            Self::WaitingForFrame => f.write_str("Vision library loaded, waiting for camera..."),
            Self::Completed(DetectionResult {
                succeeded: true,
                dictionary_key: Some(key),
                marker_ids,
            }) => {
                write!(f, "{key}: ")?;
                for (i, id) in marker_ids.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{id}")?;
                }
                Ok(())
            }
            Self::Completed(_) => f.write_str("No markers found"),
            Self::Failed(e) => write!(f, "Error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dictionary::DictionaryKey, vision::VisionError};

    #[test]
    fn success_lists_key_and_ids_in_order() {
        let result = DetectionResult::from_ids(&DictionaryKey::from("D2"), vec![7]);
        assert_eq!(TickOutcome::Completed(result).to_string(), "D2: 7");

        let result = DetectionResult::from_ids(&DictionaryKey::from("DICT_6X6_250"), vec![3, 1, 2]);
        assert_eq!(
            TickOutcome::Completed(result).to_string(),
            "DICT_6X6_250: 3, 1, 2"
        );
    }

    #[test]
    fn other_messages() {
        assert_eq!(
            TickOutcome::Completed(DetectionResult::none()).to_string(),
            "No markers found"
        );
        assert_eq!(
            TickOutcome::WaitingForFrame.to_string(),
            "Vision library loaded, waiting for camera..."
        );
        let err = TickError::Vision(VisionError::call("cvt_color", "bad input"));
        assert_eq!(
            TickOutcome::Failed(err).to_string(),
            "Error: cvt_color failed: bad input"
        );
        assert!(TickOutcome::LibraryLoading.is_waiting());
        assert!(!TickOutcome::Completed(DetectionResult::none()).is_waiting());
    }
}
