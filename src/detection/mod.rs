//! The detection engine: per-tick frame acquisition, dictionary discovery
//! and the periodic worker that drives it.
pub mod constants;
pub mod detection_attempt;
pub mod detection_engine;
pub mod detection_result;
pub mod detection_settings;
pub mod detection_worker;
pub mod engine_state;
pub mod search_order;
pub mod status_reporter;
pub mod tick_error;
pub mod tick_outcome;

pub use detection_engine::DetectionEngine;
pub use detection_result::DetectionResult;
pub use detection_settings::DetectionSettings;
pub use detection_worker::DetectionWorker;
pub use engine_state::EngineState;
pub use status_reporter::{ChannelStatusReporter, LatestStatus, StatusReporter, StdoutStatusReporter};
pub use tick_error::TickError;
pub use tick_outcome::TickOutcome;
