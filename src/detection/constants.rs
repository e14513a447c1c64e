/// Period of the detection tick in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 100;
/// How long to wait for the vision library before reporting it failed.
pub const DEFAULT_LIBRARY_TIMEOUT_MS: u64 = 10_000;
/// Camera opened when the configuration does not name one.
pub const DEFAULT_CAMERA_ID: usize = 0;
/// Geometry of frames produced in synthetic mode.
pub const SYNTHETIC_WIDTH: u32 = 320;
pub const SYNTHETIC_HEIGHT: u32 = 240;
