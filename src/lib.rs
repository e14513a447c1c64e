//! markerwatch continuously scans camera frames for ArUco fiducial markers.
//!
//! Each detection tick grabs a frame, converts it to gray and searches it
//! with the supported marker dictionaries. Once a dictionary yields markers
//! it is remembered and searched alone for the rest of the session.
//!
//! The native vision library sits behind [`vision::VisionBinding`]; the
//! OpenCV binding and camera are enabled with the `opencv` feature.

/// Frame sources: camera capture and a synthetic generator.
pub mod camera_manager;
/// INI-style configuration loading.
pub mod config;
/// Detection engine, per-tick logic and the periodic worker.
pub mod detection;
/// Dictionary catalog and per-session dictionary memory.
pub mod dictionary;
/// Logging utilities for the application.
pub mod log;
/// Small shared helpers.
pub mod utils;
/// Native vision library boundary and scoped handle guards.
pub mod vision;
