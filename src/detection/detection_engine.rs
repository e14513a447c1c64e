use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use super::{
    constants::DEFAULT_LIBRARY_TIMEOUT_MS,
    detection_attempt::attempt_detection,
    detection_result::DetectionResult,
    detection_settings::DetectionSettings,
    engine_state::EngineState,
    search_order::search_order,
    status_reporter::StatusReporter,
    tick_error::TickError,
    tick_outcome::TickOutcome,
};
use crate::{
    camera_manager::{Frame, FrameSource, PixelFormat},
    dictionary::{DictionaryCatalog, DictionaryMemory},
    log::log_sink::LogSink,
    sink_debug, sink_error, sink_info, sink_trace, sink_warn,
    vision::{ColorConversion, RefineConfig, ScopedVision, VisionBinding},
};

/// Drives one detection attempt per tick and owns the session state.
///
/// Each tick:
/// 1. waits for the vision library, then for a usable frame;
/// 2. uploads the frame as RGBA and converts it to gray;
/// 3. tries the remembered dictionary, or the whole catalog in order,
///    stopping at the first dictionary that yields markers;
/// 4. reports the outcome as a status message.
///
/// Native handles live in scoped guards inside the tick, so they are all
/// released before `tick` returns, whatever happened in between. Failures
/// never escape a tick; the next tick simply tries again.
pub struct DetectionEngine<B: VisionBinding> {
    binding: B,
    catalog: DictionaryCatalog,
    memory: DictionaryMemory,
    refine: RefineConfig,
    state: EngineState,
    library_timeout: Duration,
    waiting_since: Option<Instant>,
    timeout_reported: bool,
    logger: Arc<dyn LogSink>,
}

impl<B: VisionBinding> DetectionEngine<B> {
    pub fn new(binding: B, catalog: DictionaryCatalog, logger: Arc<dyn LogSink>) -> Self {
        Self {
            binding,
            catalog,
            memory: DictionaryMemory::new(),
            refine: RefineConfig::default(),
            state: EngineState::Uninitialized,
            library_timeout: Duration::from_millis(DEFAULT_LIBRARY_TIMEOUT_MS),
            waiting_since: None,
            timeout_reported: false,
            logger,
        }
    }

    pub fn from_settings(binding: B, settings: &DetectionSettings, logger: Arc<dyn LogSink>) -> Self {
        Self::new(binding, settings.catalog.clone(), logger)
            .with_refine(settings.refine)
            .with_library_timeout(settings.library_timeout)
    }

    #[must_use]
    pub fn with_refine(mut self, refine: RefineConfig) -> Self {
        self.refine = refine;
        self
    }

    #[must_use]
    pub fn with_library_timeout(mut self, timeout: Duration) -> Self {
        self.library_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    #[must_use]
    pub const fn memory(&self) -> &DictionaryMemory {
        &self.memory
    }

    #[must_use]
    pub const fn catalog(&self) -> &DictionaryCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn binding(&self) -> &B {
        &self.binding
    }

    /// Leaves `Uninitialized` and starts the library load clock. Idempotent;
    /// the first tick calls it if nobody did.
    pub fn start(&mut self) {
        if self.state == EngineState::Uninitialized {
            self.state = EngineState::WaitingForLibrary;
            self.waiting_since = Some(Instant::now());
            sink_debug!(self.logger, "[Engine] waiting for vision library");
        }
    }

    /// Forgets the remembered dictionary; the next tick searches the full
    /// catalog again.
    pub fn restart_session(&mut self) {
        if let Some(key) = self.memory.remembered() {
            sink_info!(self.logger, "[Engine] session restart, forgetting {key}");
        }
        self.memory.reset();
    }

    /// Runs one tick and reports its status.
    pub fn tick(
        &mut self,
        source: &mut dyn FrameSource,
        reporter: &dyn StatusReporter,
    ) -> TickOutcome {
        let outcome = self.step(source);
        reporter.report(&outcome.to_string());
        outcome
    }

    fn step(&mut self, source: &mut dyn FrameSource) -> TickOutcome {
        self.start();

        if self.state == EngineState::WaitingForLibrary {
            if !self.binding.is_ready() {
                return self.library_pending();
            }
            sink_info!(self.logger, "[Engine] vision library ready");
            self.state = EngineState::WaitingForFrame;
        }

        let Some(frame) = self.usable_frame(source) else {
            if self.state == EngineState::Detecting {
                sink_info!(self.logger, "[Engine] frame source no longer ready, waiting");
                self.state = EngineState::WaitingForFrame;
            }
            return TickOutcome::WaitingForFrame;
        };

        if self.state == EngineState::WaitingForFrame {
            sink_info!(
                self.logger,
                "[Engine] frame source ready ({}x{}), detecting",
                frame.width,
                frame.height
            );
            self.state = EngineState::Detecting;
        }

        match self.detect(&frame) {
            Ok(result) => TickOutcome::Completed(result),
            Err(e) => {
                sink_error!(self.logger, "[Engine] tick failed: {e}");
                TickOutcome::Failed(e)
            }
        }
    }

    fn library_pending(&mut self) -> TickOutcome {
        let waited = self
            .waiting_since
            .map_or(Duration::ZERO, |since| since.elapsed());
        if waited < self.library_timeout {
            return TickOutcome::LibraryLoading;
        }
        if !self.timeout_reported {
            self.timeout_reported = true;
            sink_error!(
                self.logger,
                "[Engine] vision library not ready after {} ms",
                waited.as_millis()
            );
        }
        TickOutcome::LibraryTimedOut
    }

    /// A frame with non-zero geometry and a complete buffer, or `None`.
    fn usable_frame(&self, source: &mut dyn FrameSource) -> Option<Frame> {
        if !source.is_ready() {
            return None;
        }
        match source.current_frame() {
            Ok(frame) if frame.has_enough_data() => Some(frame),
            Ok(frame) => {
                sink_debug!(
                    self.logger,
                    "[Engine] incomplete frame {}x{} ({} of {} bytes)",
                    frame.width,
                    frame.height,
                    frame.bytes.len(),
                    frame.expected_len()
                );
                None
            }
            Err(e) => {
                sink_debug!(self.logger, "[Engine] frame source: {e}");
                None
            }
        }
    }

    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, TickError> {
        if frame.format != PixelFormat::Rgba8 {
            return Err(TickError::UnsupportedFormat(frame.format));
        }
        let binding = &self.binding;

        let mut rgba = binding.scoped_image_buffer(frame.width, frame.height, PixelFormat::Rgba8)?;
        binding.write_pixels(&mut rgba, &frame.bytes)?;
        let gray = binding.scoped_converted(
            &rgba,
            frame.width,
            frame.height,
            PixelFormat::Gray8,
            ColorConversion::RgbaToGray,
        )?;

        for spec in search_order(&self.catalog, &self.memory) {
            match attempt_detection(binding, &gray, spec, &self.refine, &self.logger) {
                Ok(result) if result.succeeded => {
                    if self.memory.remember(&spec.key) {
                        sink_info!(self.logger, "[Engine] dictionary discovered: {}", spec.key);
                    }
                    return Ok(result);
                }
                Ok(_) => {
                    sink_trace!(self.logger, "[Engine] no markers for {}", spec.key);
                }
                Err(e) => {
                    sink_warn!(self.logger, "[Engine] {} skipped: {e}", spec.key);
                }
            }
        }
        Ok(DetectionResult::none())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::{
        camera_manager::{CameraError, SyntheticFrameSource},
        detection::status_reporter::LatestStatus,
        dictionary::DictionarySpec,
        log::{MemoryLogSink, log_level::LogLevel},
        vision::ScriptedBinding,
    };

    fn catalog() -> DictionaryCatalog {
        DictionaryCatalog::new(vec![DictionarySpec::new("D1", 1), DictionarySpec::new("D2", 2)])
            .unwrap()
    }

    fn engine(binding: &ScriptedBinding) -> (DetectionEngine<ScriptedBinding>, Arc<MemoryLogSink>) {
        let sink = Arc::new(MemoryLogSink::new());
        let logger: Arc<dyn LogSink> = sink.clone();
        (DetectionEngine::new(binding.clone(), catalog(), logger), sink)
    }

    /// Serves frames with a geometry that can be changed between ticks.
    struct Scripted {
        ready: bool,
        frame: Result<Frame, ()>,
    }

    impl FrameSource for Scripted {
        fn is_ready(&mut self) -> bool {
            self.ready
        }

        fn current_frame(&mut self) -> Result<Frame, CameraError> {
            self.frame.clone().map_err(|()| CameraError::NotFrame)
        }
    }

    fn rgba_frame(width: u32, height: u32, len: usize) -> Frame {
        Frame {
            width,
            height,
            timestamp_ms: 0,
            format: PixelFormat::Rgba8,
            bytes: Arc::new(vec![128; len]),
        }
    }

    #[test]
    fn state_machine_reaches_detecting_and_regresses() {
        let binding = ScriptedBinding::new();
        let (mut engine, _) = engine(&binding);
        let status = LatestStatus::new();
        assert_eq!(engine.state(), EngineState::Uninitialized);

        let mut source = Scripted { ready: false, frame: Err(()) };
        assert_eq!(engine.tick(&mut source, &status), TickOutcome::WaitingForFrame);
        assert_eq!(engine.state(), EngineState::WaitingForFrame);

        source.ready = true;
        source.frame = Ok(rgba_frame(4, 4, 64));
        engine.tick(&mut source, &status);
        assert_eq!(engine.state(), EngineState::Detecting);

        source.ready = false;
        assert!(engine.tick(&mut source, &status).is_waiting());
        assert_eq!(engine.state(), EngineState::WaitingForFrame);
        assert_eq!(
            status.get().unwrap(),
            "Vision library loaded, waiting for camera..."
        );
    }

    #[test]
    fn incomplete_frames_are_not_ready() {
        let binding = ScriptedBinding::new();
        let (mut engine, _) = engine(&binding);
        let status = LatestStatus::new();

        for frame in [rgba_frame(0, 4, 64), rgba_frame(4, 4, 63), rgba_frame(4, 0, 0)] {
            let mut source = Scripted { ready: true, frame: Ok(frame) };
            assert_eq!(engine.tick(&mut source, &status), TickOutcome::WaitingForFrame);
        }
        let mut source = Scripted { ready: true, frame: Err(()) };
        assert_eq!(engine.tick(&mut source, &status), TickOutcome::WaitingForFrame);
        assert_eq!(binding.ledger().native_calls, 0);
    }

    #[test]
    fn library_not_ready_then_ready() {
        let binding = ScriptedBinding::new().with_ready_after(2).with_markers(1, &[4]);
        let (mut engine, _) = engine(&binding);
        let status = LatestStatus::new();
        let mut source = SyntheticFrameSource::new(8, 8);

        assert_eq!(engine.tick(&mut source, &status), TickOutcome::LibraryLoading);
        assert_eq!(status.get().unwrap(), "Loading vision library...");
        assert_eq!(engine.tick(&mut source, &status), TickOutcome::LibraryLoading);
        assert_eq!(binding.ledger().native_calls, 0);

        let outcome = engine.tick(&mut source, &status);
        assert_eq!(outcome.result().unwrap().marker_ids, vec![4]);
        assert_eq!(status.get().unwrap(), "D1: 4");
    }

    #[test]
    fn library_timeout_is_reported_once() {
        let binding = ScriptedBinding::new().with_ready_after(u32::MAX);
        let (engine, sink) = engine(&binding);
        let mut engine = engine.with_library_timeout(Duration::ZERO);
        let status = LatestStatus::new();
        let mut source = SyntheticFrameSource::new(8, 8);

        for _ in 0..3 {
            assert_eq!(engine.tick(&mut source, &status), TickOutcome::LibraryTimedOut);
        }
        assert_eq!(status.get().unwrap(), "Vision library failed to load");
        assert_eq!(sink.count(LogLevel::Error), 1);
        assert_eq!(engine.state(), EngineState::WaitingForLibrary);
    }

    #[test]
    fn unsupported_frame_format_fails_the_tick_only() {
        let binding = ScriptedBinding::new().with_markers(1, &[4]);
        let (mut engine, _) = engine(&binding);
        let status = LatestStatus::new();
        let mut gray = rgba_frame(4, 4, 64);
        gray.format = PixelFormat::Gray8;
        let mut source = Scripted { ready: true, frame: Ok(gray) };

        assert!(matches!(
            engine.tick(&mut source, &status),
            TickOutcome::Failed(TickError::UnsupportedFormat(PixelFormat::Gray8))
        ));
        assert!(status.get().unwrap().starts_with("Error: "));

        source.frame = Ok(rgba_frame(4, 4, 64));
        assert_eq!(engine.tick(&mut source, &status).to_string(), "D1: 4");
    }

    #[test]
    fn restart_session_forgets_dictionary() {
        let binding = ScriptedBinding::new().with_markers(2, &[7]);
        let (mut engine, _) = engine(&binding);
        let status = LatestStatus::new();
        let mut source = SyntheticFrameSource::new(8, 8);

        engine.tick(&mut source, &status);
        assert_eq!(engine.memory().remembered().unwrap().as_str(), "D2");

        // D1 now matches too, but the remembered D2 is the only one searched.
        binding.set_markers(1, &[1]);
        assert_eq!(engine.tick(&mut source, &status).to_string(), "D2: 7");

        engine.restart_session();
        assert!(engine.memory().remembered().is_none());
        assert_eq!(engine.tick(&mut source, &status).to_string(), "D1: 1");
        assert_eq!(engine.memory().remembered().unwrap().as_str(), "D1");
        assert!(binding.is_balanced());
    }
}
