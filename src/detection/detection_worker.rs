use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use super::{detection_engine::DetectionEngine, status_reporter::StatusReporter};
use crate::{
    camera_manager::FrameSource, log::log_sink::LogSink, sink_debug, sink_info, vision::VisionBinding,
};

/// Background thread that ticks a [`DetectionEngine`] once per period.
///
/// Ticks never overlap: a tick that overruns its period drops the missed
/// ticks and the next one starts a full period after it finished.
pub struct DetectionWorker<B: VisionBinding + Send + 'static> {
    running: Arc<AtomicBool>,
    restart_requested: Arc<AtomicBool>,
    handle: Option<JoinHandle<DetectionEngine<B>>>,
}

impl<B: VisionBinding + Send + 'static> DetectionWorker<B> {
    /// Spawns the `marker-detector` thread.
    ///
    /// # Errors
    /// Returns the OS error if the thread cannot be spawned.
    pub fn start(
        mut engine: DetectionEngine<B>,
        mut source: Box<dyn FrameSource>,
        reporter: Box<dyn StatusReporter>,
        period: Duration,
        logger: Arc<dyn LogSink>,
    ) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let restart_requested = Arc::new(AtomicBool::new(false));
        let restart = Arc::clone(&restart_requested);
        let period = period.max(Duration::from_millis(1));

        let handle = thread::Builder::new()
            .name("marker-detector".into())
            .spawn(move || {
                sink_info!(logger, "[Worker] started, period {} ms", period.as_millis());
                engine.start();
                let mut next_deadline = Instant::now();

                while flag.load(Ordering::SeqCst) {
                    if restart.swap(false, Ordering::SeqCst) {
                        engine.restart_session();
                    }
                    engine.tick(source.as_mut(), reporter.as_ref());

                    next_deadline += period;
                    let now = Instant::now();
                    if now >= next_deadline {
                        sink_debug!(
                            logger,
                            "[Worker] tick overran its period by {} ms",
                            (now - next_deadline).as_millis()
                        );
                        next_deadline = now + period;
                    }
                    // Parked until the deadline or an unpark from `stop`.
                    while flag.load(Ordering::SeqCst) {
                        let now = Instant::now();
                        if now >= next_deadline {
                            break;
                        }
                        thread::park_timeout(next_deadline - now);
                    }
                }
                sink_info!(logger, "[Worker] stopped");
                engine
            })?;

        Ok(Self {
            running,
            restart_requested,
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Makes the engine forget its remembered dictionary before the next
    /// tick.
    pub fn restart_session(&self) {
        self.restart_requested.store(true, Ordering::SeqCst);
    }

    /// Stops the loop after the tick in progress and hands the engine back.
    ///
    /// Returns `None` if the worker was already stopped or its thread
    /// panicked.
    pub fn stop(&mut self) -> Option<DetectionEngine<B>> {
        self.running.store(false, Ordering::SeqCst);
        let handle = self.handle.take()?;
        handle.thread().unpark();
        handle.join().ok()
    }
}

impl<B: VisionBinding + Send + 'static> Drop for DetectionWorker<B> {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use std::sync::{Mutex, mpsc};

    use super::*;
    use crate::{
        camera_manager::{CameraError, Frame, SyntheticFrameSource},
        detection::status_reporter::ChannelStatusReporter,
        dictionary::{DictionaryCatalog, DictionarySpec},
        log::NoopLogSink,
        vision::ScriptedBinding,
    };

    fn logger() -> Arc<dyn LogSink> {
        Arc::new(NoopLogSink)
    }

    fn engine(binding: &ScriptedBinding) -> DetectionEngine<ScriptedBinding> {
        let catalog =
            DictionaryCatalog::new(vec![DictionarySpec::new("D1", 1), DictionarySpec::new("D2", 2)])
                .unwrap();
        DetectionEngine::new(binding.clone(), catalog, logger())
    }

    #[test]
    fn reports_status_every_period_and_returns_engine() {
        let binding = ScriptedBinding::new().with_markers(2, &[9, 3]);
        let (tx, rx) = mpsc::channel();
        let mut worker = DetectionWorker::start(
            engine(&binding),
            Box::new(SyntheticFrameSource::new(8, 8)),
            Box::new(ChannelStatusReporter::new(tx)),
            Duration::from_millis(5),
            logger(),
        )
        .unwrap();

        for _ in 0..3 {
            let status = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(status, "D2: 9, 3");
        }
        assert!(worker.is_running());

        let engine = worker.stop().unwrap();
        assert_eq!(engine.memory().remembered().unwrap().as_str(), "D2");
        assert!(!worker.is_running());
        assert!(worker.stop().is_none());
        assert!(binding.is_balanced());
    }

    #[test]
    fn restart_request_reaches_the_engine() {
        let binding = ScriptedBinding::new().with_markers(2, &[5]);
        let (tx, rx) = mpsc::channel();
        let mut worker = DetectionWorker::start(
            engine(&binding),
            Box::new(SyntheticFrameSource::new(8, 8)),
            Box::new(ChannelStatusReporter::new(tx)),
            Duration::from_millis(5),
            logger(),
        )
        .unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "D2: 5");
        binding.set_markers(1, &[8]);
        worker.restart_session();
        // Ticks already in flight may still report D2 before the restart lands.
        let mut status = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        while status == "D2: 5" {
            status = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        assert_eq!(status, "D1: 8");

        let engine = worker.stop().unwrap();
        assert_eq!(engine.memory().remembered().unwrap().as_str(), "D1");
    }

    /// Takes `delay` per readiness poll and records when each poll began.
    struct SlowCamera {
        delay: Duration,
        polls: Arc<Mutex<Vec<Instant>>>,
    }

    impl FrameSource for SlowCamera {
        fn is_ready(&mut self) -> bool {
            self.polls.lock().unwrap().push(Instant::now());
            thread::sleep(self.delay);
            false
        }

        fn current_frame(&mut self) -> Result<Frame, CameraError> {
            Err(CameraError::NotFrame)
        }
    }

    #[test]
    fn overrunning_ticks_still_rest_a_full_period() {
        let polls = Arc::new(Mutex::new(Vec::new()));
        let camera = SlowCamera {
            delay: Duration::from_millis(30),
            polls: Arc::clone(&polls),
        };
        let (tx, _rx) = mpsc::channel();
        let mut worker = DetectionWorker::start(
            engine(&ScriptedBinding::new()),
            Box::new(camera),
            Box::new(ChannelStatusReporter::new(tx)),
            Duration::from_millis(10),
            logger(),
        )
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while polls.lock().unwrap().len() < 4 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        worker.stop().unwrap();

        let polls = polls.lock().unwrap();
        assert!(polls.len() >= 4);
        for pair in polls.windows(2) {
            // 30 ms of tick plus a full 10 ms period before the next one.
            assert!(pair[1] - pair[0] >= Duration::from_millis(40));
        }
    }

    #[test]
    fn stop_interrupts_a_long_period() {
        let binding = ScriptedBinding::new();
        let (tx, rx) = mpsc::channel();
        let mut worker = DetectionWorker::start(
            engine(&binding),
            Box::new(SyntheticFrameSource::new(8, 8)),
            Box::new(ChannelStatusReporter::new(tx)),
            Duration::from_secs(60),
            logger(),
        )
        .unwrap();

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            "No markers found"
        );
        let started = Instant::now();
        assert!(worker.stop().is_some());
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn drop_stops_the_thread() {
        let binding = ScriptedBinding::new().with_markers(1, &[1]);
        let (tx, rx) = mpsc::channel();
        {
            let _worker = DetectionWorker::start(
                engine(&binding),
                Box::new(SyntheticFrameSource::new(8, 8)),
                Box::new(ChannelStatusReporter::new(tx)),
                Duration::from_millis(5),
                logger(),
            )
            .unwrap();
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        // The reporter's sender went away with the joined thread.
        while rx.recv_timeout(Duration::from_secs(5)).is_ok() {}
        assert!(binding.is_balanced());
    }
}
