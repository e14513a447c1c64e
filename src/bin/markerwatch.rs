//! The markerwatch binary.
//!
//! Usage: `markerwatch [CONFIG]` (defaults to `markerwatch.conf`).
//! While running, type `r` + Enter to restart the session (forget the
//! remembered dictionary) or just Enter to quit.

use std::{env, io, process::ExitCode, sync::Arc};

use markerwatch::{
    camera_manager::{FrameSource, SyntheticFrameSource},
    config::Config,
    detection::{
        DetectionEngine, DetectionSettings, DetectionWorker, StdoutStatusReporter,
        constants::{SYNTHETIC_HEIGHT, SYNTHETIC_WIDTH},
    },
    log::{
        log_sink::LogSink,
        logger::{Logger, LoggerSettings},
    },
    sink_error, sink_info,
    vision::{ScriptedBinding, VisionBinding},
};

/// Dictionary token and ids the synthetic scene shows (`DICT_6X6_250`).
const DEMO_TOKEN: i32 = 10;
const DEMO_IDS: [i32; 3] = [23, 7, 42];

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    let config_result = if args.len() > 1 {
        Config::load(&args[1])
    } else {
        Config::load("markerwatch.conf")
    };
    let config = config_result.unwrap_or_else(|e| {
        eprintln!("Error loading config: {e}. Using defaults.");
        Config::empty()
    });

    let logger = Logger::start(&LoggerSettings::from_config(&config));
    eprintln!("Logging to {}", logger.file_path().display());

    let code = {
        let sink: Arc<dyn LogSink> = Arc::new(logger.handle());
        match DetectionSettings::from_config(&config) {
            Ok(settings) => {
                let synthetic = config.get_bool("Camera", "synthetic").unwrap_or(false);
                match run(&config, &settings, synthetic, &sink) {
                    Ok(()) => ExitCode::SUCCESS,
                    Err(e) => {
                        sink_error!(sink, "[Main] {e}");
                        eprintln!("{e}");
                        ExitCode::FAILURE
                    }
                }
            }
            Err(e) => {
                sink_error!(sink, "[Main] invalid [Detection] configuration: {e}");
                eprintln!("Invalid [Detection] configuration: {e}");
                ExitCode::from(2)
            }
        }
    };

    // Every handle is gone with `sink`; this drains the queue to disk.
    logger.shutdown();
    code
}

#[cfg(feature = "opencv")]
fn run(
    config: &Config,
    settings: &DetectionSettings,
    synthetic: bool,
    sink: &Arc<dyn LogSink>,
) -> Result<(), String> {
    use markerwatch::{camera_manager::CameraManager, vision::OpenCvBinding};

    if synthetic {
        return run_demo(settings, sink);
    }
    let device_id = config
        .get("Camera", "device")
        .and_then(|s| s.parse().ok())
        .unwrap_or(markerwatch::detection::constants::DEFAULT_CAMERA_ID);
    let camera = CameraManager::new(device_id, Arc::clone(sink)).map_err(|e| e.to_string())?;
    sink_info!(sink, "[Main] camera {device_id} opened");
    watch(OpenCvBinding::new(), Box::new(camera), settings, sink)
}

#[cfg(not(feature = "opencv"))]
fn run(
    _config: &Config,
    settings: &DetectionSettings,
    synthetic: bool,
    sink: &Arc<dyn LogSink>,
) -> Result<(), String> {
    if !synthetic {
        eprintln!("Built without the `opencv` feature; running the synthetic demo.");
    }
    run_demo(settings, sink)
}

fn run_demo(settings: &DetectionSettings, sink: &Arc<dyn LogSink>) -> Result<(), String> {
    sink_info!(sink, "[Main] synthetic demo mode");
    let binding = ScriptedBinding::new().with_markers(DEMO_TOKEN, &DEMO_IDS);
    let source = SyntheticFrameSource::new(SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT).with_warmup(5);
    watch(binding, Box::new(source), settings, sink)
}

/// Runs the detection worker until stdin closes or reads an empty line.
fn watch<B: VisionBinding + Send + 'static>(
    binding: B,
    source: Box<dyn FrameSource>,
    settings: &DetectionSettings,
    sink: &Arc<dyn LogSink>,
) -> Result<(), String> {
    let engine = DetectionEngine::from_settings(binding, settings, Arc::clone(sink));
    let mut worker = DetectionWorker::start(
        engine,
        source,
        Box::new(StdoutStatusReporter::new()),
        settings.interval,
        Arc::clone(sink),
    )
    .map_err(|e| format!("failed to start detection worker: {e}"))?;

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) if line.trim().eq_ignore_ascii_case("r") => {
                sink_info!(sink, "[Main] session restart requested");
                worker.restart_session();
            }
            Ok(_) => break,
        }
    }

    sink_info!(sink, "[Main] shutting down");
    worker
        .stop()
        .map(|_| ())
        .ok_or_else(|| "detection worker panicked".to_owned())
}
