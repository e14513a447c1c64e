use crate::{
    config::Config,
    log::{log_level::LogLevel, log_msg::LogMsg, logger_handle::LoggerHandle},
};

use std::{
    fs::{self, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::mpsc::{self, TrySendError},
    thread::{self, JoinHandle},
    time::{SystemTime, UNIX_EPOCH},
};

/// Flush every 100 lines when debugging, so a crash loses little.
#[cfg(feature = "log-debug")]
const FLUSH_BATCH_SIZE: u32 = 100;

/// Flush every 1000 lines otherwise; a detection tick logs very little.
#[cfg(not(feature = "log-debug"))]
const FLUSH_BATCH_SIZE: u32 = 1_000;

const DEFAULT_APP_NAME: &str = "markerwatch";
const DEFAULT_QUEUE_CAPACITY: usize = 1_024;

/// Where and how the process log is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerSettings {
    /// Target directory; `None` means `logs/` next to the executable.
    pub dir: Option<PathBuf>,
    /// Prefix of the log file name.
    pub app_name: String,
    /// Capacity of the bounded record queue.
    pub capacity: usize,
    /// Mirror Warn/Error records to stderr.
    pub mirror_stderr: bool,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            dir: None,
            app_name: DEFAULT_APP_NAME.to_owned(),
            capacity: DEFAULT_QUEUE_CAPACITY,
            mirror_stderr: true,
        }
    }
}

impl LoggerSettings {
    /// Reads the `[Logging]` section: `log_path`, `log_filename`, `mirror_stderr`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            dir: config.get_non_empty("Logging", "log_path").map(expand_path),
            app_name: config
                .get_non_empty_or_default("Logging", "log_filename", DEFAULT_APP_NAME)
                .to_owned(),
            capacity: config
                .get("Logging", "queue_capacity")
                .and_then(|s| s.parse().ok())
                .filter(|cap: &usize| *cap > 0)
                .unwrap_or(defaults.capacity),
            mirror_stderr: config
                .get_bool("Logging", "mirror_stderr")
                .unwrap_or(defaults.mirror_stderr),
        }
    }
}

/// Bounded, non-blocking logger that writes to a per-process log file.
///
/// Producers enqueue through a [`LoggerHandle`]; a dedicated `logger-worker`
/// thread drains the queue, writes one line per record and flushes in
/// batches (and immediately on Warn/Error).
pub struct Logger {
    handle: LoggerHandle,
    worker: Option<JoinHandle<()>>,
    file_path: PathBuf,
}

impl Logger {
    /// Starts the logger described by `settings`.
    #[must_use]
    pub fn start(settings: &LoggerSettings) -> Self {
        let dir = settings
            .dir
            .clone()
            .unwrap_or_else(|| exe_dir_fallback_cwd().join("logs"));
        Self::start_in_dir(
            dir,
            &settings.app_name,
            settings.capacity,
            settings.mirror_stderr,
        )
    }

    /// Starts the logger in a specific directory, creating it if missing.
    ///
    /// The file name is `<app_name>-YYYYMMDD_HHMMSS-pid<PID>.log`.
    pub fn start_in_dir<D: AsRef<Path>>(
        dir: D,
        app_name: &str,
        cap: usize,
        mirror_stderr: bool,
    ) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let _ = fs::create_dir_all(&dir);

        let file_path = dir.join(format!(
            "{}-{}-pid{}.log",
            app_name,
            timestamp_for_filename(),
            std::process::id()
        ));

        let (tx, rx) = mpsc::sync_channel::<LogMsg>(cap.max(1));
        let worker_path = file_path.clone();

        let worker = thread::Builder::new()
            .name("logger-worker".into())
            .spawn(move || {
                let mut out = BufWriter::new(open_writer(&worker_path));
                let mut lines_written: u32 = 0;

                while let Ok(m) = rx.recv() {
                    let _ = writeln!(&mut out, "{}", m.format_line());
                    lines_written = lines_written.wrapping_add(1);

                    if m.level.is_problem() {
                        if mirror_stderr {
                            eprintln!("[{}] {}", m.level, m.text);
                        }
                        let _ = out.flush();
                    } else if lines_written.is_multiple_of(FLUSH_BATCH_SIZE) {
                        let _ = out.flush();
                    }
                }

                let _ = out.flush();
            })
            .ok();

        Self {
            handle: LoggerHandle { tx },
            worker,
            file_path,
        }
    }

    /// Attempts to enqueue a log message without blocking the current thread.
    ///
    /// # Errors
    /// Returns [`TrySendError`] when the queue is full or the worker is gone;
    /// the message is dropped in both cases.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), TrySendError<LogMsg>> {
        self.handle.try_log(level, text, target)
    }

    /// Returns a cloneable handle to hand out to components and threads.
    #[must_use]
    pub fn handle(&self) -> LoggerHandle {
        self.handle.clone()
    }

    /// Closes this logger's queue and waits until the worker has written
    /// and flushed every queued record.
    ///
    /// Handles obtained from [`Logger::handle`] keep the queue open, so they
    /// must be dropped first or this call blocks until they are.
    pub fn shutdown(self) {
        let Self { handle, worker, .. } = self;
        drop(handle);
        if let Some(worker) = worker {
            let _ = worker.join();
        }
    }

    /// Returns the path of the active log file.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

/// Target file, then a temp-dir fallback, then a sink. Never panics.
fn open_writer(path: &Path) -> Box<dyn Write + Send> {
    let open = |p: &Path| OpenOptions::new().create(true).append(true).open(p);
    match open(path) {
        Ok(f) => Box::new(f),
        Err(_) => match open(&std::env::temp_dir().join("markerwatch-fallback.log")) {
            Ok(f) => Box::new(f),
            Err(_) => Box::new(io::sink()),
        },
    }
}

fn exe_dir_fallback_cwd() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// `YYYYMMDD_HHMMSS` in UTC, e.g. `20251102_023045`.
fn timestamp_for_filename() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let (year, mon, day) = civil_from_days(secs / 86_400);
    let rem = secs % 86_400;
    format!(
        "{year:04}{mon:02}{day:02}_{:02}{:02}{:02}",
        rem / 3_600,
        (rem % 3_600) / 60,
        rem % 60
    )
}

/// Gregorian date for a count of days since 1970-01-01.
fn civil_from_days(days: u64) -> (i64, u64, u64) {
    // Shift the epoch to 0000-03-01 so leap days fall at the end of a year.
    let z = i64::try_from(days).unwrap_or(i64::MAX - 719_468) + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let mon = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(mon <= 2);
    #[allow(clippy::cast_sign_loss)]
    (year, mon as u64, day as u64)
}

/// Expands a leading `~` to the user's home directory.
fn expand_path(path_str: &str) -> PathBuf {
    let home = || {
        std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from)
    };
    if path_str == "~" {
        if let Some(h) = home() {
            return h;
        }
    }
    if let Some(rest) = path_str
        .strip_prefix("~/")
        .or_else(|| path_str.strip_prefix("~\\"))
    {
        if let Some(h) = home() {
            return h.join(rest);
        }
    }
    PathBuf::from(path_str)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn civil_from_days_known_dates() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        // 2000-02-29 is day 11_016.
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
        // 2024-12-31 is day 20_088.
        assert_eq!(civil_from_days(20_088), (2024, 12, 31));
    }

    #[test]
    fn settings_from_config_reads_logging_section() {
        let config = Config::parse(
            "[Logging]\nlog_path = /tmp/mw-logs\nlog_filename = cam0\nmirror_stderr = false\n",
        );
        let s = LoggerSettings::from_config(&config);
        assert_eq!(s.dir, Some(PathBuf::from("/tmp/mw-logs")));
        assert_eq!(s.app_name, "cam0");
        assert!(!s.mirror_stderr);
        assert_eq!(s.capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn settings_default_when_section_missing() {
        let s = LoggerSettings::from_config(&Config::empty());
        assert_eq!(s, LoggerSettings::default());
    }

    #[test]
    fn logger_writes_lines_to_its_file() {
        let dir = std::env::temp_dir().join(format!("markerwatch_logger_{}", std::process::id()));
        let logger = Logger::start_in_dir(&dir, "unit", 16, false);
        logger
            .try_log(LogLevel::Error, "tick failed", "test::target")
            .expect("queue has room");

        // Error records are flushed immediately by the worker.
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut content = String::new();
        while Instant::now() < deadline {
            content = fs::read_to_string(logger.file_path()).unwrap_or_default();
            if content.contains("tick failed") {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(content.contains("[ERROR]"), "got: {content}");
        assert!(content.contains("test::target | tick failed"));

        let name = logger.file_path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("unit-"));
        assert!(name.ends_with(".log"));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn shutdown_flushes_records_queued_just_before_it() {
        let dir = std::env::temp_dir().join(format!("markerwatch_shutdown_{}", std::process::id()));
        let logger = Logger::start_in_dir(&dir, "exit", 16, false);
        let sink = logger.handle();
        sink.try_log(LogLevel::Info, "camera 0 opened", "main").unwrap();
        sink.try_log(LogLevel::Error, "[Main] camera lost", "main").unwrap();
        drop(sink);

        let path = logger.file_path().to_path_buf();
        logger.shutdown();

        // No polling: everything is on disk once shutdown returns.
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("camera 0 opened"), "got: {content}");
        assert!(content.contains("[Main] camera lost"), "got: {content}");
        let _ = fs::remove_dir_all(dir);
    }
}
