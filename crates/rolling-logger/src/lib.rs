//! Rolling Logger
//!
//! Daily-rotated file logging plus an in-memory circular buffer of the most
//! recent lines, so a UI can show the tail of the log without touching disk.
//!
//! `log` records are bridged into `tracing`, so crates using either facade
//! end up in the same files.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use chrono::{Local, NaiveDate};
use tracing_subscriber::fmt::MakeWriter;

pub use tracing::Level;

/// Default number of daily files kept on disk
pub const DEFAULT_MAX_FILES: usize = 7;
/// Default number of lines kept in memory
pub const DEFAULT_BUFFER_LINES: usize = 500;

static LOGGER: OnceLock<RollingWriter> = OnceLock::new();

/// Logger errors
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("logger already initialized")]
    AlreadyInitialized,
    #[error("logger not initialized")]
    NotInitialized,
    #[error("failed to prepare log directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to install subscriber: {0}")]
    Install(String),
}

/// Options for [`init_with`]
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub log_dir: PathBuf,
    pub app_name: String,
    pub max_files: usize,
    pub buffer_lines: usize,
    pub level: Level,
}

impl LoggerOptions {
    pub fn new(log_dir: impl Into<PathBuf>, app_name: &str) -> Self {
        Self {
            log_dir: log_dir.into(),
            app_name: app_name.to_string(),
            max_files: DEFAULT_MAX_FILES,
            buffer_lines: DEFAULT_BUFFER_LINES,
            level: Level::INFO,
        }
    }
}

/// Initialize logging with default retention into `log_dir`
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), LoggerError> {
    init_with(LoggerOptions::new(log_dir, app_name))
}

/// Initialize logging. Can only succeed once per process.
pub fn init_with(options: LoggerOptions) -> Result<(), LoggerError> {
    if LOGGER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let writer = RollingWriter::new(
        &options.log_dir,
        &options.app_name,
        options.max_files,
        options.buffer_lines,
    )?;

    tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_ansi(false)
        .with_target(true)
        .with_max_level(options.level)
        .try_init()
        .map_err(|e| LoggerError::Install(e.to_string()))?;

    LOGGER
        .set(writer)
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    tracing::info!(app = %options.app_name, dir = %options.log_dir.display(), "logger initialized");
    Ok(())
}

/// Log an info line through the installed logger
pub fn info(msg: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    tracing::info!("{}", msg);
    Ok(())
}

/// Log an error line through the installed logger
pub fn error(msg: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    tracing::error!("{}", msg);
    Ok(())
}

/// The last `n` buffered lines, oldest first. Empty when not initialized.
pub fn recent_lines(n: usize) -> Vec<String> {
    LOGGER.get().map(|w| w.recent(n)).unwrap_or_default()
}

// ========================
// Writer
// ========================

struct Inner {
    dir: PathBuf,
    app_name: String,
    max_files: usize,
    capacity: usize,
    current: Mutex<Option<(NaiveDate, File)>>,
    buffer: Mutex<VecDeque<String>>,
}

/// Writer that appends to `{app}-{YYYY-MM-DD}.log` and mirrors lines into a ring buffer
#[derive(Clone)]
pub struct RollingWriter {
    inner: Arc<Inner>,
}

impl RollingWriter {
    pub fn new(
        dir: &Path,
        app_name: &str,
        max_files: usize,
        buffer_lines: usize,
    ) -> Result<Self, LoggerError> {
        fs::create_dir_all(dir).map_err(|source| LoggerError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;

        Ok(Self {
            inner: Arc::new(Inner {
                dir: dir.to_path_buf(),
                app_name: app_name.to_string(),
                max_files: max_files.max(1),
                capacity: buffer_lines,
                current: Mutex::new(None),
                buffer: Mutex::new(VecDeque::with_capacity(buffer_lines)),
            }),
        })
    }

    /// Path of the file used for `date`
    pub fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.inner
            .dir
            .join(format!("{}-{}.log", self.inner.app_name, date.format("%Y-%m-%d")))
    }

    /// The last `n` lines, oldest first
    pub fn recent(&self, n: usize) -> Vec<String> {
        match self.inner.buffer.lock() {
            Ok(buffer) => {
                let skip = buffer.len().saturating_sub(n);
                buffer.iter().skip(skip).cloned().collect()
            }
            Err(_) => Vec::new(),
        }
    }

    fn write_on(&self, date: NaiveDate, buf: &[u8]) -> io::Result<()> {
        {
            let mut current = self
                .inner
                .current
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;

            let rotate = !matches!(&*current, Some((d, _)) if *d == date);
            if rotate {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(self.file_for(date))?;
                *current = Some((date, file));
                self.prune();
            }

            if let Some((_, file)) = current.as_mut() {
                file.write_all(buf)?;
            }
        }

        if self.inner.capacity > 0 {
            if let Ok(mut buffer) = self.inner.buffer.lock() {
                for line in String::from_utf8_lossy(buf).lines() {
                    if buffer.len() == self.inner.capacity {
                        buffer.pop_front();
                    }
                    buffer.push_back(line.to_string());
                }
            }
        }
        Ok(())
    }

    /// Remove the oldest files beyond `max_files`
    fn prune(&self) {
        let prefix = format!("{}-", self.inner.app_name);
        let Ok(entries) = fs::read_dir(&self.inner.dir) else {
            return;
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(&prefix) && n.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        // Date suffix sorts lexically
        files.sort();
        let excess = files.len().saturating_sub(self.inner.max_files);
        for path in files.into_iter().take(excess) {
            let _ = fs::remove_file(path);
        }
    }
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_on(Local::now().date_naive(), buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut current = self
            .inner
            .current
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        match current.as_mut() {
            Some((_, file)) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RollingWriter {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
