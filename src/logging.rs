//! Structured logging module for Vitalis
//!
//! Console output goes through `tracing`; when a log directory is configured
//! every line is also appended to `vitalis-YYYY-MM-DD.log` with categories:
//! - SESSION: Session lifecycle (open, reuse)
//! - CHAT: Message exchange
//! - TIP: Quick-tip generation
//! - FEED: Biometric feed start/stop
//! - ERROR: Absorbed failures and fallbacks

use chrono::{Local, Utc};
use once_cell::sync::Lazy;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_RETENTION_DAYS: i64 = 7;

/// Log categories for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Session,
    Chat,
    Tip,
    Feed,
    Error,
}

impl LogCategory {
    fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Session => "SESSION",
            LogCategory::Chat => "CHAT",
            LogCategory::Tip => "TIP",
            LogCategory::Feed => "FEED",
            LogCategory::Error => "ERROR",
        }
    }
}

/// Directory for the daily log file, unset until `init_file_sink`
static LOG_DIR: Lazy<Mutex<Option<PathBuf>>> = Lazy::new(|| Mutex::new(None));

fn log_file_path(dir: &Path) -> PathBuf {
    let today = Local::now().format("%Y-%m-%d").to_string();
    dir.join(format!("vitalis-{}.log", today))
}

/// Install the console subscriber. Must run before configuration is read so
/// its warnings are not lost. Only the first install wins.
pub fn init_console() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Start appending every log line to a daily file under `dir`.
pub fn init_file_sink(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    *LOG_DIR.lock().unwrap_or_else(|e| e.into_inner()) = Some(dir.to_path_buf());

    log(LogCategory::Session, None, "Vitalis file logging initialized");
    Ok(())
}

/// Log a message with category and optional session context
pub fn log(category: LogCategory, session_id: Option<&str>, message: &str) {
    let session = session_id.map(|id| id.get(..8).unwrap_or(id)).unwrap_or("-");

    match category {
        LogCategory::Error => {
            tracing::warn!(category = category.as_str(), session, "{}", message)
        }
        _ => tracing::info!(category = category.as_str(), session, "{}", message),
    }

    let dir = LOG_DIR.lock().unwrap_or_else(|e| e.into_inner()).clone();
    let Some(dir) = dir else {
        return;
    };

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let context = session_id
        .map(|_| format!("session={} | ", session))
        .unwrap_or_default();
    let line = format!("[{}] [{}] {}{}\n", timestamp, category.as_str(), context, message);

    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_file_path(&dir)) {
        let _ = file.write_all(line.as_bytes());
    }
}

pub fn log_session(session_id: Option<&str>, message: &str) {
    log(LogCategory::Session, session_id, message);
}

pub fn log_chat(session_id: Option<&str>, message: &str) {
    log(LogCategory::Chat, session_id, message);
}

pub fn log_tip(message: &str) {
    log(LogCategory::Tip, None, message);
}

pub fn log_feed(message: &str) {
    log(LogCategory::Feed, None, message);
}

pub fn log_error(session_id: Option<&str>, message: &str) {
    log(LogCategory::Error, session_id, message);
}

/// Remove log files older than the retention window. Returns how many were deleted.
pub fn cleanup_old_logs(dir: &Path) -> std::io::Result<usize> {
    let mut deleted = 0;

    if !dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - chrono::Duration::days(LOG_RETENTION_DAYS);

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("vitalis-") && n.ends_with(".log"))
            .unwrap_or(false);
        if !is_log {
            continue;
        }

        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            let modified_time: chrono::DateTime<Utc> = modified.into();
            if modified_time < cutoff && fs::remove_file(&path).is_ok() {
                deleted += 1;
            }
        }
    }

    Ok(deleted)
}
