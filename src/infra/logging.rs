//! Logging infrastructure for PasswordSaver
//!
//! Two outputs, as before:
//! - `tracing` events from the store, installed by [`init_tracing`]
//! - a categorized debug log written by [`debug_log`] when debug mode is on
//!
//! SECURITY: neither output ever receives secret material.

use crate::errors::AppError;
use crate::infra::{paths, AppConfig};
use chrono::Local;
use once_cell::sync::OnceCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Global flag indicating whether debug logging is enabled.
static DEBUG_MODE: AtomicBool = AtomicBool::new(false);

/// Installed subscriber; holds the file writer guard when file logging is on
static TRACING: OnceCell<Option<WorkerGuard>> = OnceCell::new();

/// Sets the debug mode flag
pub fn set_debug_mode(enabled: bool) {
    DEBUG_MODE.store(enabled, Ordering::Relaxed);
}

/// Returns whether debug mode is on
pub fn is_debug_mode() -> bool {
    DEBUG_MODE.load(Ordering::Relaxed)
}

/// Installs the global tracing subscriber
///
/// Filtering follows `RUST_LOG`, defaulting to `debug` in debug mode and
/// `info` otherwise. Events go to stderr; in debug mode they are also written
/// to a daily-rolling file in `config.log_dir`. Later calls are no-ops.
pub fn init_tracing(config: &AppConfig) -> Result<(), AppError> {
    TRACING.get_or_try_init(|| install_subscriber(config))?;
    Ok(())
}

fn install_subscriber(config: &AppConfig) -> Result<Option<WorkerGuard>, AppError> {
    let default_level = if config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = if config.debug {
        std::fs::create_dir_all(&config.log_dir).map_err(|source| AppError::IoError {
            path: config.log_dir.display().to_string(),
            source,
        })?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, "passwordsaver.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_ansi(false).with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Other {
            message: "Failed to install tracing subscriber".to_string(),
            source: Some(e.into()),
        })?;

    Ok(guard)
}

/// Writes a debug log entry to the log file
///
/// # Arguments
/// * `level` - Log level: "INFO", "WARN", "ERROR", "DEBUG"
/// * `category` - Log category for grouping related messages
/// * `message` - The main log message
/// * `error_details` - Optional additional details for debugging
pub fn debug_log(level: &str, category: &str, message: &str, error_details: Option<&str>) {
    if !is_debug_mode() {
        return;
    }

    if let Err(e) = paths::app_data_dir() {
        eprintln!("Failed to create debug log directory: {}", e);
        return;
    }

    let log_file = paths::debug_log_path();

    if let Err(e) = write_debug_entry(&log_file, level, category, message, error_details) {
        eprintln!("Failed to write to debug log file {:?}: {}", log_file, e);
    }
}

fn write_debug_entry(
    log_file: &Path,
    level: &str,
    category: &str,
    message: &str,
    error_details: Option<&str>,
) -> std::io::Result<()> {
    let is_new_file = !log_file.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(log_file)?;

    if is_new_file {
        write_log_header(&mut file)?;
    }

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
    let mut log_entry = format!(
        "\n{} {} [{:8}] [{}]\n",
        timestamp,
        get_level_indicator(level),
        level,
        category
    );
    log_entry.push_str(&format!("Message: {}\n", message));

    if let Some(details) = error_details {
        log_entry.push_str(&format!("Details: {}\n", details));
    }

    if category == "CREDENTIALS" {
        log_entry.push_str("Credential Storage: Windows Credential Manager\n");
    }

    if level == "ERROR" {
        add_error_troubleshooting(&mut log_entry, category);
    }

    log_entry.push_str(&format!("{}\n", "-".repeat(80)));
    write!(file, "{}", log_entry)
}

fn write_log_header(file: &mut std::fs::File) -> std::io::Result<()> {
    writeln!(file, "{}", "=".repeat(80))?;
    writeln!(file, "PasswordSaver Debug Log")?;
    writeln!(file, "{}", "=".repeat(80))?;
    writeln!(file, "Generated when running with --debug or PASSWORDSAVER_DEBUG=1.")?;
    writeln!(file)?;
    writeln!(file, "Log Levels:")?;
    writeln!(file, "  - INFO:  General informational messages")?;
    writeln!(file, "  - WARN:  Warning messages that may require attention")?;
    writeln!(file, "  - ERROR: Error messages indicating failures")?;
    writeln!(file, "  - DEBUG: Detailed debugging information")?;
    writeln!(file)?;
    writeln!(file, "{}", "=".repeat(80))?;
    writeln!(file)?;
    Ok(())
}

fn get_level_indicator(level: &str) -> &'static str {
    match level {
        "ERROR" => "[!]",
        "WARN" => "[*]",
        "INFO" => "[i]",
        "DEBUG" => "[d]",
        _ => "[?]",
    }
}

fn add_error_troubleshooting(log_entry: &mut String, category: &str) {
    log_entry.push_str("\nPossible Causes:\n");
    match category {
        "CREDENTIALS" => {
            log_entry.push_str("  • Windows Credential Manager access denied\n");
            log_entry.push_str("  • No logon session available for the vault\n");
            log_entry.push_str("  • Credential storage is corrupted\n");
            log_entry.push_str("\nTroubleshooting Steps:\n");
            log_entry.push_str("  1. Check Windows Credential Manager (Control Panel > Credential Manager)\n");
            log_entry.push_str("  2. Look for entries under the application's short-name prefix\n");
            log_entry.push_str("  3. Try removing and re-adding the credential\n");
        }
        _ => {
            log_entry.push_str("  • Check system event logs for more details\n");
            log_entry.push_str("  • Verify application has necessary permissions\n");
        }
    }
}
