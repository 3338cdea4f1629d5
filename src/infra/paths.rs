//! Path utilities for PasswordSaver
//!
//! Provides centralized path management for application data and log files.

use crate::errors::AppError;
use std::path::PathBuf;

const APP_DIR_NAME: &str = "PasswordSaver";

/// Location of the application data directory, without touching the filesystem
///
/// `%APPDATA%\PasswordSaver`, or `./PasswordSaver` if APPDATA is not set.
pub fn app_data_path() -> PathBuf {
    match std::env::var("APPDATA") {
        Ok(appdata_dir) => PathBuf::from(appdata_dir).join(APP_DIR_NAME),
        Err(_) => PathBuf::from(APP_DIR_NAME),
    }
}

/// Gets the PasswordSaver application data directory, creating it if needed.
///
/// # Returns
/// * `Ok(PathBuf)` - Path to the application data directory
/// * `Err(AppError)` - Directory could not be created
pub fn app_data_dir() -> Result<PathBuf, AppError> {
    let dir = app_data_path();
    std::fs::create_dir_all(&dir).map_err(|source| AppError::IoError {
        path: dir.display().to_string(),
        source,
    })?;
    Ok(dir)
}

/// Location of the rolling tracing logs
pub fn log_dir_path() -> PathBuf {
    app_data_path().join("logs")
}

/// Location of the categorized debug log written by `debug_log`
pub fn debug_log_path() -> PathBuf {
    app_data_path().join("PasswordSaver_Debug.log")
}
