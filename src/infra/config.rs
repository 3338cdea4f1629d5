//! Runtime configuration
//!
//! Settings come from command-line flags and environment variables; there is
//! no config file.

use crate::infra::paths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Short name used when none is configured
pub const DEFAULT_SHORT_NAME: &str = "passwordsaver";

/// Environment variable overriding the vault short name
pub const SHORT_NAME_ENV: &str = "PASSWORDSAVER_SHORT_NAME";

/// Environment variable enabling debug logging (`1` or `true`)
pub const DEBUG_ENV: &str = "PASSWORDSAVER_DEBUG";

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Prefix separating this application's keys from others in the vault
    pub short_name: String,
    /// Verbose logging plus the file-backed logs
    pub debug: bool,
    /// Directory for rolling log files
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            short_name: DEFAULT_SHORT_NAME.to_string(),
            debug: false,
            log_dir: paths::log_dir_path(),
        }
    }
}

impl AppConfig {
    /// Builds the configuration from process arguments and environment
    ///
    /// `--debug` or `--debug-log` among `args`, or `PASSWORDSAVER_DEBUG=1`,
    /// turns on debug mode.
    pub fn from_env_and_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self::from_sources(args, |key| std::env::var(key).ok())
    }

    fn from_sources<I, F>(args: I, env: F) -> Self
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let debug_arg = args
            .into_iter()
            .any(|arg| arg == "--debug" || arg == "--debug-log");
        let debug_env = env(DEBUG_ENV)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let short_name = env(SHORT_NAME_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SHORT_NAME.to_string());

        AppConfig {
            short_name,
            debug: debug_arg || debug_env,
            ..AppConfig::default()
        }
    }
}

/// Identity of the invoking OS user, used when a write names no user
pub fn current_user_name() -> String {
    std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_default()
}
