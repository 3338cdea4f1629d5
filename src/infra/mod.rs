//! Infrastructure module - logging, paths, configuration

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{current_user_name, AppConfig};
pub use logging::{debug_log, init_tracing, is_debug_mode, set_debug_mode};
