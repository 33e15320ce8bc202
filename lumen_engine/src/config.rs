/// Engine and backend configuration

use glam::Vec4;
use crate::log::LogSeverity;

/// Which validation layer messages reach the engine log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything including verbose and info messages
    All,
}

/// Configuration shared by the context, the window surface and the app
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name (passed to the driver)
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Clear color of the swapchain render pass (RGBA)
    pub clear_color: Vec4,
    /// Filter applied to validation layer messages
    pub debug_severity: DebugSeverity,
    /// Minimum severity forwarded to the engine logger
    pub log_severity: LogSeverity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Lumen Application".to_string(),
            app_version: (1, 0, 0),
            enable_validation: cfg!(debug_assertions),
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            log_severity: LogSeverity::Debug,
        }
    }
}
