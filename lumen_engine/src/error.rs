//! Error types for the Lumen engine
//!
//! This module defines the error types used throughout the engine: backend
//! failures, configuration problems detected before touching the GPU, and the
//! presentation-engine conditions the window surface reacts to.

use std::fmt;

/// Result type for Lumen engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lumen engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (Vulkan driver call rejected, etc.)
    BackendError(String),

    /// Out of host or device memory
    OutOfMemory,

    /// Invalid resource (missing handle, empty list, etc.)
    InvalidResource(String),

    /// Initialization failed (context, surface, subsystems)
    InitializationFailed(String),

    /// Invalid configuration (queue family indices, missing surface)
    ///
    /// Logged and returned; the caller is expected to continue.
    InvalidConfiguration(String),

    /// The swapchain no longer matches the surface and must be recreated
    SwapchainOutOfDate,

    /// The logical device was lost; not recoverable by this engine
    DeviceLost,

    /// Operation called in the wrong lifecycle state
    InvalidState(String),
}

impl Error {
    /// True for errors the engine does not attempt to recover from
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::DeviceLost | Error::OutOfMemory)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::SwapchainOutOfDate => write!(f, "Swapchain out of date"),
            Error::DeviceLost => write!(f, "Device lost"),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
