//! Error handling for the PulseVis-RS application
//!
//! This module defines custom error types and a Result alias for use
//! throughout the application.

use thiserror::Error;

/// Main error type for PulseVis-RS operations
#[derive(Error, Debug)]
pub enum PulseVisError {
    /// Errors reported by the serial transport layer
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// IO errors (reads, thread spawning)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The device exists but access has not been granted yet.
    /// Retryable: the caller should wait for the grant and try again.
    #[error("Device access not granted yet: {0}")]
    PermissionPending(String),

    /// No device was selected when starting acquisition
    #[error("No device selected")]
    NoDeviceSelected,

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// The sample queue has no remaining consumers
    #[error("Sample queue closed")]
    QueueClosed,

    /// The transport was closed underneath the reader
    #[error("Transport closed")]
    TransportClosed,

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PulseVisError>,
    },
}

impl PulseVisError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PulseVisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether the operation may succeed if simply retried later
    /// (e.g. once a pending permission grant completes).
    pub fn is_retryable(&self) -> bool {
        match self {
            PulseVisError::PermissionPending(_) => true,
            PulseVisError::WithContext { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

/// Result type alias for PulseVis-RS operations
pub type Result<T> = std::result::Result<T, PulseVisError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PulseVisError::Config("bad baud rate".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad baud rate");
    }

    #[test]
    fn test_error_with_context() {
        let err = PulseVisError::TransportClosed;
        let with_ctx = err.with_context("Failed to read chunk");
        assert!(with_ctx.to_string().contains("Failed to read chunk"));
    }

    #[test]
    fn test_result_ext_context() {
        let result: Result<()> = Err(PulseVisError::TransportClosed);
        let err = result.context("opening /dev/ttyUSB0").unwrap_err();
        assert_eq!(err.to_string(), "opening /dev/ttyUSB0: Transport closed");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(PulseVisError::PermissionPending("/dev/ttyUSB0".into()).is_retryable());
        assert!(PulseVisError::PermissionPending("/dev/ttyUSB0".into())
            .with_context("open")
            .is_retryable());
        assert!(!PulseVisError::QueueClosed.is_retryable());
        assert!(!PulseVisError::NoDeviceSelected.is_retryable());
    }
}
