//! # Error Handling
//!
//! Errors raised while opening the engine or programming a transform.
//!
//! ## Taxonomy
//!
//! - **Configuration errors** ([`ErrorKind::Validation`],
//!   [`ErrorKind::UnsupportedFormat`], [`ErrorKind::Config`]): detected in
//!   software before the engine lock is taken. No register has been written
//!   and retrying the same request fails the same way.
//! - **Resource errors** ([`ErrorKind::Resource`], [`ErrorKind::Io`],
//!   [`ErrorKind::RegisterBounds`]): the UIO device or its register mapping
//!   could not be obtained or used.
//! - **Hardware hang** ([`ErrorKind::Hang`]): only produced when a bounded
//!   busy-poll was configured and the engine never cleared its busy bit.
//!
//! There is no retry layer. Once reset, programmed and started the engine is
//! not idempotent, so every error is reported once, synchronously.
//!
//! ## Usage
//!
//! ```rust
//! use shveu::error::{ErrorKind, VeuError, classify};
//!
//! let error = VeuError::validation("src_width", "must be within [16, 4092]", "8")
//!     .with_operation("program_transform");
//! assert!(matches!(error.kind(), ErrorKind::Validation { .. }));
//! assert_eq!(error.category(), "validation");
//! assert!(classify::is_configuration_error(&error));
//! ```

use std::{error::Error as StdError, fmt, io};

/// How badly an error affects the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Rejected request, engine untouched
    Warning,
    /// Operation failed, handle still usable
    Error,
    /// The handle cannot be used
    Fatal,
}

/// Where the error surfaced and what the caller can do about it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub operation: Option<String>,
    pub hint: Option<String>,
}

/// What went wrong.
#[derive(Debug)]
pub enum ErrorKind {
    /// A transform request violates an engine restriction
    Validation {
        field: String,
        constraint: String,
        value: String,
    },
    /// Pixel format the engine cannot read or write
    UnsupportedFormat { fourcc: u32 },
    /// Invalid driver configuration
    Config {
        field: String,
        value: String,
        reason: String,
    },
    /// UIO device, register mapping or lock unavailable
    Resource { resource: String, reason: String },
    Io { operation: String, source: io::Error },
    /// Register access outside the mapped window
    RegisterBounds { offset: usize, window_size: usize },
    /// Engine stayed busy past the configured limit
    Hang { operation: String, duration_ms: u64 },
}

impl ErrorKind {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorKind::Validation { .. } | ErrorKind::UnsupportedFormat { .. } => {
                ErrorSeverity::Warning
            }
            ErrorKind::Config { .. } | ErrorKind::Io { .. } => ErrorSeverity::Error,
            ErrorKind::Resource { .. } | ErrorKind::RegisterBounds { .. } | ErrorKind::Hang { .. } => {
                ErrorSeverity::Fatal
            }
        }
    }
}

/// Error type of the VEU driver.
#[derive(Debug)]
pub struct VeuError {
    kind: ErrorKind,
    context: ErrorContext,
}

impl From<ErrorKind> for VeuError {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: ErrorContext::default(),
        }
    }
}

impl VeuError {
    pub fn validation(
        field: impl Into<String>,
        constraint: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        ErrorKind::Validation {
            field: field.into(),
            constraint: constraint.into(),
            value: value.to_string(),
        }
        .into()
    }

    pub fn unsupported_format(fourcc: u32) -> Self {
        ErrorKind::UnsupportedFormat { fourcc }.into()
    }

    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ErrorKind::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
        .into()
    }

    pub fn resource(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        ErrorKind::Resource {
            resource: resource.into(),
            reason: reason.into(),
        }
        .into()
    }

    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        ErrorKind::Io {
            operation: operation.into(),
            source,
        }
        .into()
    }

    pub fn register_bounds(offset: usize, window_size: usize) -> Self {
        ErrorKind::RegisterBounds {
            offset,
            window_size,
        }
        .into()
    }

    pub fn hang(operation: impl Into<String>, duration_ms: u64) -> Self {
        ErrorKind::Hang {
            operation: operation.into(),
            duration_ms,
        }
        .into()
    }

    /// Record the driver operation that failed.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Attach a hint for the operator.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.context.hint = Some(hint.into());
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Short machine-readable name of the error kind.
    pub fn category(&self) -> &'static str {
        match self.kind {
            ErrorKind::Validation { .. } => "validation",
            ErrorKind::UnsupportedFormat { .. } => "unsupported_format",
            ErrorKind::Config { .. } => "config",
            ErrorKind::Resource { .. } => "resource",
            ErrorKind::Io { .. } => "io",
            ErrorKind::RegisterBounds { .. } => "register_bounds",
            ErrorKind::Hang { .. } => "hang",
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.kind.severity()
    }

    pub fn hint(&self) -> Option<&str> {
        self.context.hint.as_deref()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation {
                field,
                constraint,
                value,
            } => write!(f, "invalid {field}: {constraint} (got {value})"),
            ErrorKind::UnsupportedFormat { fourcc } => write!(
                f,
                "unsupported pixel format '{}' (0x{fourcc:08x})",
                String::from_utf8_lossy(&fourcc.to_le_bytes())
            ),
            ErrorKind::Config {
                field,
                value,
                reason,
            } => write!(f, "bad config value {field} = {value:?}: {reason}"),
            ErrorKind::Resource { resource, reason } => {
                write!(f, "{resource} unavailable: {reason}")
            }
            ErrorKind::Io { operation, source } => write!(f, "{operation} failed: {source}"),
            ErrorKind::RegisterBounds {
                offset,
                window_size,
            } => write!(
                f,
                "register 0x{offset:x} lies outside the 0x{window_size:x}-byte window"
            ),
            ErrorKind::Hang {
                operation,
                duration_ms,
            } => write!(f, "engine still busy after {duration_ms}ms in {operation}"),
        }
    }
}

impl fmt::Display for VeuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(operation) = &self.context.operation {
            write!(f, "{operation}: ")?;
        }
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.context.hint {
            write!(f, " ({hint})")?;
        }
        Ok(())
    }
}

impl StdError for VeuError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type VeuResult<T> = Result<T, VeuError>;

/// Error classification helpers.
pub mod classify {
    use super::{ErrorKind, ErrorSeverity, VeuError};

    /// Rejected before the engine was touched
    pub fn is_configuration_error(error: &VeuError) -> bool {
        matches!(
            error.kind(),
            ErrorKind::Validation { .. } | ErrorKind::UnsupportedFormat { .. } | ErrorKind::Config { .. }
        )
    }

    /// The handle (or the engine) cannot be trusted afterwards
    pub fn is_fatal(error: &VeuError) -> bool {
        error.severity() == ErrorSeverity::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = VeuError::validation("src_pitch", "must be a multiple of 4 pixels", 722);
        assert_eq!(error.category(), "validation");
        assert_eq!(error.severity(), ErrorSeverity::Warning);
        assert!(classify::is_configuration_error(&error));
        assert!(!classify::is_fatal(&error));
        assert_eq!(
            error.to_string(),
            "invalid src_pitch: must be a multiple of 4 pixels (got 722)"
        );
    }

    #[test]
    fn test_context_is_rendered() {
        let error = VeuError::resource("uio device 'VEU'", "no matching device")
            .with_operation("open")
            .with_hint("load uio_pdrv_genirq");

        assert_eq!(error.context().operation.as_deref(), Some("open"));
        assert_eq!(error.hint(), Some("load uio_pdrv_genirq"));
        assert!(classify::is_fatal(&error));
        assert_eq!(
            error.to_string(),
            "open: uio device 'VEU' unavailable: no matching device (load uio_pdrv_genirq)"
        );
    }

    #[test]
    fn test_unsupported_format_shows_fourcc() {
        let error = VeuError::unsupported_format(u32::from_le_bytes(*b"YUYV"));
        assert!(error.to_string().contains("'YUYV'"));
    }

    #[test]
    fn test_io_source_is_chained() {
        let error = VeuError::io("wait for interrupt", io::Error::other("boom"));
        assert_eq!(error.category(), "io");
        assert_eq!(error.to_string(), "wait for interrupt failed: boom");
        assert!(error.source().is_some());
        assert_eq!(error.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_hang_is_fatal() {
        let error = VeuError::hang("wait_for_completion", 20);
        assert!(classify::is_fatal(&error));
        assert!(error.to_string().contains("20ms"));
    }
}
