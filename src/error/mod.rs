//! Error module for the placement engine.
//!
//! Each component owns a `thiserror` enum; this module ties them together in
//! [`EngineError`] and offers a small reporting layer for the binary and for
//! embedders that want errors routed somewhere other than a return value.

use std::fmt::{Display, Formatter};
use thiserror::Error;

pub mod config;

pub use crate::data_structures::placement_graph::PlacementError;

/// Result type alias used at the application level.
pub type EngineResult<T> = Result<T, EngineError>;

/// Top-level error of the placement engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Errors occurring during configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Errors raised by the placement graph, search, or transactions.
    #[error("Placement error: {0}")]
    Placement(#[from] PlacementError),

    /// IO errors that may occur during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors when emitting reports.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Custom error with message for cases where specific error types are not defined.
    #[error("{0}")]
    Custom(String),
}

impl EngineError {
    /// Returns whether the caller can continue after this error.
    ///
    /// Only a placement miss is recoverable; everything else means the
    /// engine or its inputs are unusable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Placement(err) if err.is_recoverable())
    }
}

/// Error reporting structure to provide context and debugging information.
#[derive(Debug)]
pub struct ErrorContext {
    /// The original error that occurred.
    pub error: EngineError,

    /// The component where the error occurred.
    pub component: String,

    /// Additional context information to help with debugging.
    pub details: Option<String>,
}

impl ErrorContext {
    /// Creates a new error context with the given error and component.
    ///
    /// # Arguments
    ///
    /// * `error` - The error that occurred
    /// * `component` - The component where the error occurred
    pub fn new<S: Into<String>>(error: EngineError, component: S) -> Self {
        Self {
            error,
            component: component.into(),
            details: None,
        }
    }

    /// Adds detail information to the error context.
    pub fn with_details<S: Into<String>>(mut self, details: S) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error in {}: {}", self.component, self.error)?;
        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }
        Ok(())
    }
}

/// Error reporter trait for reporting errors to various sinks.
#[cfg_attr(test, mockall::automock)]
pub trait ErrorReporter: Send + Sync {
    /// Report an error with context.
    ///
    /// # Arguments
    ///
    /// * `context` - The error context to report
    fn report(&self, context: ErrorContext);
}

/// Reporter that logs errors through `tracing`.
#[derive(Default, Debug, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, context: ErrorContext) {
        tracing::error!(
            error = %context.error,
            component = %context.component,
            details = context.details.as_deref().unwrap_or("None"),
            recoverable = context.error.is_recoverable(),
            "Error reported"
        );
    }
}

/// Wraps `error` in a context for `component` and hands it to `reporter`.
pub fn report<E, S>(reporter: &dyn ErrorReporter, error: E, component: S)
where
    E: Into<EngineError>,
    S: Into<String>,
{
    reporter.report(ErrorContext::new(error.into(), component));
}
