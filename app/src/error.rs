//! Application-level errors.

use crm_core::error::CrmError;
use crm_runtime::metrics::MetricsError;
use thiserror::Error;

/// Errors raised while configuring, starting or driving the service.
#[derive(Error, Debug)]
pub enum AppError {
    /// An environment variable holds an unusable value.
    #[error("invalid configuration {key}: {reason}")]
    Config {
        /// Variable name
        key: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// A builder step ran before the step it depends on.
    #[error("application builder: {0}")]
    Builder(&'static str),

    /// The tracing subscriber could not be installed.
    #[error("failed to initialize tracing: {0}")]
    Tracing(String),

    /// The metrics recorder could not be installed.
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    /// A workflow operation failed.
    #[error(transparent)]
    Crm(#[from] CrmError),

    /// Filesystem failure outside the template source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
