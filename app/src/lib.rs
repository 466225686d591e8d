//! Support CRM service
//!
//! Wires the ticket workflow engine and report pipeline into a runnable
//! service:
//!
//! - **Configuration**: environment variables with defaults ([`Config`])
//! - **Templates**: report templates read from a folder ([`FsTemplateSource`])
//! - **Bootstrap**: tracing, metrics and engine construction
//!   ([`ApplicationBuilder`])
//!
//! Storage collaborators are supplied by the caller as
//! [`WorkflowPorts`](crm_core::ports::WorkflowPorts); the `demo` binary uses
//! the in-memory ports from `crm-testing`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod templates;

pub use bootstrap::{Application, ApplicationBuilder};
pub use config::Config;
pub use error::AppError;
pub use templates::FsTemplateSource;
