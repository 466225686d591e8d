//! Bootstrap components for application initialization.
//!
//! Turns a [`Config`](crate::config::Config) and a set of collaborator ports
//! into a running [`Application`]: tracing, the optional Prometheus recorder,
//! the filesystem template source and the workflow engine.

pub mod builder;

pub use builder::{Application, ApplicationBuilder};
