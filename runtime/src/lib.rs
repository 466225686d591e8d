//! # CRM Runtime
//!
//! Runtime for the support CRM: executes workflow decisions and produces
//! report documents.
//!
//! ## Core Components
//!
//! - **Workflow**: the pure [`TicketWorkflowReducer`] and its commands/effects
//! - **Engine**: [`WorkflowEngine`], the async shell that fetches tickets,
//!   runs the reducer and executes effects in order
//! - **Aggregator**: concurrent fetch of the five report sources
//! - **Assembler**: comment buckets, placeholder values and rendering
//! - **Template**: single-pass placeholder substitution inside DOCX packages
//! - **Metrics**: Prometheus counters and histograms
//!
//! ## Example
//!
//! ```ignore
//! use crm_runtime::{TemplateRegistry, WorkflowEngine, WorkflowEnvironment};
//!
//! let engine = WorkflowEngine::new(ports, TemplateRegistry::default(), environment);
//!
//! let ticket_id = engine.create_ticket(new_ticket).await?;
//! let document = engine.generate_report(&ticket_id).await?;
//! std::fs::write(format!("{}.docx", document.filename), &document.content)?;
//! ```

pub mod aggregator;
pub mod assembler;
pub mod engine;
pub mod metrics;
pub mod template;
pub mod workflow;

pub use aggregator::{ReportAggregator, ReportSnapshot};
pub use assembler::{DocumentAssembler, ReportDocument};
pub use engine::WorkflowEngine;
pub use template::{Substitutions, Template, TemplateRegistry, Value};
pub use workflow::{TicketCommand, TicketWorkflowReducer, WorkflowEffect, WorkflowEnvironment};
