//! # CRM Core
//!
//! Core traits and types for the support CRM ticket workflow.
//!
//! This crate holds everything the workflow needs to *decide* what happens to a
//! ticket, and nothing that performs I/O:
//!
//! - **Domain**: tickets, comments, attachments and the entities a report pulls in
//! - **Patch**: partial-merge updates as a value type
//! - **Ports**: collaborator traits (stores, lookups, blob download, templates)
//! - **Reducer**: pure `(State, Action, Environment) → Effects` decisions
//! - **Environment**: injected clock and identifier generation
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Explicit Effects (no hidden I/O in reducers)
//! - Dependency Injection via ports and Environment
//!
//! ## Example
//!
//! ```
//! use crm_core::domain::{Ticket, TicketStatus};
//! use crm_core::patch::TicketPatch;
//! # use crm_core::domain::{NewTicket, NewProduct, TicketId, TenantId, CustomerId, Region};
//! # use chrono::Utc;
//! # let new_ticket = NewTicket {
//! #     tenant_id: TenantId::new("tenant-1"),
//! #     customer_id: CustomerId::new("customer-1"),
//! #     origin_channel: "email".to_string(),
//! #     ticket_type: "claim".to_string(),
//! #     subject: "Broken screen".to_string(),
//! #     due_date: None,
//! #     external_reference: "REF-1".to_string(),
//! #     created_by: "agent".to_string(),
//! #     product: NewProduct::default(),
//! # };
//! let ticket = Ticket::new(TicketId::new("T1"), &new_ticket, Region::UNKNOWN, Utc::now());
//!
//! let updated = TicketPatch::new("operator")
//!     .with_status(TicketStatus::Ongoing)
//!     .apply(ticket, Utc::now());
//!
//! assert_eq!(updated.status, TicketStatus::Ongoing);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

pub mod domain;
pub mod error;
pub mod patch;
pub mod ports;

/// Reducer module - the core trait for workflow decisions
///
/// Reducers are pure functions: `(State, Action, Environment) → Effects`.
///
/// They contain the business rules, are deterministic, and never await. The
/// effects they return are descriptions that an async shell executes in order.
pub mod reducer {
    use crate::error::CrmError;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    /// - `Effect`: The side-effect descriptions this reducer emits
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for TicketWorkflowReducer {
    ///     type State = Ticket;
    ///     type Action = TicketCommand;
    ///     type Environment = WorkflowEnvironment;
    ///     type Effect = WorkflowEffect;
    ///
    ///     fn reduce(
    ///         &self,
    ///         ticket: &mut Ticket,
    ///         action: TicketCommand,
    ///         env: &WorkflowEnvironment,
    ///     ) -> Result<SmallVec<[WorkflowEffect; 4]>, CrmError> {
    ///         // Business rules here
    ///         Ok(smallvec![WorkflowEffect::PersistTicket])
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// The effect descriptions this reducer returns
        type Effect;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// # Errors
        ///
        /// Returns [`CrmError::Validation`] when the action is not acceptable
        /// for the current state. State is left untouched in that case.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Result<SmallVec<[Self::Effect; 4]>, CrmError>;
    }
}

/// Environment module - Dependency injection traits
///
/// All time and identity sources are abstracted behind traits and injected,
/// so production uses the wall clock and UUIDs while tests use fixed values.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use crm_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let _now = clock.now();
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock in UTC.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Source of fresh identifiers for new records.
    pub trait IdGenerator: Send + Sync {
        /// Produce a new, never-before-returned identifier.
        fn next_id(&self) -> String;
    }

    /// Random UUID v4 identifiers.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UuidGenerator;

    impl IdGenerator for UuidGenerator {
        fn next_id(&self) -> String {
            uuid::Uuid::new_v4().to_string()
        }
    }
}
