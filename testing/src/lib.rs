//! # CRM Testing
//!
//! Testing utilities and helpers for the support CRM.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - In-memory implementations of every collaborator port
//! - Deterministic domain fixtures
//! - In-memory DOCX packages for report templates
//! - Property-based testing strategies
//! - A Given-When-Then harness for reducers
//!
//! ## Example
//!
//! ```ignore
//! use crm_testing::{InMemoryBackend, SequentialIds, test_clock};
//! use crm_testing::fixtures::{reportable_ticket, seed_report_sources};
//!
//! #[tokio::test]
//! async fn test_report() {
//!     let backend = InMemoryBackend::new();
//!     let ticket = reportable_ticket("T1");
//!     seed_report_sources(&backend, &ticket);
//!     backend.tickets.insert(ticket);
//!
//!     let engine = WorkflowEngine::new(
//!         backend.ports(),
//!         TemplateRegistry::default(),
//!         WorkflowEnvironment::new(Arc::new(test_clock()), Arc::new(SequentialIds::new("id"))),
//!     );
//!     let report = engine.generate_report(&TicketId::new("T1")).await.unwrap();
//!     assert!(report.filename.starts_with("sample-REF-1-"));
//! }
//! ```

use chrono::{DateTime, Utc};
use crm_core::environment::{Clock, IdGenerator};

pub mod docx;
pub mod fixtures;
mod stores;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, IdGenerator, Utc};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use crm_testing::mocks::FixedClock;
    /// use crm_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Predictable identifiers: `"{prefix}-1"`, `"{prefix}-2"`, ...
    ///
    /// # Example
    ///
    /// ```
    /// use crm_testing::mocks::SequentialIds;
    /// use crm_core::environment::IdGenerator;
    ///
    /// let ids = SequentialIds::new("ticket");
    /// assert_eq!(ids.next_id(), "ticket-1");
    /// assert_eq!(ids.next_id(), "ticket-2");
    /// ```
    #[derive(Debug)]
    pub struct SequentialIds {
        prefix: String,
        next: AtomicU64,
    }

    impl SequentialIds {
        /// Start a new sequence at 1
        #[must_use]
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
                next: AtomicU64::new(1),
            }
        }
    }

    impl IdGenerator for SequentialIds {
        fn next_id(&self) -> String {
            let n = self.next.fetch_add(1, Ordering::Relaxed);
            format!("{}-{n}", self.prefix)
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a `fmt` subscriber honouring `RUST_LOG`, once per process.
    ///
    /// Later calls are no-ops, so every test may call it.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use crm_core::domain::TicketStatus;
    use proptest::prelude::*;
    use proptest::sample::select;

    /// Any ticket status
    pub fn any_status() -> impl Strategy<Value = TicketStatus> {
        select(TicketStatus::ALL.to_vec())
    }

    /// Statuses from which no report may be generated
    pub fn non_reportable_status() -> impl Strategy<Value = TicketStatus> {
        let statuses: Vec<_> = TicketStatus::ALL
            .into_iter()
            .filter(|status| !status.is_reportable())
            .collect();
        select(statuses)
    }

    /// Non-blank comment text
    pub fn comment_content() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9][a-zA-Z0-9 ]{0,40}"
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, SequentialIds, test_clock};
pub use reducer_test::{ReducerTest, assertions};
pub use stores::{
    CallLog, FailingLookup, InMemoryAttachments, InMemoryBackend, InMemoryCommentStore,
    InMemoryCustomers, InMemoryLeads, InMemoryLookup, InMemoryProducts, InMemoryTemplates,
    InMemoryTenants, InMemoryTicketStore, InMemoryUsers, Record,
};
