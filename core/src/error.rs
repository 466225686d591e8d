//! Error types shared by every port and workflow operation.
//!
//! A single [`CrmError`] crosses all collaborator boundaries so errors can
//! propagate unmodified from a store to the caller. [`CrmError::kind`] folds the
//! variants into the three categories a presentation layer cares about.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Structured key/value context attached to validation and lookup errors.
pub type ErrorContext = BTreeMap<String, String>;

/// The five independent sources a report snapshot is assembled from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportSource {
    /// Customer lookup
    Customer,
    /// Product lookup
    Product,
    /// Comments by ticket
    Comments,
    /// Lead lookup
    Lead,
    /// Tenant lookup
    Tenant,
}

impl ReportSource {
    /// Stable lowercase name, used in logs and metric labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Product => "product",
            Self::Comments => "comments",
            Self::Lead => "lead",
            Self::Tenant => "tenant",
        }
    }
}

impl fmt::Display for ReportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a report document cannot be rendered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// No template is registered for the tenant's company name.
    #[error("no template found for tenant {company}")]
    NoTemplate {
        /// Tenant company name that was looked up
        company: String,
    },

    /// The template could not be read from its source.
    #[error("failed to load template {template}: {reason}")]
    Load {
        /// Template identifier
        template: String,
        /// Underlying failure
        reason: String,
    },

    /// The template body cannot be processed.
    #[error("malformed template {template}: {reason}")]
    Malformed {
        /// Template identifier
        template: String,
        /// What is wrong with it
        reason: String,
    },

    /// The rendered document could not be packaged.
    #[error("failed to write report from template {template}: {reason}")]
    Write {
        /// Template identifier
        template: String,
        /// Underlying failure
        reason: String,
    },

    /// A placeholder name does not match `$[a-z_]+`.
    #[error("invalid placeholder {placeholder:?}")]
    InvalidPlaceholder {
        /// The rejected placeholder
        placeholder: String,
    },
}

/// Presentation category of an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request itself is invalid
    BadInput,
    /// A referenced entity does not exist
    Missing,
    /// The report document cannot be produced
    CannotRender,
    /// A collaborator failed
    Upstream,
}

/// Errors surfaced by the CRM core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrmError {
    /// Missing or invalid input, or an unmet workflow precondition.
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable message
        message: String,
        /// Structured context (e.g. the offending status)
        context: ErrorContext,
    },

    /// A referenced entity is absent.
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable message
        message: String,
        /// Structured context (e.g. the missing id)
        context: ErrorContext,
    },

    /// The report document could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// One of the parallel report fetches failed.
    #[error("report aggregation failed fetching {origin}: {cause}")]
    Aggregation {
        /// Which fetch failed
        origin: ReportSource,
        /// The fetch's own error
        #[source]
        cause: Box<CrmError>,
    },

    /// Opaque collaborator failure (database, blob store, filesystem).
    #[error("storage error: {0}")]
    Storage(String),
}

impl CrmError {
    /// Validation error without context.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    /// Not-found error without context.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    /// Opaque storage failure.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Wrap a fetch failure with the source it came from.
    #[must_use]
    pub fn aggregation(origin: ReportSource, cause: Self) -> Self {
        Self::Aggregation {
            origin,
            cause: Box::new(cause),
        }
    }

    /// Attach a context entry. No-op for variants that carry no context.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        if let Self::Validation { context, .. } | Self::NotFound { context, .. } = &mut self {
            context.insert(key.into(), value.to_string());
        }
        self
    }

    /// Context entries, if this variant carries any.
    #[must_use]
    pub const fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Validation { context, .. } | Self::NotFound { context, .. } => Some(context),
            _ => None,
        }
    }

    /// The innermost error, looking through aggregation wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Aggregation { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Presentation category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            Self::Validation { .. } => ErrorKind::BadInput,
            Self::NotFound { .. } => ErrorKind::Missing,
            Self::Template(_) => ErrorKind::CannotRender,
            Self::Storage(_) | Self::Aggregation { .. } => ErrorKind::Upstream,
        }
    }

    /// True when the root cause is a missing entity.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::Missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_attached() {
        let error = CrmError::validation("ticket is not in status REPORT").with_context("status", "New");
        assert_eq!(
            error.context().and_then(|c| c.get("status")).map(String::as_str),
            Some("New")
        );
        assert_eq!(error.kind(), ErrorKind::BadInput);
    }

    #[test]
    fn test_storage_ignores_context() {
        let error = CrmError::storage("connection reset").with_context("key", "value");
        assert!(error.context().is_none());
        assert_eq!(error.kind(), ErrorKind::Upstream);
    }

    #[test]
    fn test_aggregation_sees_through_to_cause() {
        let cause = CrmError::not_found("no lead found with this id").with_context("lead_id", "L1");
        let error = CrmError::aggregation(ReportSource::Lead, cause.clone());

        assert_eq!(error.root_cause(), &cause);
        assert_eq!(error.kind(), ErrorKind::Missing);
        assert!(error.is_not_found());
        assert!(error.to_string().contains("fetching lead"));
    }

    #[test]
    fn test_template_error_is_cannot_render() {
        let error = CrmError::from(TemplateError::NoTemplate {
            company: "acme".to_string(),
        });
        assert_eq!(error.kind(), ErrorKind::CannotRender);
        assert_eq!(error.to_string(), "no template found for tenant acme");
    }
}
