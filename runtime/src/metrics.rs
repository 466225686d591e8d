//! Prometheus metrics for the ticket workflow and report pipeline.
//!
//! Recording goes through the `metrics` facade and is a no-op until a recorder
//! is installed. [`MetricsServer`] installs the Prometheus recorder:
//! - Workflow transitions and derived comments
//! - Report generation outcomes, size and latency
//! - Aggregation failures per source
//!
//! # Example
//!
//! ```rust,no_run
//! use crm_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! if let Some(text) = server.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use crm_core::domain::CommentType;
use crm_core::error::{CrmError, ErrorKind, ReportSource};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics recorder handle.
///
/// Installs the recorder only; nothing here binds `addr`. The embedding HTTP
/// server is expected to listen on [`MetricsServer::addr`] and answer scrapes
/// with [`MetricsServer::render`] (exposed as `Application::render_metrics`).
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Address the embedding server should serve scrapes on. Not bound here.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// A recorder can only be installed once per process. A second call (e.g.
    /// from another test) logs a warning and leaves `handle` unset.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .set_buckets_for_metric(
                Matcher::Full("crm_report_render_bytes".to_string()),
                &[1_024.0, 16_384.0, 131_072.0, 1_048_576.0, 8_388_608.0, 33_554_432.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed, scrape address left to the host server");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        "crm_workflow_transitions_total",
        "Total number of ticket workflow operations applied"
    );
    describe_counter!(
        "crm_workflow_comments_derived_total",
        "Total number of comments derived from status changes"
    );
    describe_counter!(
        "crm_reports_generated_total",
        "Total number of report documents rendered"
    );
    describe_counter!(
        "crm_reports_failed_total",
        "Total number of failed report requests"
    );
    describe_counter!(
        "crm_aggregation_failures_total",
        "Total number of failed report source fetches"
    );
    describe_histogram!("crm_report_render_bytes", "Size of rendered report documents");
    describe_histogram!(
        "crm_report_duration_seconds",
        "Time taken to aggregate and render a report"
    );
}

/// Workflow metrics recorder.
pub struct WorkflowMetrics;

impl WorkflowMetrics {
    /// Record an applied workflow operation.
    pub fn record_transition(operation: &'static str) {
        counter!("crm_workflow_transitions_total", "operation" => operation).increment(1);
    }

    /// Record a comment derived from a status change.
    pub fn record_derived_comment(comment_type: CommentType) {
        counter!("crm_workflow_comments_derived_total", "comment_type" => comment_type.as_str())
            .increment(1);
    }
}

/// Report pipeline metrics recorder.
pub struct ReportMetrics;

impl ReportMetrics {
    /// Record a rendered report.
    #[allow(clippy::cast_precision_loss)] // Document sizes stay far below 2^52
    pub fn record_generated(size: usize, duration: Duration) {
        counter!("crm_reports_generated_total").increment(1);
        histogram!("crm_report_render_bytes").record(size as f64);
        histogram!("crm_report_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a failed report request, labelled by error category.
    pub fn record_failure(error: &CrmError) {
        let reason = match error.kind() {
            ErrorKind::BadInput => "bad_input",
            ErrorKind::Missing => "missing",
            ErrorKind::CannotRender => "cannot_render",
            ErrorKind::Upstream => "upstream",
        };
        counter!("crm_reports_failed_total", "reason" => reason).increment(1);
    }

    /// Record a failed source fetch.
    pub fn record_aggregation_failure(source: ReportSource) {
        counter!("crm_aggregation_failures_total", "source" => source.as_str()).increment(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_server_creation() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.handle().is_none());
        assert_eq!(server.addr(), addr);
    }

    #[test]
    fn test_metrics_server_render() {
        let mut server = MetricsServer::new("127.0.0.1:0".parse().unwrap());
        server.start().unwrap();

        WorkflowMetrics::record_transition("change_status");
        WorkflowMetrics::record_derived_comment(CommentType::Content);
        ReportMetrics::record_generated(2_048, Duration::from_millis(40));
        ReportMetrics::record_failure(&CrmError::validation("ticket_id is required"));
        ReportMetrics::record_aggregation_failure(ReportSource::Lead);

        // Another test in the same process may have installed the recorder first.
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("crm_workflow_transitions_total"));
            assert!(rendered.contains("crm_reports_generated_total"));
            assert!(rendered.contains("crm_aggregation_failures_total"));
        }
    }
}
