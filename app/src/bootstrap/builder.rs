//! Declarative application builder API.
//!
//! Initialization is a fixed sequence of fallible steps:
//! 1. Configure (config, tracing)
//! 2. Install observability (metrics recorder)
//! 3. Wire collaborators (ports, template folder)
//! 4. Build the workflow engine
//!
//! # Example
//!
//! ```rust,ignore
//! let app = ApplicationBuilder::new()
//!     .with_config(Config::from_env()?)
//!     .with_tracing()?
//!     .with_metrics()?
//!     .with_ports(ports)
//!     .build()?;
//!
//! let ticket_id = app.engine().create_ticket(new_ticket).await?;
//! ```

use crate::config::Config;
use crate::error::AppError;
use crate::templates::FsTemplateSource;
use crm_core::environment::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crm_core::ports::WorkflowPorts;
use crm_runtime::metrics::MetricsServer;
use crm_runtime::{WorkflowEngine, WorkflowEnvironment};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Builder for a fully wired [`Application`].
///
/// Each step checks that the steps it depends on already ran and fails with
/// [`AppError::Builder`] otherwise.
pub struct ApplicationBuilder {
    config: Option<Arc<Config>>,
    ports: Option<WorkflowPorts>,
    metrics: Option<MetricsServer>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    /// Create a builder using the wall clock and UUID identifiers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: None,
            ports: None,
            metrics: None,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
        }
    }

    /// Set application configuration.
    ///
    /// This should be called first, as other steps depend on the configuration.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(Arc::new(config));
        self
    }

    /// Setup tracing with the configured filter.
    ///
    /// # Errors
    ///
    /// Returns error if config is not set, the filter does not parse, or a
    /// global subscriber is already installed.
    pub fn with_tracing(self) -> Result<Self, AppError> {
        let config = self
            .config
            .as_ref()
            .ok_or(AppError::Builder("config must be set before tracing"))?;

        let filter = EnvFilter::try_new(&config.log_filter)
            .map_err(|e| AppError::Tracing(e.to_string()))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| AppError::Tracing(e.to_string()))?;

        Ok(self)
    }

    /// Install the Prometheus recorder when `metrics_enabled` is set.
    ///
    /// # Errors
    ///
    /// Returns error if config is not set or the recorder cannot be installed.
    pub fn with_metrics(mut self) -> Result<Self, AppError> {
        let config = self
            .config
            .as_ref()
            .ok_or(AppError::Builder("config must be set before metrics"))?;

        if config.metrics_enabled {
            let mut server = MetricsServer::new(config.metrics_addr);
            server.start()?;
            self.metrics = Some(server);
        } else {
            tracing::debug!("Metrics disabled");
        }

        Ok(self)
    }

    /// Set the collaborator ports.
    ///
    /// The template port is replaced at build time by a filesystem source over
    /// the configured report folder.
    #[must_use]
    pub fn with_ports(mut self, ports: WorkflowPorts) -> Self {
        self.ports = Some(ports);
        self
    }

    /// Replace the clock and identifier source.
    #[must_use]
    pub fn with_environment(mut self, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        self.clock = clock;
        self.ids = ids;
        self
    }

    /// Build the application.
    ///
    /// # Errors
    ///
    /// Returns error if config or ports are not set.
    pub fn build(self) -> Result<Application, AppError> {
        let config = self
            .config
            .ok_or(AppError::Builder("config must be set before build"))?;
        let mut ports = self
            .ports
            .ok_or(AppError::Builder("ports must be set before build"))?;

        ports.templates = Arc::new(FsTemplateSource::new(config.report_folder.clone()));
        let registry = config.registry();
        tracing::info!(
            report_folder = %config.report_folder.display(),
            templates = registry.len(),
            metrics = config.metrics_enabled,
            "Application configured"
        );

        let engine = WorkflowEngine::new(
            ports,
            registry,
            WorkflowEnvironment::new(self.clock, self.ids),
        );

        Ok(Application {
            config,
            engine,
            metrics: self.metrics,
        })
    }
}

/// A configured service: the workflow engine plus its observability handles.
pub struct Application {
    config: Arc<Config>,
    engine: WorkflowEngine,
    metrics: Option<MetricsServer>,
}

impl Application {
    /// Configuration the application was built from.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The workflow engine.
    #[must_use]
    pub const fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    /// Current metrics in Prometheus text format, when enabled.
    #[must_use]
    pub fn render_metrics(&self) -> Option<String> {
        self.metrics.as_ref().and_then(MetricsServer::render)
    }

    /// Address the host server should expose [`Application::render_metrics`]
    /// on, when metrics are enabled. This crate does not bind it.
    #[must_use]
    pub fn metrics_addr(&self) -> Option<SocketAddr> {
        self.metrics.as_ref().map(MetricsServer::addr)
    }
}
