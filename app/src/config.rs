//! Configuration management for the support CRM service.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::AppError;
use crm_runtime::TemplateRegistry;
use crm_runtime::template::DEFAULT_TEMPLATES;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default directory holding report templates
pub const DEFAULT_REPORT_FOLDER: &str = "resources/reports";

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "support_crm=info,crm_runtime=info";

/// Default Prometheus scrape address
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:9090";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory report templates are read from (`REPORT_FOLDER`)
    pub report_folder: PathBuf,
    /// Company name to template file, built-ins merged with `REPORT_TEMPLATES`
    pub templates: BTreeMap<String, String>,
    /// Tracing filter directives (`RUST_LOG`)
    pub log_filter: String,
    /// Install the Prometheus recorder (`METRICS_ENABLED`)
    pub metrics_enabled: bool,
    /// Scrape address handed to the host HTTP server (`METRICS_ADDR`).
    /// Never bound by this crate; serve `Application::render_metrics` there.
    pub metrics_addr: SocketAddr,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when `REPORT_TEMPLATES` contains an entry
    /// that is not `company=file`, or `METRICS_ENABLED`/`METRICS_ADDR` cannot
    /// be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut templates: BTreeMap<String, String> = DEFAULT_TEMPLATES
            .into_iter()
            .map(|(company, file)| (company.to_string(), file.to_string()))
            .collect();
        if let Some(extra) = var("REPORT_TEMPLATES") {
            templates.extend(parse_templates(&extra)?);
        }

        let metrics_enabled = match var("METRICS_ENABLED") {
            Some(value) => value.trim().parse::<bool>().map_err(|_| AppError::Config {
                key: "METRICS_ENABLED",
                reason: format!("expected true or false, got {value:?}"),
            })?,
            None => false,
        };

        let metrics_addr: SocketAddr = var("METRICS_ADDR")
            .unwrap_or_else(|| DEFAULT_METRICS_ADDR.to_string())
            .trim()
            .parse()
            .map_err(|e: std::net::AddrParseError| AppError::Config {
                key: "METRICS_ADDR",
                reason: e.to_string(),
            })?;

        Ok(Self {
            report_folder: var("REPORT_FOLDER")
                .map_or_else(|| PathBuf::from(DEFAULT_REPORT_FOLDER), PathBuf::from),
            templates,
            log_filter: var("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            metrics_enabled,
            metrics_addr,
        })
    }

    /// Template registry for the configured mapping.
    #[must_use]
    pub fn registry(&self) -> TemplateRegistry {
        let mut registry = TemplateRegistry::empty();
        registry.extend(self.templates.iter().map(|(company, file)| (company.as_str(), file.as_str())));
        registry
    }
}

/// Parse `"company=file,company=file"`.
fn parse_templates(raw: &str) -> Result<Vec<(String, String)>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (company, file) = entry
                .split_once('=')
                .map(|(company, file)| (company.trim(), file.trim()))
                .filter(|(company, file)| !company.is_empty() && !file.is_empty())
                .ok_or_else(|| AppError::Config {
                    key: "REPORT_TEMPLATES",
                    reason: format!("expected company=file, got {entry:?}"),
                })?;
            Ok((company.to_string(), file.to_string()))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.report_folder, PathBuf::from("resources/reports"));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert!(!config.metrics_enabled);
        assert_eq!(config.metrics_addr.port(), 9090);
        assert_eq!(
            config.templates.get("sample").map(String::as_str),
            Some("sample_template.docx")
        );
    }

    #[test]
    fn test_extra_templates_merge_over_defaults() {
        let config = config_from(&[(
            "REPORT_TEMPLATES",
            " globex = globex.docx ,sample=sample_v2.docx,",
        )])
        .unwrap();

        let registry = config.registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("globex").unwrap(), "globex.docx");
        assert_eq!(registry.resolve("sample").unwrap(), "sample_v2.docx");
    }

    #[test]
    fn test_malformed_template_entry_is_rejected() {
        let error = config_from(&[("REPORT_TEMPLATES", "globex")]).unwrap_err();
        assert!(matches!(
            error,
            AppError::Config {
                key: "REPORT_TEMPLATES",
                ..
            }
        ));

        assert!(config_from(&[("REPORT_TEMPLATES", "=file.docx")]).is_err());
    }

    #[test]
    fn test_metrics_settings() {
        let config = config_from(&[
            ("METRICS_ENABLED", "true"),
            ("METRICS_ADDR", "127.0.0.1:9900"),
        ])
        .unwrap();
        assert!(config.metrics_enabled);
        assert_eq!(config.metrics_addr, "127.0.0.1:9900".parse().unwrap());

        assert!(config_from(&[("METRICS_ENABLED", "yes")]).is_err());
        assert!(config_from(&[("METRICS_ADDR", "nowhere")]).is_err());
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = config_from(&[("REPORT_FOLDER", "  "), ("RUST_LOG", "")]).unwrap();
        assert_eq!(config.report_folder, PathBuf::from(DEFAULT_REPORT_FOLDER));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_config_serializes() {
        let config = config_from(&[("REPORT_FOLDER", "/srv/templates")]).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
