//! Конфигурация виджетов, объявленная сервером в разметке страницы.
//!
//! A mount point looks like
//! `<div data-omaum-widget="cascading-select" data-omaum-config='{"endpoint": "/turmas-por-curso/"}'>`.
//! Page-wide settings come from `<script type="application/json" id="omaum-config">`.

use contracts::shared::endpoint::Endpoint;
use serde::Deserialize;
use thiserror::Error;

use crate::shared::debounce::DEFAULT_DEBOUNCE_MS;
use crate::shared::http::adapter::DEFAULT_CSRF_FIELD;
use crate::shared::messages;

pub const WIDGET_ATTR: &str = "data-omaum-widget";
pub const CONFIG_ATTR: &str = "data-omaum-config";
pub const PAGE_SETTINGS_ID: &str = "omaum-config";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown widget kind '{0}'")]
    UnknownKind(String),
    #[error("widget '{0}' requires data-omaum-config")]
    Missing(String),
    #[error("invalid config for '{kind}': {reason}")]
    Invalid { kind: String, reason: String },
}

/// Page-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    pub log_level: Option<String>,
    pub base_url: String,
    pub csrf_field: String,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            log_level: None,
            base_url: String::new(),
            csrf_field: DEFAULT_CSRF_FIELD.to_string(),
        }
    }
}

impl PageSettings {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Invalid {
            kind: PAGE_SETTINGS_ID.to_string(),
            reason: e.to_string(),
        })
    }

    /// Debug builds log everything unless the page says otherwise
    pub fn log_level(&self) -> log::Level {
        let fallback = if cfg!(debug_assertions) {
            log::Level::Debug
        } else {
            log::Level::Info
        };
        self.log_level
            .as_deref()
            .and_then(|level| level.parse().ok())
            .unwrap_or(fallback)
    }
}

/// What happens when the parent is reset to its empty value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentEmptyPolicy {
    /// Sentinel only, no request
    #[default]
    Clear,
    /// One request without the parent parameter (never `curso_id=`)
    FetchUnfiltered,
}

/// What the child shows while its options are loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildClearPolicy {
    /// Reset to the sentinel immediately
    Clear,
    /// Keep the old options but disable the control
    #[default]
    Disable,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CascadingConfig {
    #[serde(default = "default_parent")]
    pub parent: String,
    #[serde(default = "default_child")]
    pub child: String,
    pub endpoint: String,
    #[serde(default = "default_param")]
    pub param: String,
    #[serde(default = "default_sentinel")]
    pub sentinel_label: String,
    #[serde(default = "default_empty_message")]
    pub empty_message: String,
    #[serde(default)]
    pub on_parent_empty: ParentEmptyPolicy,
    #[serde(default)]
    pub on_parent_change: ChildClearPolicy,
}

impl CascadingConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            parent: default_parent(),
            child: default_child(),
            endpoint: endpoint.into(),
            param: default_param(),
            sentinel_label: default_sentinel(),
            empty_message: default_empty_message(),
            on_parent_empty: ParentEmptyPolicy::default(),
            on_parent_change: ChildClearPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResultsConfig {
    /// Filter form; when absent the mount element itself or its first `<form>`
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default = "default_results")]
    pub results: String,
    #[serde(default)]
    pub footer: Option<String>,
    /// Extra loading indicator rendered by the page, toggled with `hidden`
    #[serde(default)]
    pub loading: Option<String>,
    pub endpoint: Endpoint,
    #[serde(default = "default_debounce")]
    pub debounce_ms: u32,
    #[serde(default = "default_curso_field")]
    pub curso_field: String,
    #[serde(default = "default_turma_field")]
    pub turma_field: String,
    #[serde(default)]
    pub load_on_mount: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub form: Option<String>,
    /// Defaults to the form's `action`
    pub endpoint: Option<String>,
    pub success_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    CascadingSelect,
    FilteredResults,
    AjaxForm,
}

impl WidgetKind {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim() {
            "cascading-select" => Ok(Self::CascadingSelect),
            "filtered-results" => Ok(Self::FilteredResults),
            "ajax-form" => Ok(Self::AjaxForm),
            other => Err(ConfigError::UnknownKind(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CascadingSelect => "cascading-select",
            Self::FilteredResults => "filtered-results",
            Self::AjaxForm => "ajax-form",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetConfig {
    Cascading(CascadingConfig),
    Results(ResultsConfig),
    Form(FormConfig),
}

impl WidgetConfig {
    pub fn kind(&self) -> WidgetKind {
        match self {
            Self::Cascading(_) => WidgetKind::CascadingSelect,
            Self::Results(_) => WidgetKind::FilteredResults,
            Self::Form(_) => WidgetKind::AjaxForm,
        }
    }
}

/// Parses the attributes of one mount point
pub fn parse_widget(kind: &str, raw: Option<&str>) -> Result<WidgetConfig, ConfigError> {
    let kind = WidgetKind::parse(kind)?;
    let raw = raw.map(str::trim).filter(|r| !r.is_empty());

    let invalid = |e: serde_json::Error| ConfigError::Invalid {
        kind: kind.as_str().to_string(),
        reason: e.to_string(),
    };
    let required = || ConfigError::Missing(kind.as_str().to_string());

    match kind {
        WidgetKind::CascadingSelect => {
            let raw = raw.ok_or_else(required)?;
            serde_json::from_str(raw)
                .map(WidgetConfig::Cascading)
                .map_err(invalid)
        }
        WidgetKind::FilteredResults => {
            let raw = raw.ok_or_else(required)?;
            serde_json::from_str(raw)
                .map(WidgetConfig::Results)
                .map_err(invalid)
        }
        WidgetKind::AjaxForm => match raw {
            Some(raw) => serde_json::from_str(raw).map(WidgetConfig::Form).map_err(invalid),
            None => Ok(WidgetConfig::Form(FormConfig::default())),
        },
    }
}

fn default_parent() -> String {
    "select[name=\"curso\"]".to_string()
}

fn default_child() -> String {
    "select[name=\"turma\"]".to_string()
}

fn default_param() -> String {
    "curso_id".to_string()
}

fn default_sentinel() -> String {
    messages::DEFAULT_SENTINEL.to_string()
}

fn default_empty_message() -> String {
    messages::NO_OPTIONS.to_string()
}

fn default_results() -> String {
    "[data-omaum-results]".to_string()
}

fn default_debounce() -> u32 {
    DEFAULT_DEBOUNCE_MS
}

fn default_curso_field() -> String {
    "curso".to_string()
}

fn default_turma_field() -> String {
    "turma".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::endpoint::ResponseKind;

    #[test]
    fn test_cascading_defaults() {
        let config = parse_widget("cascading-select", Some(r#"{"endpoint":"/turmas-por-curso/"}"#))
            .unwrap();
        assert_eq!(
            config,
            WidgetConfig::Cascading(CascadingConfig::new("/turmas-por-curso/"))
        );
        if let WidgetConfig::Cascading(c) = config {
            assert_eq!(c.sentinel_label, "Todas as turmas");
            assert_eq!(c.param, "curso_id");
            assert_eq!(c.on_parent_empty, ParentEmptyPolicy::Clear);
            assert_eq!(c.on_parent_change, ChildClearPolicy::Disable);
        }
    }

    #[test]
    fn test_cascading_policies() {
        let config = parse_widget(
            "cascading-select",
            Some(r#"{"endpoint":"/t/","on_parent_empty":"fetch_unfiltered","on_parent_change":"clear","sentinel_label":"Selecione"}"#),
        )
        .unwrap();
        let WidgetConfig::Cascading(c) = config else {
            panic!("expected cascading config");
        };
        assert_eq!(c.on_parent_empty, ParentEmptyPolicy::FetchUnfiltered);
        assert_eq!(c.on_parent_change, ChildClearPolicy::Clear);
        assert_eq!(c.sentinel_label, "Selecione");
    }

    #[test]
    fn test_results_config() {
        let config = parse_widget(
            "filtered-results",
            Some(r##"{"endpoint":{"url":"/alunos/","response":"html"},"footer":"#rodape"}"##),
        )
        .unwrap();
        let WidgetConfig::Results(r) = config else {
            panic!("expected results config");
        };
        assert_eq!(r.endpoint.response, ResponseKind::Html);
        assert_eq!(r.debounce_ms, 500);
        assert_eq!(r.results, "[data-omaum-results]");
        assert_eq!(r.footer.as_deref(), Some("#rodape"));
        assert!(!r.load_on_mount);
    }

    #[test]
    fn test_form_config_is_optional() {
        let config = parse_widget("ajax-form", None).unwrap();
        assert_eq!(config, WidgetConfig::Form(FormConfig::default()));
        assert_eq!(config.kind(), WidgetKind::AjaxForm);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_widget("select2", None),
            Err(ConfigError::UnknownKind("select2".to_string()))
        );
        assert_eq!(
            parse_widget("cascading-select", Some("  ")),
            Err(ConfigError::Missing("cascading-select".to_string()))
        );
        assert!(matches!(
            parse_widget("filtered-results", Some(r#"{"results":"x"}"#)),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_page_settings() {
        let settings = PageSettings::parse(r#"{"log_level":"warn","base_url":"/app"}"#).unwrap();
        assert_eq!(settings.log_level(), log::Level::Warn);
        assert_eq!(settings.base_url, "/app");
        assert_eq!(settings.csrf_field, "csrfmiddlewaretoken");
    }
}
