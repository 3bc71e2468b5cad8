//! Decorator settings and pipeline configuration.
//!
//! Settings are plain values, snapshotted when a decorator is built and never
//! mutated afterwards. A [`PipelineConfig`] describes both chains as ordered
//! behavior lists and can be loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    kind::RequestKind,
    validation::{WrapValidation, WrapperCatalog, WrapperKind},
};

/// Toggles for the logging decorator.
///
/// Both toggles default to off: the decorator still logs the request and
/// result type names, but not their fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log every described field of the request
    pub request_logging_enabled: bool,
    /// Log every described field of the result
    pub response_logging_enabled: bool,
}

impl LogSettings {
    /// Settings with both field toggles off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings with both field toggles on.
    pub fn verbose() -> Self {
        Self {
            request_logging_enabled: true,
            response_logging_enabled: true,
        }
    }

    /// Sets the request field toggle.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging_enabled = enabled;
        self
    }

    /// Sets the result field toggle.
    pub fn with_response_logging(mut self, enabled: bool) -> Self {
        self.response_logging_enabled = enabled;
        self
    }
}

/// Settings for the validation decorator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Error type that replaces the validation failure, if any
    pub wrapper_failure_kind: Option<WrapperKind>,
}

impl ValidationSettings {
    /// Settings that surface validation failures unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps validation failures in `W`.
    pub fn with_wrapper<W: WrapValidation>(mut self) -> Self {
        self.wrapper_failure_kind = Some(WrapperKind::of::<W>());
        self
    }

    /// Wraps validation failures in the given kind.
    pub fn with_wrapper_kind(mut self, kind: WrapperKind) -> Self {
        self.wrapper_failure_kind = Some(kind);
        self
    }

    pub(crate) fn resolve(self, catalog: &WrapperCatalog) -> Self {
        Self {
            wrapper_failure_kind: self
                .wrapper_failure_kind
                .map(|kind| kind.resolve(catalog)),
        }
    }
}

/// One cross-cutting behavior in a chain.
///
/// Serialized with a `behavior` tag:
///
/// ```json
/// { "behavior": "logging", "request_logging_enabled": true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "behavior", rename_all = "snake_case")]
pub enum Behavior {
    /// Log request and result
    Logging(LogSettings),
    /// Validate the request before dispatch
    Validation(ValidationSettings),
}

impl Behavior {
    /// Returns the behavior name as used in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Behavior::Logging(_) => "logging",
            Behavior::Validation(_) => "validation",
        }
    }
}

/// Ordered behavior lists for both pipelines.
///
/// List order is composition order: the first entry wraps the base dispatcher
/// directly and the last entry is outermost.
///
/// # Examples
///
/// ```
/// use dispatch_decorators::{PipelineConfig, RequestKind};
///
/// let config = PipelineConfig::from_json(r#"{
///     "commands": [
///         { "behavior": "validation" },
///         { "behavior": "logging", "request_logging_enabled": true }
///     ]
/// }"#).unwrap();
///
/// assert_eq!(config.behaviors_for(RequestKind::Command).len(), 2);
/// assert!(config.behaviors_for(RequestKind::Query).is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Behaviors for the command pipeline
    pub commands: Vec<Behavior>,
    /// Behaviors for the query pipeline
    pub queries: Vec<Behavior>,
}

impl PipelineConfig {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the behaviors configured for one pipeline.
    pub fn behaviors_for(&self, kind: RequestKind) -> &[Behavior] {
        match kind {
            RequestKind::Command => &self.commands,
            RequestKind::Query => &self.queries,
        }
    }
}
