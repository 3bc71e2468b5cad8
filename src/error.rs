use thiserror::Error;

use crate::kind::RequestKind;

/// Boxed error used for handler failures and wrapper kinds.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors a pipeline can return from `dispatch`.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request was absent. Fatal to the call, never retried.
    #[error("{kind} request `{request}` is null")]
    MissingRequest {
        /// Which pipeline rejected the call
        kind: RequestKind,
        /// Unqualified request type name
        request: &'static str,
    },

    /// One or more validators rejected the request.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A validation failure re-raised as the configured wrapper kind.
    ///
    /// The wrapper's `source()` is the original [`ValidationError`].
    #[error("{0}")]
    Wrapped(#[source] BoxError),

    /// No handler is registered for the request type.
    #[error("no handler registered for `{0}`")]
    HandlerNotFound(&'static str),

    /// The handler returned an error.
    #[error("handler for `{request}` failed: {source}")]
    Handler {
        /// Unqualified request type name
        request: &'static str,
        /// The handler's error
        #[source]
        source: BoxError,
    },

    /// The cancellation token fired before dispatch completed.
    #[error("dispatch of `{0}` was cancelled")]
    Cancelled(&'static str),

    /// The reply did not hold the request's output type.
    #[error("expected a `{expected}` response, got `{actual}`")]
    UnexpectedResponse {
        /// The request's declared output type
        expected: &'static str,
        /// The type actually returned
        actual: &'static str,
    },

    /// The pipeline was misconfigured.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DispatchError {
    /// Returns the validation failure, whether raised directly or wrapped.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            DispatchError::Validation(err) => Some(err),
            DispatchError::Wrapped(wrapper) => std::error::Error::source(wrapper.as_ref())?
                .downcast_ref::<ValidationError>(),
            DispatchError::Config(ConfigError::UnconstructibleWrapper { cause, .. }) => Some(cause),
            _ => None,
        }
    }

    /// Borrows the wrapper error as `W`, if this is a wrapped failure of that kind.
    pub fn wrapped<W: std::error::Error + 'static>(&self) -> Option<&W> {
        match self {
            DispatchError::Wrapped(wrapper) => wrapper.downcast_ref::<W>(),
            _ => None,
        }
    }
}

/// The aggregated failures of every validator registered for one request.
///
/// Command and query failures share this one type. Callers that handle them
/// differently must check [`kind`](Self::kind) (or
/// [`is_command`](Self::is_command) / [`is_query`](Self::is_query)); the
/// type alone does not tell them apart.
///
/// # Examples
///
/// ```
/// use dispatch_decorators::{RequestKind, ValidationError};
///
/// let failure = ValidationError::new(
///     RequestKind::Query,
///     "FindUser",
///     vec!["NotEmpty - id - id is required".to_string()],
/// );
///
/// match failure.kind() {
///     RequestKind::Command => unreachable!("raised by the query pipeline"),
///     RequestKind::Query => assert!(failure.is_query() && !failure.is_command()),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} `{request}` failed validation: {}", .errors.join("; "))]
pub struct ValidationError {
    kind: RequestKind,
    request: &'static str,
    errors: Vec<String>,
}

impl ValidationError {
    /// Creates a validation failure from rendered failure lines.
    pub fn new(kind: RequestKind, request: &'static str, errors: Vec<String>) -> Self {
        Self {
            kind,
            request,
            errors,
        }
    }

    /// Returns which pipeline raised the failure.
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Returns `true` for a command validation failure.
    pub fn is_command(&self) -> bool {
        self.kind == RequestKind::Command
    }

    /// Returns `true` for a query validation failure.
    pub fn is_query(&self) -> bool {
        self.kind == RequestKind::Query
    }

    /// Returns the unqualified request type name.
    pub fn request(&self) -> &'static str {
        self.request
    }

    /// Returns every failure line in validator-then-field order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// Configuration errors, surfaced on first use.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A wrapper kind was named but no constructor is registered for it.
    #[error("wrapper failure kind `{name}` cannot be constructed")]
    UnconstructibleWrapper {
        /// The configured wrapper name
        name: String,
        /// The validation failure that could not be wrapped
        #[source]
        cause: ValidationError,
    },

    /// The pipeline configuration could not be parsed.
    #[error("invalid pipeline configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
