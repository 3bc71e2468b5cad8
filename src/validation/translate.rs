//! Mapping validation failures onto caller-chosen error types.
//!
//! Callers that do not want to expose [`ValidationError`] upstream configure a
//! wrapper kind. The wrapper carries the original message and holds the
//! original failure as its `source()`, so the failure list stays reachable.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::{BoxError, ConfigError, DispatchError, ValidationError},
    message::short_type_name,
};

/// An error type that can stand in for a [`ValidationError`].
///
/// # Examples
///
/// ```
/// use dispatch_decorators::{ValidationError, WrapValidation};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("{message}")]
/// struct BadRequest {
///     message: String,
///     #[source]
///     cause: ValidationError,
/// }
///
/// impl WrapValidation for BadRequest {
///     fn wrap(message: String, cause: ValidationError) -> Self {
///         Self { message, cause }
///     }
/// }
/// ```
pub trait WrapValidation: std::error::Error + Send + Sync + Sized + 'static {
    /// Builds the wrapper from the original message and the original failure.
    ///
    /// Implementations must return `cause` from `source()`.
    fn wrap(message: String, cause: ValidationError) -> Self;
}

type Construct = fn(String, ValidationError) -> BoxError;

fn construct<W: WrapValidation>(message: String, cause: ValidationError) -> BoxError {
    Box::new(W::wrap(message, cause))
}

/// A reference to a wrapper error type.
///
/// Built either from a type ([`of`](Self::of)), which is always
/// constructible, or from a name ([`named`](Self::named)), which must be
/// resolved against a [`WrapperCatalog`] before it can be constructed.
/// Settings deserialize wrapper kinds from their name.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct WrapperKind {
    name: Cow<'static, str>,
    construct: Option<Construct>,
}

impl WrapperKind {
    /// References the wrapper type `W`.
    pub fn of<W: WrapValidation>() -> Self {
        Self {
            name: Cow::Borrowed(std::any::type_name::<W>()),
            construct: Some(construct::<W> as Construct),
        }
    }

    /// References a wrapper type by name, to be resolved later.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            construct: None,
        }
    }

    /// Returns the configured name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if this kind can be constructed.
    pub fn is_resolved(&self) -> bool {
        self.construct.is_some()
    }

    /// Fills in the constructor from `catalog` if this kind is only named.
    pub fn resolve(self, catalog: &WrapperCatalog) -> Self {
        if self.construct.is_some() {
            return self;
        }
        let construct = catalog.lookup(&self.name);
        Self { construct, ..self }
    }
}

impl fmt::Debug for WrapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperKind")
            .field("name", &self.name)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl PartialEq for WrapperKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl From<String> for WrapperKind {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

impl From<WrapperKind> for String {
    fn from(kind: WrapperKind) -> Self {
        kind.name.into_owned()
    }
}

/// Wrapper constructors addressable by name.
///
/// Each registered type is reachable by its full path and by its unqualified
/// name.
///
/// # Examples
///
/// ```
/// # use dispatch_decorators::{ValidationError, WrapValidation};
/// # #[derive(Debug, thiserror::Error)]
/// # #[error("{message}")]
/// # struct BadRequest { message: String, #[source] cause: ValidationError }
/// # impl WrapValidation for BadRequest {
/// #     fn wrap(message: String, cause: ValidationError) -> Self { Self { message, cause } }
/// # }
/// use dispatch_decorators::{WrapperCatalog, WrapperKind};
///
/// let catalog = WrapperCatalog::new().register::<BadRequest>();
/// let kind = WrapperKind::named("BadRequest").resolve(&catalog);
/// assert!(kind.is_resolved());
/// ```
#[derive(Debug, Clone, Default)]
pub struct WrapperCatalog {
    by_name: HashMap<String, Construct>,
}

impl WrapperCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `W` under its full path and its unqualified name.
    pub fn register<W: WrapValidation>(mut self) -> Self {
        let construct: Construct = construct::<W>;
        self.by_name
            .insert(std::any::type_name::<W>().to_string(), construct);
        self.by_name
            .insert(short_type_name::<W>().to_string(), construct);
        self
    }

    /// Returns `true` if `name` resolves to a constructor.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    fn lookup(&self, name: &str) -> Option<Construct> {
        self.by_name.get(name).copied()
    }
}

/// Converts a validation failure into the error the caller should observe.
///
/// - No wrapper: the failure is returned unchanged as
///   [`DispatchError::Validation`].
/// - A constructible wrapper: the failure's message is copied into a new
///   wrapper whose `source()` is the original failure, returned as
///   [`DispatchError::Wrapped`].
/// - A wrapper that cannot be constructed: a
///   [`ConfigError::UnconstructibleWrapper`] holding the original failure.
pub fn translate(error: ValidationError, wrapper: Option<&WrapperKind>) -> DispatchError {
    let Some(kind) = wrapper else {
        return DispatchError::Validation(error);
    };

    match kind.construct {
        Some(construct) => DispatchError::Wrapped(construct(error.to_string(), error)),
        None => {
            tracing::error!(
                wrapper = kind.name(),
                request = error.request(),
                "wrapper failure kind cannot be constructed"
            );
            ConfigError::UnconstructibleWrapper {
                name: kind.name().to_string(),
                cause: error,
            }
            .into()
        }
    }
}
