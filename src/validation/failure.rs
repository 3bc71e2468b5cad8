//! Validation failures and the validator port.

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// One rule violation reported by a validator.
///
/// Rendered as `"{code} - {field} - {message}"`, which is the line carried by
/// [`ValidationError`](crate::ValidationError).
///
/// # Examples
///
/// ```
/// use dispatch_decorators::ValidationFailure;
///
/// let failure = ValidationFailure::new("NotEmpty", "message", "must not be empty");
/// assert_eq!(failure.to_string(), "NotEmpty - message - must not be empty");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    code: String,
    field: String,
    message: String,
}

impl ValidationFailure {
    /// Creates a new failure.
    pub fn new(
        code: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the rule code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the offending field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} - {}", self.code, self.field, self.message)
    }
}

/// A check applied to every request of type `R` before it is dispatched.
///
/// # Invariants
///
/// Implementations MUST:
/// - Return every failure they find, in a stable order
/// - Return an empty list when the request is valid
/// - Not mutate shared state (validators run concurrently)
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use dispatch_decorators::{ValidationFailure, Validator};
/// use tokio_util::sync::CancellationToken;
///
/// struct Rename {
///     name: String,
/// }
///
/// struct NameRequired;
///
/// #[async_trait]
/// impl Validator<Rename> for NameRequired {
///     async fn validate(
///         &self,
///         request: &Rename,
///         _cancellation: &CancellationToken,
///     ) -> Vec<ValidationFailure> {
///         if request.name.is_empty() {
///             vec![ValidationFailure::new("NotEmpty", "name", "name is required")]
///         } else {
///             Vec::new()
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Validator<R>: Send + Sync + 'static {
    /// Checks `request`, returning all failures found.
    async fn validate(&self, request: &R, cancellation: &CancellationToken)
        -> Vec<ValidationFailure>;
}

/// A validator backed by a synchronous closure.
///
/// Created with [`validator_fn`].
pub struct FnValidator<R, F> {
    check: F,
    _request: PhantomData<fn(&R)>,
}

/// Adapts a closure into a [`Validator`].
///
/// # Examples
///
/// ```
/// use dispatch_decorators::{ValidationFailure, validator_fn};
///
/// struct Rename {
///     name: String,
/// }
///
/// let name_required = validator_fn(|request: &Rename| {
///     if request.name.is_empty() {
///         vec![ValidationFailure::new("NotEmpty", "name", "name is required")]
///     } else {
///         Vec::new()
///     }
/// });
/// # let _ = name_required;
/// ```
pub fn validator_fn<R, F>(check: F) -> FnValidator<R, F>
where
    F: Fn(&R) -> Vec<ValidationFailure> + Send + Sync + 'static,
{
    FnValidator {
        check,
        _request: PhantomData,
    }
}

#[async_trait]
impl<R, F> Validator<R> for FnValidator<R, F>
where
    R: Sync + 'static,
    F: Fn(&R) -> Vec<ValidationFailure> + Send + Sync + 'static,
{
    async fn validate(
        &self,
        request: &R,
        _cancellation: &CancellationToken,
    ) -> Vec<ValidationFailure> {
        (self.check)(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rename {
        name: String,
    }

    #[test]
    fn failure_renders_code_field_message() {
        let failure = ValidationFailure::new("NotEmpty", "name", "name is required");
        assert_eq!(failure.to_string(), "NotEmpty - name - name is required");
        assert_eq!(failure.code(), "NotEmpty");
        assert_eq!(failure.field(), "name");
        assert_eq!(failure.message(), "name is required");
    }

    #[tokio::test]
    async fn fn_validator_delegates_to_closure() {
        let validator = validator_fn(|request: &Rename| {
            if request.name.is_empty() {
                vec![ValidationFailure::new("NotEmpty", "name", "required")]
            } else {
                Vec::new()
            }
        });
        let token = CancellationToken::new();

        let empty = Rename {
            name: String::new(),
        };
        let named = Rename {
            name: "ada".to_string(),
        };

        assert_eq!(validator.validate(&empty, &token).await.len(), 1);
        assert!(validator.validate(&named, &token).await.is_empty());
    }
}
