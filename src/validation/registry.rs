//! Validators keyed by request type.

use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{ValidationFailure, Validator};
use crate::message::{Message, Request};

/// Object-safe view of a `Validator<R>` over an erased request.
#[async_trait]
pub(crate) trait ErasedValidator: Send + Sync {
    async fn validate(
        &self,
        request: &dyn Message,
        cancellation: &CancellationToken,
    ) -> Vec<ValidationFailure>;
}

struct TypedValidator<R, V> {
    validator: V,
    _request: PhantomData<fn(&R)>,
}

#[async_trait]
impl<R, V> ErasedValidator for TypedValidator<R, V>
where
    R: Request,
    V: Validator<R>,
{
    async fn validate(
        &self,
        request: &dyn Message,
        cancellation: &CancellationToken,
    ) -> Vec<ValidationFailure> {
        // The registry keys entries by TypeId, so a mismatch means the caller
        // built an envelope for a different type than it looked up.
        match request.as_any().downcast_ref::<R>() {
            Some(typed) => self.validator.validate(typed, cancellation).await,
            None => Vec::new(),
        }
    }
}

/// Validators for each request type, in registration order.
///
/// Built once at startup and shared read-only via `Arc`. A request type with
/// no registered validators is valid; that is not an error.
///
/// # Examples
///
/// ```
/// use dispatch_decorators::{
///     Command, Describe, Request, ValidationFailure, ValidatorRegistry, validator_fn,
/// };
///
/// struct Rename { name: String }
/// impl Describe for Rename {
///     fn describe(&self) -> Vec<(&'static str, Option<String>)> {
///         vec![("name", Some(self.name.clone()))]
///     }
/// }
/// impl Request for Rename {
///     type Kind = Command;
///     type Output = ();
/// }
///
/// let registry = ValidatorRegistry::new()
///     .register::<Rename, _>(validator_fn(|r: &Rename| {
///         if r.name.is_empty() {
///             vec![ValidationFailure::new("NotEmpty", "name", "name is required")]
///         } else {
///             Vec::new()
///         }
///     }));
///
/// assert_eq!(registry.count::<Rename>(), 1);
/// ```
#[derive(Default)]
pub struct ValidatorRegistry {
    by_type: HashMap<TypeId, Vec<Arc<dyn ErasedValidator>>>,
}

impl ValidatorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a validator for `R`, returning the registry for chaining.
    ///
    /// Validators for the same type run in the order they were registered,
    /// and their failures are reported in that order.
    pub fn register<R, V>(mut self, validator: V) -> Self
    where
        R: Request,
        V: Validator<R>,
    {
        self.add::<R, V>(validator);
        self
    }

    /// Adds a validator for `R` in place.
    pub fn add<R, V>(&mut self, validator: V)
    where
        R: Request,
        V: Validator<R>,
    {
        let erased: Arc<dyn ErasedValidator> = Arc::new(TypedValidator {
            validator,
            _request: PhantomData::<fn(&R)>,
        });
        self.by_type
            .entry(TypeId::of::<R>())
            .or_default()
            .push(erased);
    }

    /// Returns how many validators are registered for `R`.
    pub fn count<R: 'static>(&self) -> usize {
        self.validators_for(TypeId::of::<R>()).len()
    }

    /// Returns `true` if no validators are registered at all.
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    pub(crate) fn validators_for(&self, type_id: TypeId) -> &[Arc<dyn ErasedValidator>] {
        self.by_type
            .get(&type_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("request_types", &self.by_type.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::Query;
    use crate::message::{Describe, Field};
    use crate::validation::validator_fn;

    struct Lookup {
        id: u32,
    }

    impl Describe for Lookup {
        fn describe(&self) -> Vec<Field> {
            vec![("id", Some(self.id.to_string()))]
        }
    }

    impl Request for Lookup {
        type Kind = Query;
        type Output = ();
    }

    fn positive_id() -> impl Validator<Lookup> {
        validator_fn(|l: &Lookup| {
            if l.id == 0 {
                vec![ValidationFailure::new("GreaterThan", "id", "id must be positive")]
            } else {
                Vec::new()
            }
        })
    }

    #[test]
    fn empty_registry_has_no_validators() {
        let registry = ValidatorRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.count::<Lookup>(), 0);
        assert!(registry.validators_for(TypeId::of::<Lookup>()).is_empty());
    }

    #[test]
    fn validators_accumulate_per_type() {
        let registry = ValidatorRegistry::new()
            .register::<Lookup, _>(positive_id())
            .register::<Lookup, _>(positive_id());

        assert_eq!(registry.count::<Lookup>(), 2);
        assert_eq!(registry.count::<String>(), 0);
    }

    #[tokio::test]
    async fn erased_validator_checks_the_typed_request() {
        let registry = ValidatorRegistry::new().register::<Lookup, _>(positive_id());
        let token = CancellationToken::new();
        let validator = &registry.validators_for(TypeId::of::<Lookup>())[0];

        let failures = validator.validate(&Lookup { id: 0 }, &token).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field(), "id");

        assert!(validator.validate(&Lookup { id: 7 }, &token).await.is_empty());
    }

    #[tokio::test]
    async fn erased_validator_ignores_foreign_types() {
        let registry = ValidatorRegistry::new().register::<Lookup, _>(positive_id());
        let token = CancellationToken::new();
        let validator = &registry.validators_for(TypeId::of::<Lookup>())[0];

        assert!(validator.validate(&(), &token).await.is_empty());
    }
}
