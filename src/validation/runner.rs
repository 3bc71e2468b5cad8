//! Concurrent validator execution and failure aggregation.

use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use super::ValidatorRegistry;
use crate::{
    error::{DispatchError, ValidationError},
    kind::RequestKind,
    message::Envelope,
};

/// Runs every validator registered for a request and aggregates the result.
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone, Default)]
pub struct ValidationRunner {
    registry: Arc<ValidatorRegistry>,
}

impl ValidationRunner {
    /// Creates a runner over a shared registry.
    pub fn new(registry: Arc<ValidatorRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry this runner reads from.
    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    /// Validates `request`, raising a `kind` validation failure if any
    /// validator reports a problem.
    ///
    /// All validators for the request type run concurrently and the runner
    /// waits for every one of them. Failures are collected in registration
    /// order, then in the order each validator reported them.
    ///
    /// An absent request body or a request type with no validators passes.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Validation`] carrying every failure line
    /// - [`DispatchError::Cancelled`] if `cancellation` fires first
    pub async fn run(
        &self,
        request: &Envelope,
        kind: RequestKind,
        cancellation: &CancellationToken,
    ) -> Result<(), DispatchError> {
        let Some(body) = request.body() else {
            return Ok(());
        };

        let validators = self.registry.validators_for(request.type_id());
        if validators.is_empty() {
            tracing::trace!(request = request.type_name(), "no validators found");
            return Ok(());
        }

        tracing::trace!(
            validators = validators.len(),
            request = request.type_name(),
            "found validators"
        );

        let checks = join_all(
            validators
                .iter()
                .map(|validator| validator.validate(body, cancellation)),
        );

        let reports = tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                return Err(DispatchError::Cancelled(request.type_name()));
            }
            reports = checks => reports,
        };

        let errors: Vec<String> = reports
            .into_iter()
            .flatten()
            .map(|failure| failure.to_string())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(kind, request.type_name(), errors).into())
        }
    }
}
