use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    dispatcher::Dispatcher,
    error::DispatchError,
    kind::Kind,
    message::{Envelope, Reply},
    settings::ValidationSettings,
    validation::{ValidationRunner, translate},
};

/// Validates each request before handing it to the inner dispatcher.
///
/// A rejected request never reaches the inner dispatcher. The failure is
/// passed through [`translate`] with the configured wrapper kind. Failures
/// raised by the inner dispatcher, including validation failures from
/// decorators further in, are returned untouched.
pub struct ValidationDecorator<K: Kind> {
    inner: Arc<dyn Dispatcher<K>>,
    runner: ValidationRunner,
    settings: ValidationSettings,
}

impl<K: Kind> ValidationDecorator<K> {
    /// Wraps `inner`, validating with `runner` and snapshotting `settings`.
    pub fn new(
        inner: Arc<dyn Dispatcher<K>>,
        runner: ValidationRunner,
        settings: ValidationSettings,
    ) -> Self {
        Self {
            inner,
            runner,
            settings,
        }
    }

    /// Returns the settings this decorator was built with.
    pub fn settings(&self) -> &ValidationSettings {
        &self.settings
    }
}

#[async_trait]
impl<K: Kind> Dispatcher<K> for ValidationDecorator<K> {
    async fn dispatch(
        &self,
        request: Envelope,
        cancellation: CancellationToken,
    ) -> Result<Reply, DispatchError> {
        request.require_body(K::KIND)?;

        if let Err(err) = self.runner.run(&request, K::KIND, &cancellation).await {
            return Err(match err {
                DispatchError::Validation(failure) => {
                    tracing::debug!(
                        request = request.type_name(),
                        errors = failure.errors().len(),
                        "request rejected by validation"
                    );
                    translate(failure, self.settings.wrapper_failure_kind.as_ref())
                }
                other => other,
            });
        }

        self.inner.dispatch(request, cancellation).await
    }
}
