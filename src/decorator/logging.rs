use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    dispatcher::Dispatcher,
    error::DispatchError,
    kind::Kind,
    message::{Envelope, Message, Reply},
    settings::LogSettings,
};

/// Logs each request and its result around the inner dispatcher.
///
/// Emits, at INFO:
/// - `handling` with the request type name
/// - one `property` event per request field, if request logging is enabled
/// - `handled` with the result type name
/// - one `property` event per result field, if response logging is enabled
///
/// Failures from the inner dispatcher propagate untouched; nothing is logged
/// after a failure.
pub struct LoggingDecorator<K: Kind> {
    inner: Arc<dyn Dispatcher<K>>,
    settings: LogSettings,
}

impl<K: Kind> LoggingDecorator<K> {
    /// Wraps `inner`, snapshotting `settings`.
    pub fn new(inner: Arc<dyn Dispatcher<K>>, settings: LogSettings) -> Self {
        Self { inner, settings }
    }

    /// Returns the settings this decorator was built with.
    pub fn settings(&self) -> &LogSettings {
        &self.settings
    }
}

/// Emits one event per described field. Absent values log as `""`.
fn log_properties(scope: &'static str, message: &dyn Message) {
    for (property, value) in message.describe() {
        let value = value.unwrap_or_default();
        tracing::info!(scope, property, value = %value, "property");
    }
}

#[async_trait]
impl<K: Kind> Dispatcher<K> for LoggingDecorator<K> {
    async fn dispatch(
        &self,
        request: Envelope,
        cancellation: CancellationToken,
    ) -> Result<Reply, DispatchError> {
        let kind = K::KIND;
        let body = request.require_body(kind)?;

        tracing::info!(%kind, request = request.type_name(), "handling");
        if self.settings.request_logging_enabled {
            log_properties("request", body);
        }

        let reply = self.inner.dispatch(request, cancellation).await?;

        tracing::info!(%kind, response = reply.type_name(), "handled");
        if self.settings.response_logging_enabled {
            log_properties("response", reply.body());
        }

        Ok(reply)
    }
}
