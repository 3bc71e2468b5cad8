//! Shared fixtures: sample requests, a spy dispatcher and an in-memory
//! `tracing` layer that records every event.

#![allow(dead_code)]

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dispatch_decorators::{
    BoxError, Command, Describe, DispatchError, Dispatcher, Envelope, Field, Query, Reply, Request,
    Router, ValidationFailure, ValidatorRegistry, handler_fn, validator_fn,
};
use tokio_util::sync::CancellationToken;
use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

pub const LOGGING_TARGET: &str = "dispatch_decorators::decorator::logging";
pub const INVALID_MESSAGE: &str = "Test command is invalid";

#[derive(Debug, Clone)]
pub struct TestCommand {
    pub message: String,
}

impl Describe for TestCommand {
    fn describe(&self) -> Vec<Field> {
        vec![("message", Some(self.message.clone()))]
    }
}

impl Request for TestCommand {
    type Kind = Command;
    type Output = TestResponse;
}

#[derive(Debug, Clone)]
pub struct TestQuery {
    pub message: String,
}

impl Describe for TestQuery {
    fn describe(&self) -> Vec<Field> {
        vec![("message", Some(self.message.clone()))]
    }
}

impl Request for TestQuery {
    type Kind = Query;
    type Output = TestResponse;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResponse {
    pub message: String,
}

impl Describe for TestResponse {
    fn describe(&self) -> Vec<Field> {
        vec![("message", Some(self.message.clone()))]
    }
}

fn mock_response() -> Result<TestResponse, BoxError> {
    Ok(TestResponse {
        message: "Mock Response".to_string(),
    })
}

pub fn command_router() -> Router<Command> {
    Router::new().route(handler_fn(|_: &TestCommand| mock_response()))
}

pub fn query_router() -> Router<Query> {
    Router::new().route(handler_fn(|_: &TestQuery| mock_response()))
}

fn message_required(message: &str) -> Vec<ValidationFailure> {
    if message.is_empty() {
        vec![ValidationFailure::new("NotEmptyValidator", "Message", INVALID_MESSAGE)]
    } else {
        Vec::new()
    }
}

/// One "message must not be empty" rule for each test request type.
pub fn validators() -> Arc<ValidatorRegistry> {
    Arc::new(
        ValidatorRegistry::new()
            .register::<TestCommand, _>(validator_fn(|c: &TestCommand| {
                message_required(&c.message)
            }))
            .register::<TestQuery, _>(validator_fn(|q: &TestQuery| message_required(&q.message))),
    )
}

/// Counts calls and answers with the mock response.
#[derive(Default)]
pub struct Spy {
    calls: AtomicUsize,
}

impl Spy {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self) -> Result<Reply, DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Reply::new(TestResponse {
            message: "Mock Response".to_string(),
        }))
    }
}

#[async_trait]
impl Dispatcher<Command> for Spy {
    async fn dispatch(
        &self,
        _request: Envelope,
        _cancellation: CancellationToken,
    ) -> Result<Reply, DispatchError> {
        self.answer()
    }
}

#[async_trait]
impl Dispatcher<Query> for Spy {
    async fn dispatch(
        &self,
        _request: Envelope,
        _cancellation: CancellationToken,
    ) -> Result<Reply, DispatchError> {
        self.answer()
    }
}

/// A recorded `tracing` event.
#[derive(Debug, Clone)]
pub struct Captured {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl Captured {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Handle on the events recorded by a [`CaptureLayer`].
#[derive(Debug, Clone, Default)]
pub struct Events {
    inner: Arc<Mutex<Vec<Captured>>>,
}

impl Events {
    pub fn all(&self) -> Vec<Captured> {
        self.inner.lock().unwrap().clone()
    }

    /// INFO events emitted by the logging decorator.
    pub fn logging(&self) -> Vec<Captured> {
        self.all()
            .into_iter()
            .filter(|e| e.level == Level::INFO && e.target.starts_with(LOGGING_TARGET))
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.logging().into_iter().map(|e| e.message).collect()
    }
}

struct CaptureLayer {
    events: Events,
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &TracingField, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name().to_string(), format!("{value:?}")));
        }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.inner.lock().unwrap().push(Captured {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

/// Returns a subscriber that records into the returned [`Events`].
///
/// Attach it to a future with `tracing::instrument::WithSubscriber`.
pub fn capture() -> (impl Subscriber + Send + Sync + 'static, Events) {
    let events = Events::default();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer {
        events: events.clone(),
    });
    (subscriber, events)
}
