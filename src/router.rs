//! A minimal base dispatcher that routes requests to handlers by type.
//!
//! Handler discovery is out of scope: every handler is registered explicitly,
//! one per request type.
//!
//! # Example
//!
//! ```
//! use dispatch_decorators::{Describe, Query, Request, Router, handler_fn};
//!
//! struct CountUsers;
//! impl Describe for CountUsers {
//!     fn describe(&self) -> Vec<(&'static str, Option<String>)> { Vec::new() }
//! }
//! impl Request for CountUsers {
//!     type Kind = Query;
//!     type Output = ();
//! }
//!
//! let router = Router::<Query>::new().route(handler_fn(|_: &CountUsers| Ok(())));
//! assert!(router.contains::<CountUsers>());
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    dispatcher::Dispatcher,
    error::{BoxError, DispatchError},
    kind::Kind,
    message::{Envelope, Message, Reply, Request, short_type_name},
};

/// Handles every request of type `R`.
#[async_trait]
pub trait Handler<R: Request>: Send + Sync + 'static {
    /// Produces the result for `request`.
    async fn handle(
        &self,
        request: &R,
        cancellation: &CancellationToken,
    ) -> Result<R::Output, BoxError>;
}

/// A handler backed by a synchronous closure.
///
/// Created with [`handler_fn`].
pub struct FnHandler<R, F> {
    handler: F,
    _request: PhantomData<fn(&R)>,
}

/// Adapts a closure into a [`Handler`].
pub fn handler_fn<R, F>(handler: F) -> FnHandler<R, F>
where
    R: Request,
    F: Fn(&R) -> Result<R::Output, BoxError> + Send + Sync + 'static,
{
    FnHandler {
        handler,
        _request: PhantomData,
    }
}

#[async_trait]
impl<R, F> Handler<R> for FnHandler<R, F>
where
    R: Request,
    F: Fn(&R) -> Result<R::Output, BoxError> + Send + Sync + 'static,
{
    async fn handle(
        &self,
        request: &R,
        _cancellation: &CancellationToken,
    ) -> Result<R::Output, BoxError> {
        (self.handler)(request)
    }
}

/// Object-safe view of a `Handler<R>` over an erased request.
#[async_trait]
trait ErasedHandler: Send + Sync {
    async fn call(
        &self,
        request: &dyn Message,
        cancellation: &CancellationToken,
    ) -> Result<Reply, DispatchError>;
}

struct TypedHandler<R, H> {
    handler: H,
    _request: PhantomData<fn(&R)>,
}

#[async_trait]
impl<R, H> ErasedHandler for TypedHandler<R, H>
where
    R: Request,
    H: Handler<R>,
{
    async fn call(
        &self,
        request: &dyn Message,
        cancellation: &CancellationToken,
    ) -> Result<Reply, DispatchError> {
        let name = short_type_name::<R>();
        let typed = request
            .as_any()
            .downcast_ref::<R>()
            .ok_or(DispatchError::HandlerNotFound(name))?;

        let output = self
            .handler
            .handle(typed, cancellation)
            .await
            .map_err(|source| DispatchError::Handler {
                request: name,
                source,
            })?;
        Ok(Reply::new(output))
    }
}

/// Routes requests of kind `K` to the handler registered for their type.
pub struct Router<K: Kind> {
    routes: HashMap<TypeId, Box<dyn ErasedHandler>>,
    _kind: PhantomData<K>,
}

impl<K: Kind> Router<K> {
    /// Creates a router with no routes.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            _kind: PhantomData,
        }
    }

    /// Registers the handler for `R`, replacing any previous one.
    pub fn route<R, H>(mut self, handler: H) -> Self
    where
        R: Request<Kind = K>,
        H: Handler<R>,
    {
        self.routes.insert(
            TypeId::of::<R>(),
            Box::new(TypedHandler {
                handler,
                _request: PhantomData::<fn(&R)>,
            }),
        );
        self
    }

    /// Returns `true` if a handler is registered for `R`.
    pub fn contains<R: Request<Kind = K>>(&self) -> bool {
        self.routes.contains_key(&TypeId::of::<R>())
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<K: Kind> Default for Router<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K: Kind> Dispatcher<K> for Router<K> {
    async fn dispatch(
        &self,
        request: Envelope,
        cancellation: CancellationToken,
    ) -> Result<Reply, DispatchError> {
        let body = request.require_body(K::KIND)?;
        let route = self
            .routes
            .get(&request.type_id())
            .ok_or(DispatchError::HandlerNotFound(request.type_name()))?;

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(DispatchError::Cancelled(request.type_name())),
            reply = route.call(body, &cancellation) => reply,
        }
    }
}
