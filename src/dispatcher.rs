use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    error::DispatchError,
    kind::{Command, Kind, Query},
    message::{Envelope, Reply, Request},
};

/// Routes a request of kind `K` to its handler and returns the result.
///
/// Base dispatchers and decorators implement the same contract, so any number
/// of decorators can be stacked around a base without it noticing.
/// Implementations must honor `cancellation` for any work they await.
#[async_trait]
pub trait Dispatcher<K: Kind>: Send + Sync {
    /// Dispatches `request`.
    async fn dispatch(
        &self,
        request: Envelope,
        cancellation: CancellationToken,
    ) -> Result<Reply, DispatchError>;
}

#[async_trait]
impl<K: Kind, D: Dispatcher<K> + ?Sized> Dispatcher<K> for Arc<D> {
    async fn dispatch(
        &self,
        request: Envelope,
        cancellation: CancellationToken,
    ) -> Result<Reply, DispatchError> {
        (**self).dispatch(request, cancellation).await
    }
}

/// A composed chain of decorators around a base dispatcher.
///
/// This is the only handle callers get; the individual decorators are not
/// addressable once composed. Cheap to clone.
///
/// # Examples
///
/// ```
/// use dispatch_decorators::{
///     Command, Describe, LogSettings, PipelineBuilder, Request, Router, handler_fn,
/// };
///
/// struct Ping;
/// struct Pong {
///     count: u32,
/// }
///
/// impl Describe for Ping {
///     fn describe(&self) -> Vec<(&'static str, Option<String>)> {
///         Vec::new()
///     }
/// }
/// impl Describe for Pong {
///     fn describe(&self) -> Vec<(&'static str, Option<String>)> {
///         vec![("count", Some(self.count.to_string()))]
///     }
/// }
/// impl Request for Ping {
///     type Kind = Command;
///     type Output = Pong;
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let router = Router::<Command>::new().route(handler_fn(|_: &Ping| Ok(Pong { count: 1 })));
/// let pipeline = PipelineBuilder::new(router)
///     .with_logging(LogSettings::verbose())
///     .build();
///
/// let pong = pipeline.dispatch(Ping).await.unwrap();
/// assert_eq!(pong.count, 1);
/// # }
/// ```
pub struct Pipeline<K: Kind> {
    inner: Arc<dyn Dispatcher<K>>,
    _kind: PhantomData<K>,
}

/// The command pipeline.
pub type CommandPipeline = Pipeline<Command>;

/// The query pipeline.
pub type QueryPipeline = Pipeline<Query>;

impl<K: Kind> Pipeline<K> {
    /// Wraps an already composed dispatcher.
    pub fn new(inner: Arc<dyn Dispatcher<K>>) -> Self {
        Self {
            inner,
            _kind: PhantomData,
        }
    }

    /// Dispatches `request` with a fresh cancellation token.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`].
    pub async fn dispatch<R>(&self, request: R) -> Result<R::Output, DispatchError>
    where
        R: Request<Kind = K>,
    {
        self.dispatch_with(request, CancellationToken::new()).await
    }

    /// Dispatches `request`, aborting when `cancellation` fires.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`].
    pub async fn dispatch_with<R>(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> Result<R::Output, DispatchError>
    where
        R: Request<Kind = K>,
    {
        self.dispatch_optional(Some(request), cancellation).await
    }

    /// Dispatches a possibly-absent request.
    ///
    /// # Errors
    ///
    /// An absent request is rejected with [`DispatchError::MissingRequest`]
    /// by the first decorator (or base dispatcher) it reaches.
    pub async fn dispatch_optional<R>(
        &self,
        request: Option<R>,
        cancellation: CancellationToken,
    ) -> Result<R::Output, DispatchError>
    where
        R: Request<Kind = K>,
    {
        let reply = self
            .inner
            .dispatch(Envelope::from_option(request), cancellation)
            .await?;
        reply.downcast::<R::Output>()
    }

    /// Returns the composed chain as a shareable dispatcher.
    pub fn as_dispatcher(&self) -> Arc<dyn Dispatcher<K>> {
        Arc::clone(&self.inner)
    }
}

impl<K: Kind> Clone for Pipeline<K> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.inner))
    }
}

impl<K: Kind> fmt::Debug for Pipeline<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("kind", &K::KIND)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<K: Kind> Dispatcher<K> for Pipeline<K> {
    async fn dispatch(
        &self,
        request: Envelope,
        cancellation: CancellationToken,
    ) -> Result<Reply, DispatchError> {
        self.inner.dispatch(request, cancellation).await
    }
}
