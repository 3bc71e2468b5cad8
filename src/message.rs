//! Request and response values as they travel through a pipeline.
//!
//! Decorators are stored as trait objects, so the values they pass around are
//! type-erased: a request travels as an [`Envelope`] and a result comes back
//! as a [`Reply`]. The typed [`Pipeline`](crate::Pipeline) facade erases on
//! the way in and downcasts on the way out.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::{
    error::DispatchError,
    kind::{Kind, RequestKind},
};

/// A single described field: its name and its value, if any.
pub type Field = (&'static str, Option<String>);

/// Exposes a value's public attributes as name/value pairs.
///
/// The logging decorator emits one event per field. A `None` value is logged
/// as an empty string, never omitted.
///
/// # Examples
///
/// ```
/// use dispatch_decorators::Describe;
///
/// struct Greeting {
///     text: String,
///     sender: Option<String>,
/// }
///
/// impl Describe for Greeting {
///     fn describe(&self) -> Vec<(&'static str, Option<String>)> {
///         vec![("text", Some(self.text.clone())), ("sender", self.sender.clone())]
///     }
/// }
///
/// let greeting = Greeting { text: "hi".to_string(), sender: None };
/// assert_eq!(greeting.describe().len(), 2);
/// ```
pub trait Describe {
    /// Returns the value's fields in declaration order.
    fn describe(&self) -> Vec<Field>;
}

// Absent results have nothing to log.
impl<T: Describe> Describe for Option<T> {
    fn describe(&self) -> Vec<Field> {
        match self {
            Some(inner) => inner.describe(),
            None => Vec::new(),
        }
    }
}

impl Describe for () {
    fn describe(&self) -> Vec<Field> {
        Vec::new()
    }
}

/// Any value that can travel through a pipeline.
///
/// Implemented automatically for every `Describe + Send + Sync + 'static`
/// type.
pub trait Message: Describe + Send + Sync + 'static {
    /// Borrows the value as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Converts the boxed value into `Any` for downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T: Describe + Send + Sync + 'static> Message for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// A typed request routed through a command or query pipeline.
///
/// # Examples
///
/// ```
/// use dispatch_decorators::{Command, Describe, Request};
///
/// struct Ping;
/// struct Pong;
///
/// impl Describe for Ping {
///     fn describe(&self) -> Vec<(&'static str, Option<String>)> { Vec::new() }
/// }
/// impl Describe for Pong {
///     fn describe(&self) -> Vec<(&'static str, Option<String>)> { Vec::new() }
/// }
///
/// impl Request for Ping {
///     type Kind = Command;
///     type Output = Pong;
/// }
/// ```
pub trait Request: Message {
    /// The pipeline this request travels through.
    type Kind: Kind;
    /// The value a handler produces for this request.
    type Output: Message;
}

/// Returns the unqualified name of `T`, keeping any generic arguments.
///
/// `core::option::Option<app::Foo>` becomes `Option<app::Foo>`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let path_end = full.find('<').unwrap_or(full.len());
    let start = full[..path_end].rfind("::").map(|i| i + 2).unwrap_or(0);
    &full[start..]
}

/// A type-erased request on its way to a handler.
///
/// The request type is recorded even when the body is absent, so an absent
/// request can still be reported by name.
#[derive(Clone)]
pub struct Envelope {
    type_id: TypeId,
    type_name: &'static str,
    body: Option<Arc<dyn Message>>,
}

impl Envelope {
    /// Wraps a request.
    pub fn new<R: Request>(request: R) -> Self {
        Self::from_option(Some(request))
    }

    /// Wraps a possibly-absent request.
    pub fn from_option<R: Request>(request: Option<R>) -> Self {
        Self {
            type_id: TypeId::of::<R>(),
            type_name: short_type_name::<R>(),
            body: request.map(|r| Arc::new(r) as Arc<dyn Message>),
        }
    }

    /// Returns the `TypeId` of the request type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the unqualified request type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the request body, if present.
    pub fn body(&self) -> Option<&dyn Message> {
        self.body.as_deref()
    }

    /// Returns the body or an argument error naming the request type.
    pub(crate) fn require_body(&self, kind: RequestKind) -> Result<&dyn Message, DispatchError> {
        self.body().ok_or(DispatchError::MissingRequest {
            kind,
            request: self.type_name,
        })
    }

    /// Borrows the body as `R`, if present and of that type.
    pub fn downcast_ref<R: 'static>(&self) -> Option<&R> {
        self.body()?.as_any().downcast_ref::<R>()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("type_name", &self.type_name)
            .field("present", &self.body.is_some())
            .finish()
    }
}

/// A type-erased result on its way back to the caller.
pub struct Reply {
    type_name: &'static str,
    body: Box<dyn Message>,
}

impl Reply {
    /// Wraps a handler result.
    pub fn new<T: Message>(value: T) -> Self {
        Self {
            type_name: short_type_name::<T>(),
            body: Box::new(value),
        }
    }

    /// Returns the unqualified result type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrows the result body.
    pub fn body(&self) -> &dyn Message {
        self.body.as_ref()
    }

    /// Recovers the typed result.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnexpectedResponse`] if the reply holds a
    /// different type.
    pub fn downcast<T: Message>(self) -> Result<T, DispatchError> {
        let actual = self.type_name;
        self.body
            .into_any()
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| DispatchError::UnexpectedResponse {
                expected: short_type_name::<T>(),
                actual,
            })
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
