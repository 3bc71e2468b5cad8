//! Logging and validation decorators for command/query dispatchers.
//!
//! Commands and queries travel through separately composed chains. Each chain
//! wraps a base dispatcher in any number of cross-cutting behaviors:
//! - **Logging**: records the request and result type names, and optionally
//!   every field of each
//! - **Validation**: runs every registered validator concurrently and rejects
//!   the request with the full list of failures before it reaches the handler
//!
//! # Core Types
//!
//! - [`Request`]: a message bound for one handler, tagged [`Command`] or [`Query`]
//! - [`Dispatcher`]: the contract shared by base dispatchers and decorators
//! - [`Router`]: a base dispatcher routing by request type
//! - [`ValidatorRegistry`]: validators keyed by request type
//! - [`PipelineBuilder`]: composes decorators into a [`Pipeline`]
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use dispatch_decorators::{
//!     Command, Describe, LogSettings, PipelineBuilder, Request, Router, ValidationFailure,
//!     ValidationSettings, ValidatorRegistry, handler_fn, validator_fn,
//! };
//!
//! struct Rename {
//!     name: String,
//! }
//!
//! impl Describe for Rename {
//!     fn describe(&self) -> Vec<(&'static str, Option<String>)> {
//!         vec![("name", Some(self.name.clone()))]
//!     }
//! }
//!
//! impl Request for Rename {
//!     type Kind = Command;
//!     type Output = ();
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let validators = ValidatorRegistry::new().register::<Rename, _>(validator_fn(|r: &Rename| {
//!     if r.name.is_empty() {
//!         vec![ValidationFailure::new("NotEmpty", "name", "name is required")]
//!     } else {
//!         Vec::new()
//!     }
//! }));
//!
//! let router = Router::<Command>::new().route(handler_fn(|_: &Rename| Ok(())));
//! let commands = PipelineBuilder::new(router)
//!     .with_validators(Arc::new(validators))
//!     .with_logging(LogSettings::new())
//!     .with_validation(ValidationSettings::new())
//!     .build();
//!
//! commands.dispatch(Rename { name: "ada".into() }).await.unwrap();
//!
//! let err = commands.dispatch(Rename { name: String::new() }).await.unwrap_err();
//! let failure = err.validation().expect("rejected by validation");
//! assert_eq!(failure.errors(), ["NotEmpty - name - name is required"]);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod decorator;
mod dispatcher;
mod error;
mod kind;
mod message;
mod router;
mod settings;
mod validation;

pub use builder::{CommandPipelineBuilder, PipelineBuilder, QueryPipelineBuilder};
pub use decorator::{LoggingDecorator, ValidationDecorator};
pub use dispatcher::{CommandPipeline, Dispatcher, Pipeline, QueryPipeline};
pub use error::{BoxError, ConfigError, DispatchError, ValidationError};
pub use kind::{Command, Kind, Query, RequestKind};
pub use message::{Describe, Envelope, Field, Message, Reply, Request};
pub use router::{FnHandler, Handler, Router, handler_fn};
pub use settings::{Behavior, LogSettings, PipelineConfig, ValidationSettings};
pub use validation::{
    FnValidator, ValidationFailure, ValidationRunner, Validator, ValidatorRegistry, WrapValidation,
    WrapperCatalog, WrapperKind, translate, validator_fn,
};
