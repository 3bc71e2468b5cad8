//! Cross-cutting decorators around a dispatcher.
//!
//! Each decorator owns the next inner dispatcher and implements the same
//! [`Dispatcher`](crate::Dispatcher) contract, so decorators stack in any
//! order. Within one call the steps run in a fixed order:
//!
//! ```text
//! reject absent request
//!   ↓
//! log request type (and fields)          LoggingDecorator
//!   ↓
//! run validators, translate failures     ValidationDecorator
//!   ↓
//! inner dispatcher
//!   ↓
//! log result type (and fields)           LoggingDecorator
//! ```
//!
//! Both decorators are generic over the request kind, so the same code serves
//! the command and the query pipeline.

mod logging;
mod validation;

pub use logging::LoggingDecorator;
pub use validation::ValidationDecorator;
