//! Request validation.
//!
//! This module provides:
//! - `Validator<R>`: the port external validators implement
//! - `ValidatorRegistry`: validators keyed by request type, built at startup
//! - `ValidationRunner`: runs every validator for a request and aggregates failures
//! - `translate`: maps a validation failure onto the configured wrapper kind
//!
//! Validators are independent, side-effect-free checks. The runner invokes
//! them concurrently and always waits for the full set, so a rejected request
//! reports every failure rather than the first.

mod failure;
mod registry;
mod runner;
mod translate;

pub use failure::{FnValidator, ValidationFailure, Validator, validator_fn};
pub use registry::ValidatorRegistry;
pub use runner::ValidationRunner;
pub use translate::{WrapValidation, WrapperCatalog, WrapperKind, translate};
