//! Request-kind markers.
//!
//! This module defines zero-sized marker types that encode, at compile time,
//! which pipeline a request belongs to. Commands and queries travel through
//! separately composed chains; `Pipeline<Command>` and `Pipeline<Query>` are
//! distinct types and cannot be mixed up.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime tag for the two request categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// A request that changes state.
    Command,
    /// A request that reads state.
    Query,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Command => write!(f, "command"),
            RequestKind::Query => write!(f, "query"),
        }
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Command {}
    impl Sealed for super::Query {}
}

/// Compile-time request category.
///
/// Implemented only by [`Command`] and [`Query`].
pub trait Kind: sealed::Sealed + Send + Sync + 'static {
    /// The runtime tag for this category.
    const KIND: RequestKind;
}

/// Marker for the command pipeline.
///
/// Never constructed; used only as a type parameter.
#[derive(Debug, Clone, Copy)]
pub struct Command {
    _private: (),
}

/// Marker for the query pipeline.
///
/// Never constructed; used only as a type parameter.
#[derive(Debug, Clone, Copy)]
pub struct Query {
    _private: (),
}

impl Kind for Command {
    const KIND: RequestKind = RequestKind::Command;
}

impl Kind for Query {
    const KIND: RequestKind = RequestKind::Query;
}
