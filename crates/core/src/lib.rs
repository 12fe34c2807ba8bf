//! Shared types for Fluxstore.
//!
//! This crate defines the error model used across the ordered KV backend,
//! the stream state store, and the inverted-index engine. Every other
//! crate in the workspace depends on `fluxstore-core` and nothing else in
//! the workspace; it carries no storage-format or codec logic of its own.

#![warn(missing_docs)]

pub mod domain;
pub mod error;

pub use domain::{BoolOp, ColType, OperType, Query, Term, ValueType};
pub use error::{Error, Result, StatusCode};
