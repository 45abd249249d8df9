#![warn(missing_docs)]

//! This crate is a small library of helpers that are shared across the other
//! strata crates. Its chief quality is that it has virtually zero
//! dependencies.

mod sync;
pub use sync::*;

mod bytes;
pub use bytes::*;
