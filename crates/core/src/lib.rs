//! Core error and outcome types for the `fnkit` combinators.
//!
//! This crate establishes the foundational building blocks shared by the
//! combinator modules in `fnkit`:
//!
//! - **`errors`**: the primary `Error` enum and `Result` type alias,
//!   centralizing the failure modes the library itself can introduce.
//! - **`outcome`**: the `Outcome` sum type that classifies a produced value
//!   as immediately available or deferred, decided once at the boundary
//!   where results are produced rather than sniffed at the call site.

pub mod errors;
pub mod outcome;

pub use self::{
    errors::{Error, Result},
    outcome::Outcome,
};
