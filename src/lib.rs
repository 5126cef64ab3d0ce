//! fiber-cause: the failure algebra of a fiber runtime.
//!
//! # Overview
//!
//! When a fiber fails, the runtime needs more than a single error value.
//! Concurrent children can fail at the same time, finalizers can fail after
//! the body already did, and interruption must be attributed to the fiber
//! that requested it. A [`Cause`] records all of this as a tree of typed
//! failures, defects and interruptions joined by sequential ([`Cause::then`])
//! and parallel ([`Cause::both`]) composition.
//!
//! # Core Guarantees
//!
//! - **Lawful equality**: causes that differ only by identity, associativity,
//!   commutativity of `both`, or distributivity compare equal
//! - **Consistent hashing**: equal causes hash equal, traces excluded
//! - **Stack safety**: traversal, equality, hashing, cloning and dropping of
//!   arbitrarily deep causes run in constant native stack
//! - **Lossless aggregation**: [`Exit`] combinators keep every failure
//!
//! # Module Structure
//!
//! - [`cause`]: The `Cause` type, its laws, traversals and queries
//! - [`types`]: Fiber ids, traces and the `Exit` result type
//! - [`error`]: `Defect` and `FiberFailure`
//! - [`util`]: Deterministic hashing helpers
//! - [`tracing_compat`]: Optional structured logging

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod cause;
pub mod error;
pub mod tracing_compat;
pub mod types;
pub mod util;

#[cfg(test)]
pub(crate) mod test_utils;

pub use cause::{Cause, CauseFolder, EMPTY_CAUSE_HASH};
pub use error::{Defect, DefectKind, FiberFailure};
pub use types::{Exit, FiberId, RuntimeFiberId, Time, Trace, TraceFrame};
