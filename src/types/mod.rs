//! Supporting value types for the failure algebra.
//!
//! - [`id`]: fiber identifiers and the logical `Time` they start at
//! - [`trace`]: execution traces attached to failure leaves
//! - [`exit`]: the terminal result of a fiber

pub mod exit;
pub mod id;
pub mod trace;

pub use exit::Exit;
pub use id::{FiberId, RuntimeFiberId, Time};
pub use trace::{Trace, TraceFrame};
