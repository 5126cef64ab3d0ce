//! Error types for crossing from fiber-aware code into ordinary `Result`s.
//!
//! - [`Defect`] is the untyped payload of a [`Cause::Die`] leaf and the single
//!   "throwable" a cause collapses to via [`Cause::squash_with`].
//! - [`FiberFailure`] wraps a whole [`Cause`] when a failed
//!   [`Exit`](crate::Exit) is turned into a `Result`.
//!
//! Squashing is lossy by contract. Code that needs every failure keeps the
//! cause (see [`FiberFailure::cause`]) and inspects it with the traversal
//! primitives instead.

use crate::cause::Cause;
use core::fmt;
use std::any::Any;

/// What kind of defect a [`Defect`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DefectKind {
    /// A panic caught at a fiber boundary.
    Panic,
    /// Interruption with no typed failure or defect to report.
    Interrupted,
    /// A typed failure converted into a defect.
    Failure,
    /// A cause with no failures was squashed.
    EmptyCause,
    /// Any other unrecoverable runtime condition.
    Runtime,
}

impl fmt::Display for DefectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Panic => write!(f, "panic"),
            Self::Interrupted => write!(f, "interrupted"),
            Self::Failure => write!(f, "failure"),
            Self::EmptyCause => write!(f, "empty cause"),
            Self::Runtime => write!(f, "defect"),
        }
    }
}

/// An unrecoverable, untyped failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Defect {
    kind: DefectKind,
    message: String,
}

impl Defect {
    /// Creates a runtime defect with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(DefectKind::Runtime, message)
    }

    /// Creates a defect of a specific kind.
    #[must_use]
    pub fn with_kind(kind: DefectKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a panic defect.
    #[must_use]
    pub fn panic(message: impl Into<String>) -> Self {
        Self::with_kind(DefectKind::Panic, message)
    }

    /// Converts a payload caught by `std::panic::catch_unwind`.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::panic(message)
    }

    /// Describes a typed failure as a defect.
    #[must_use]
    pub fn failure(error: impl fmt::Display) -> Self {
        Self::with_kind(DefectKind::Failure, error.to_string())
    }

    /// Synthesizes the defect reported for interruption by the given fibers.
    #[must_use]
    pub fn interrupted(fiber_ids: impl IntoIterator<Item = u64>) -> Self {
        let mut ids: Vec<u64> = fiber_ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        let names: Vec<String> = ids.iter().map(|id| format!("#{id}")).collect();
        Self::with_kind(
            DefectKind::Interrupted,
            format!("interrupted by fibers: {}", names.join(", ")),
        )
    }

    /// The fallback defect for squashing a cause that holds no failures.
    #[must_use]
    pub fn empty_cause() -> Self {
        Self::with_kind(DefectKind::EmptyCause, "squashed a cause with no failures")
    }

    /// Returns the defect kind.
    #[must_use]
    pub const fn kind(&self) -> DefectKind {
        self.kind
    }

    /// Returns the defect message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for Defect {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Defect {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// A failed fiber's full cause, carried as a standard error.
///
/// `Display` shows the squashed defect; [`cause`](Self::cause) keeps every
/// failure.
#[derive(Debug, Clone, PartialEq)]
pub struct FiberFailure<E> {
    cause: Cause<E>,
}

impl<E> FiberFailure<E> {
    /// Wraps a cause.
    #[must_use]
    pub fn new(cause: Cause<E>) -> Self {
        Self { cause }
    }

    /// Returns the wrapped cause.
    #[must_use]
    pub fn cause(&self) -> &Cause<E> {
        &self.cause
    }

    /// Unwraps the cause.
    #[must_use]
    pub fn into_cause(self) -> Cause<E> {
        self.cause
    }
}

impl<E: fmt::Display> fmt::Display for FiberFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fiber failed: {}", self.cause.squash())
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for FiberFailure<E> {}
