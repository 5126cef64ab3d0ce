//! Terminal result of a fiber.
//!
//! An [`Exit`] is either the fiber's success value or the full [`Cause`] of
//! its failure. Aggregating several exits keeps every failure: sequential
//! aggregation ([`Exit::zip`], [`Exit::collect_all`]) joins causes with
//! [`Cause::then`], parallel aggregation ([`Exit::zip_par`],
//! [`Exit::collect_all_par`]) with [`Cause::both`].

use super::id::FiberId;
use crate::cause::Cause;
use crate::error::{Defect, FiberFailure};
use crate::tracing_compat::debug;

/// How a fiber finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Exit<E, A> {
    /// The fiber produced a value.
    Success(A),
    /// The fiber failed; the cause records why.
    Failure(Cause<E>),
}

impl<E, A> Exit<E, A> {
    /// A successful exit.
    #[must_use]
    pub const fn succeed(value: A) -> Self {
        Self::Success(value)
    }

    /// A failed exit holding one typed failure.
    #[must_use]
    pub const fn fail(error: E) -> Self {
        Self::Failure(Cause::fail(error))
    }

    /// A failed exit holding one defect.
    #[must_use]
    pub fn die(defect: impl Into<Defect>) -> Self {
        Self::Failure(Cause::die(defect))
    }

    /// A failed exit interrupted by `fiber_id`.
    #[must_use]
    pub const fn interrupt(fiber_id: FiberId) -> Self {
        Self::Failure(Cause::interrupt(fiber_id))
    }

    /// A failed exit with an arbitrary cause.
    #[must_use]
    pub const fn fail_cause(cause: Cause<E>) -> Self {
        Self::Failure(cause)
    }

    /// Returns true for [`Exit::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true for [`Exit::Failure`].
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns true if the exit failed and its cause records an interruption.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        match self {
            Self::Success(_) => false,
            Self::Failure(cause) => cause.is_interrupted(),
        }
    }

    /// The failure cause, if any.
    #[must_use]
    pub const fn cause(&self) -> Option<&Cause<E>> {
        match self {
            Self::Success(_) => None,
            Self::Failure(cause) => Some(cause),
        }
    }

    /// The success value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&A> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Maps the success value.
    pub fn map<B>(self, f: impl FnOnce(A) -> B) -> Exit<E, B> {
        match self {
            Self::Success(value) => Exit::Success(f(value)),
            Self::Failure(cause) => Exit::Failure(cause),
        }
    }

    /// Maps every typed failure in the cause.
    pub fn map_error<E2>(self, f: impl FnMut(&E) -> E2) -> Exit<E2, A> {
        match self {
            Self::Success(value) => Exit::Success(value),
            Self::Failure(cause) => Exit::Failure(cause.map(f)),
        }
    }

    /// Replaces the whole failure cause.
    pub fn map_error_cause<E2>(self, f: impl FnOnce(Cause<E>) -> Cause<E2>) -> Exit<E2, A> {
        match self {
            Self::Success(value) => Exit::Success(value),
            Self::Failure(cause) => Exit::Failure(f(cause)),
        }
    }

    /// Combines two exits.
    ///
    /// Two successes combine with `f`; two failures combine their causes with
    /// `g`; otherwise the single failure wins.
    pub fn zip_with<B, C>(
        self,
        that: Exit<E, B>,
        f: impl FnOnce(A, B) -> C,
        g: impl FnOnce(Cause<E>, Cause<E>) -> Cause<E>,
    ) -> Exit<E, C> {
        match (self, that) {
            (Self::Success(a), Exit::Success(b)) => Exit::Success(f(a, b)),
            (Self::Failure(left), Exit::Success(_)) => Exit::Failure(left),
            (Self::Success(_), Exit::Failure(right)) => Exit::Failure(right),
            (Self::Failure(left), Exit::Failure(right)) => Exit::Failure(g(left, right)),
        }
    }

    /// Pairs two exits; failures combine sequentially.
    pub fn zip<B>(self, that: Exit<E, B>) -> Exit<E, (A, B)> {
        self.zip_with(that, |a, b| (a, b), Cause::then)
    }

    /// Pairs two exits; failures combine in parallel.
    pub fn zip_par<B>(self, that: Exit<E, B>) -> Exit<E, (A, B)> {
        self.zip_with(that, |a, b| (a, b), Cause::both)
    }

    /// Collects exits in order, joining failures with [`Cause::then`].
    ///
    /// Returns `None` for an empty input.
    pub fn collect_all(exits: impl IntoIterator<Item = Self>) -> Option<Exit<E, Vec<A>>> {
        Self::collect_with(exits, Cause::then)
    }

    /// Collects exits in order, joining failures with [`Cause::both`].
    ///
    /// Returns `None` for an empty input.
    pub fn collect_all_par(exits: impl IntoIterator<Item = Self>) -> Option<Exit<E, Vec<A>>> {
        Self::collect_with(exits, Cause::both)
    }

    fn collect_with(
        exits: impl IntoIterator<Item = Self>,
        combine: fn(Cause<E>, Cause<E>) -> Cause<E>,
    ) -> Option<Exit<E, Vec<A>>> {
        let mut exits = exits.into_iter();
        let first = exits.next()?.map(|value| vec![value]);
        Some(exits.fold(first, |acc, next| {
            acc.zip_with(
                next,
                |mut values, value| {
                    values.push(value);
                    values
                },
                combine,
            )
        }))
    }

    /// The success value, or `f` applied to the failure cause.
    pub fn get_or_else(self, f: impl FnOnce(&Cause<E>) -> A) -> A {
        match self {
            Self::Success(value) => value,
            Self::Failure(cause) => f(&cause),
        }
    }

    /// Converts to a `Result`, wrapping a failure's cause in [`FiberFailure`].
    pub fn into_result(self) -> Result<A, FiberFailure<E>> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(cause) => {
                debug!(
                    failures = cause.failures().len(),
                    defects = cause.defects().len(),
                    interrupted = cause.is_interrupted(),
                    "exit converted to fiber failure"
                );
                Err(FiberFailure::new(cause))
            }
        }
    }
}

impl<E, A> From<Result<A, E>> for Exit<E, A> {
    fn from(result: Result<A, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::fail(error),
        }
    }
}
