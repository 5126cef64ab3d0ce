//! Derived queries over a cause.
//!
//! Everything here is built on [`Cause::find`], [`Cause::reduce_left`] and
//! [`Cause::fold`], so it inherits their stack safety and their
//! left-before-right visiting order.

use super::{Cause, CauseFolder};
use crate::error::Defect;
use crate::tracing_compat::{debug, warn};
use crate::types::{FiberId, Trace};
use crate::util::DetHashSet;
use core::fmt;
use core::ptr;

impl<E> Cause<E> {
    /// Calls `f` on every node in traversal order.
    fn visit<'a>(&'a self, mut f: impl FnMut(&'a Self)) {
        self.reduce_left((), |_, cause| {
            f(cause);
            None
        });
    }

    /// The first defect, if any.
    #[must_use]
    pub fn die_option(&self) -> Option<&Defect> {
        self.find(|cause| match cause {
            Self::Die { defect, .. } => Some(defect),
            _ => None,
        })
    }

    /// The first typed failure, if any.
    #[must_use]
    pub fn failure_option(&self) -> Option<&E> {
        self.find(|cause| match cause {
            Self::Fail { value, .. } => Some(value),
            _ => None,
        })
    }

    /// The first interrupting fiber, if any.
    #[must_use]
    pub fn interrupt_option(&self) -> Option<&FiberId> {
        self.find(|cause| match cause {
            Self::Interrupt { fiber_id, .. } => Some(fiber_id),
            _ => None,
        })
    }

    /// Returns true if the cause holds a defect.
    #[must_use]
    pub fn is_die(&self) -> bool {
        self.die_option().is_some()
    }

    /// Returns true if the cause holds a typed failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.failure_option().is_some()
    }

    /// Returns true if the cause holds an interruption.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interrupt_option().is_some()
    }

    /// Returns true if nothing but interruptions (or nothing at all) is
    /// recorded.
    #[must_use]
    pub fn is_interrupted_only(&self) -> bool {
        self.find(|cause| matches!(cause, Self::Fail { .. } | Self::Die { .. }).then_some(()))
            .is_none()
    }

    /// Every defect, in traversal order.
    #[must_use]
    pub fn defects(&self) -> Vec<&Defect> {
        let mut out = Vec::new();
        self.visit(|cause| {
            if let Self::Die { defect, .. } = cause {
                out.push(defect);
            }
        });
        out
    }

    /// Every typed failure, in traversal order.
    #[must_use]
    pub fn failures(&self) -> Vec<&E> {
        let mut out = Vec::new();
        self.visit(|cause| {
            if let Self::Fail { value, .. } = cause {
                out.push(value);
            }
        });
        out
    }

    /// The set of fibers that interrupted this computation.
    #[must_use]
    pub fn interruptors(&self) -> DetHashSet<FiberId> {
        let mut out = DetHashSet::default();
        self.visit(|cause| {
            if let Self::Interrupt { fiber_id, .. } = cause {
                out.insert(fiber_id.clone());
            }
        });
        out
    }

    /// Collapses the cause into a single defect.
    ///
    /// Precedence: the first typed failure (converted by `f`), then
    /// interruption, then the first defect. A cause holding none of these
    /// squashes to [`Defect::empty_cause`].
    pub fn squash_with(&self, f: impl FnOnce(&E) -> Defect) -> Defect {
        if let Some(failure) = self.failure_option() {
            return f(failure);
        }
        if self.is_interrupted() {
            let interruptors = self.interruptors();
            let ids = interruptors.iter().flat_map(FiberId::ids);
            let defect = Defect::interrupted(ids);
            debug!(defect = %defect, "squashed interrupted cause");
            return defect;
        }
        if let Some(defect) = self.die_option() {
            return defect.clone();
        }
        warn!("squashed a cause with no failures");
        Defect::empty_cause()
    }

    /// Returns true if `that` is empty or equals some node of this cause.
    #[must_use]
    pub fn contains(&self, that: &Self) -> bool
    where
        E: PartialEq,
    {
        that.is_empty()
            || self
                .find(|cause| (ptr::eq(cause, that) || cause == that).then_some(()))
                .is_some()
    }

    /// Keeps only the defects and the skeleton joining them.
    ///
    /// Returns `None` if the cause holds no defects.
    #[must_use]
    pub fn keep_defects(&self) -> Option<Self> {
        self.fold(&mut KeepDefects)
    }

    /// Removes every typed failure, keeping defects and interruptions.
    #[must_use]
    pub fn strip_failures(&self) -> Self {
        self.fold(&mut StripFailures)
    }

    /// Every non-empty leaf trace, in traversal order.
    #[must_use]
    pub fn traces(&self) -> Vec<&Trace> {
        let mut out = Vec::new();
        self.visit(|cause| match cause {
            Self::Fail { trace, .. } | Self::Die { trace, .. } | Self::Interrupt { trace, .. }
                if !trace.is_empty() =>
            {
                out.push(trace);
            }
            _ => {}
        });
        out
    }

    /// All leaf traces combined into one.
    #[must_use]
    pub fn trace(&self) -> Trace {
        self.traces()
            .into_iter()
            .fold(Trace::empty(), |acc, trace| acc.combine(trace))
    }
}

impl<E: fmt::Display> Cause<E> {
    /// [`squash_with`](Self::squash_with) describing failures by `Display`.
    #[must_use]
    pub fn squash(&self) -> Defect {
        self.squash_with(|error| Defect::failure(error))
    }
}

struct KeepDefects;

impl<'a, E> CauseFolder<'a, E> for KeepDefects {
    type Output = Option<Cause<E>>;

    fn empty(&mut self) -> Self::Output {
        None
    }

    fn fail(&mut self, _value: &'a E, _trace: &'a Trace) -> Self::Output {
        None
    }

    fn die(&mut self, defect: &'a Defect, trace: &'a Trace) -> Self::Output {
        Some(Cause::die_traced(defect.clone(), trace.clone()))
    }

    fn interrupt(&mut self, _fiber_id: &'a FiberId, _trace: &'a Trace) -> Self::Output {
        None
    }

    fn then(&mut self, left: Self::Output, right: Self::Output) -> Self::Output {
        match (left, right) {
            (Some(left), Some(right)) => Some(Cause::then(left, right)),
            (Some(only), None) | (None, Some(only)) => Some(only),
            (None, None) => None,
        }
    }

    fn both(&mut self, left: Self::Output, right: Self::Output) -> Self::Output {
        match (left, right) {
            (Some(left), Some(right)) => Some(Cause::both(left, right)),
            (Some(only), None) | (None, Some(only)) => Some(only),
            (None, None) => None,
        }
    }

    fn stackless(&mut self, inner: Self::Output, stackless: bool) -> Self::Output {
        inner.map(|cause| Cause::Stackless {
            cause: Box::new(cause),
            stackless,
        })
    }
}

struct StripFailures;

impl<'a, E> CauseFolder<'a, E> for StripFailures {
    type Output = Cause<E>;

    fn empty(&mut self) -> Cause<E> {
        Cause::Empty
    }

    fn fail(&mut self, _value: &'a E, _trace: &'a Trace) -> Cause<E> {
        Cause::Empty
    }

    fn die(&mut self, defect: &'a Defect, trace: &'a Trace) -> Cause<E> {
        Cause::die_traced(defect.clone(), trace.clone())
    }

    fn interrupt(&mut self, fiber_id: &'a FiberId, trace: &'a Trace) -> Cause<E> {
        Cause::interrupt_traced(fiber_id.clone(), trace.clone())
    }

    fn then(&mut self, left: Cause<E>, right: Cause<E>) -> Cause<E> {
        Cause::then(left, right)
    }

    fn both(&mut self, left: Cause<E>, right: Cause<E>) -> Cause<E> {
        Cause::both(left, right)
    }

    fn stackless(&mut self, inner: Cause<E>, stackless: bool) -> Cause<E> {
        if matches!(inner, Cause::Empty) {
            return inner;
        }
        Cause::Stackless {
            cause: Box::new(inner),
            stackless,
        }
    }
}
