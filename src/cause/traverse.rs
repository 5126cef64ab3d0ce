//! Stack-safe traversal primitives.
//!
//! Every traversal keeps its pending work in a `Vec` on the heap, so the
//! native stack depth is constant regardless of how deeply a cause nests.
//!
//! - [`Cause::reduce_left`] / [`Cause::find`]: pre-order, left before right.
//! - [`Cause::fold`]: post-order catamorphism driven by a [`CauseFolder`].
//! - [`Cause::flat_map`] / [`Cause::map`]: substitute `Fail` leaves, keeping
//!   each leaf's trace on its replacement.
//! - [`Cause::map_trace`], [`Cause::traced`], [`Cause::untraced`]: rewrite
//!   every leaf trace in place, preserving structure.

use super::Cause;
use crate::error::Defect;
use crate::types::{FiberId, Trace};
use core::marker::PhantomData;

/// One handler per [`Cause`] variant, used by [`Cause::fold`].
///
/// Composite handlers receive the already-folded results of their children;
/// the left child is always folded first.
pub trait CauseFolder<'a, E> {
    /// The folded result.
    type Output;

    /// Folds [`Cause::Empty`].
    fn empty(&mut self) -> Self::Output;

    /// Folds a [`Cause::Fail`] leaf.
    fn fail(&mut self, value: &'a E, trace: &'a Trace) -> Self::Output;

    /// Folds a [`Cause::Die`] leaf.
    fn die(&mut self, defect: &'a Defect, trace: &'a Trace) -> Self::Output;

    /// Folds a [`Cause::Interrupt`] leaf.
    fn interrupt(&mut self, fiber_id: &'a FiberId, trace: &'a Trace) -> Self::Output;

    /// Combines the folded children of a [`Cause::Then`].
    fn then(&mut self, left: Self::Output, right: Self::Output) -> Self::Output;

    /// Combines the folded children of a [`Cause::Both`].
    fn both(&mut self, left: Self::Output, right: Self::Output) -> Self::Output;

    /// Wraps the folded inner cause of a [`Cause::Stackless`].
    fn stackless(&mut self, inner: Self::Output, stackless: bool) -> Self::Output;
}

enum Task<'a, E> {
    Visit(&'a Cause<E>),
    Then,
    Both,
    Stackless(bool),
}

fn pop_value<T>(values: &mut Vec<T>) -> T {
    match values.pop() {
        Some(value) => value,
        None => unreachable!("fold value stack underflow"),
    }
}

fn pop_pair<T>(values: &mut Vec<T>) -> (T, T) {
    let right = pop_value(values);
    let left = pop_value(values);
    (left, right)
}

impl<E> Cause<E> {
    /// Pre-order left fold over every node, `Stackless` wrappers included.
    ///
    /// `f` returns `Some` to replace the accumulator or `None` to keep it.
    pub fn reduce_left<'a, Z>(
        &'a self,
        initial: Z,
        mut f: impl FnMut(&Z, &'a Self) -> Option<Z>,
    ) -> Z {
        let mut acc = initial;
        let mut pending: Vec<&'a Self> = Vec::new();
        let mut current = Some(self);
        while let Some(cause) = current {
            if let Some(next) = f(&acc, cause) {
                acc = next;
            }
            current = match cause {
                Self::Then { left, right } | Self::Both { left, right } => {
                    pending.push(&**right);
                    Some(&**left)
                }
                Self::Stackless { cause, .. } => Some(&**cause),
                Self::Empty | Self::Fail { .. } | Self::Die { .. } | Self::Interrupt { .. } => {
                    pending.pop()
                }
            };
        }
        acc
    }

    /// Returns the first `Some` produced by `f`, visiting nodes in the same
    /// order as [`reduce_left`](Self::reduce_left).
    pub fn find<'a, Z>(&'a self, mut f: impl FnMut(&'a Self) -> Option<Z>) -> Option<Z> {
        let mut pending: Vec<&'a Self> = Vec::new();
        let mut current = Some(self);
        while let Some(cause) = current {
            if let Some(found) = f(cause) {
                return Some(found);
            }
            current = match cause {
                Self::Then { left, right } | Self::Both { left, right } => {
                    pending.push(&**right);
                    Some(&**left)
                }
                Self::Stackless { cause, .. } => Some(&**cause),
                Self::Empty | Self::Fail { .. } | Self::Die { .. } | Self::Interrupt { .. } => {
                    pending.pop()
                }
            };
        }
        None
    }

    /// Folds the whole tree bottom-up with one handler per variant.
    pub fn fold<'a, F: CauseFolder<'a, E>>(&'a self, folder: &mut F) -> F::Output {
        let mut tasks = vec![Task::Visit(self)];
        let mut values: Vec<F::Output> = Vec::new();
        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(cause) => match cause {
                    Self::Empty => values.push(folder.empty()),
                    Self::Fail { value, trace } => values.push(folder.fail(value, trace)),
                    Self::Die { defect, trace } => values.push(folder.die(defect, trace)),
                    Self::Interrupt { fiber_id, trace } => {
                        values.push(folder.interrupt(fiber_id, trace));
                    }
                    Self::Then { left, right } => {
                        tasks.push(Task::Then);
                        tasks.push(Task::Visit(&**right));
                        tasks.push(Task::Visit(&**left));
                    }
                    Self::Both { left, right } => {
                        tasks.push(Task::Both);
                        tasks.push(Task::Visit(&**right));
                        tasks.push(Task::Visit(&**left));
                    }
                    Self::Stackless { cause, stackless } => {
                        tasks.push(Task::Stackless(*stackless));
                        tasks.push(Task::Visit(&**cause));
                    }
                },
                Task::Then => {
                    let (left, right) = pop_pair(&mut values);
                    values.push(folder.then(left, right));
                }
                Task::Both => {
                    let (left, right) = pop_pair(&mut values);
                    values.push(folder.both(left, right));
                }
                Task::Stackless(stackless) => {
                    let inner = pop_value(&mut values);
                    values.push(folder.stackless(inner, stackless));
                }
            }
        }
        pop_value(&mut values)
    }

    /// Replaces every `Fail` leaf with the cause `f` returns for its value.
    ///
    /// The replaced leaf's trace is combined into every leaf of the
    /// substituted cause, so provenance survives substitution.
    pub fn flat_map<E2>(&self, f: impl FnMut(&E) -> Cause<E2>) -> Cause<E2> {
        self.fold(&mut Substitute {
            f,
            _out: PhantomData,
        })
    }

    /// Maps every typed failure, keeping structure and traces.
    pub fn map<E2>(&self, mut f: impl FnMut(&E) -> E2) -> Cause<E2> {
        self.flat_map(|value| Cause::fail(f(value)))
    }

    /// Rewrites the trace of every leaf.
    #[must_use]
    pub fn map_trace(mut self, mut f: impl FnMut(&Trace) -> Trace) -> Self {
        self.for_each_trace_mut(|trace| *trace = f(trace));
        self
    }

    /// Appends `trace` to the trace of every leaf.
    #[must_use]
    pub fn traced(self, trace: &Trace) -> Self {
        if trace.is_empty() {
            return self;
        }
        self.map_trace(|existing| existing.combine(trace))
    }

    /// Clears the trace of every leaf.
    #[must_use]
    pub fn untraced(self) -> Self {
        self.map_trace(|_| Trace::empty())
    }

    fn for_each_trace_mut(&mut self, mut f: impl FnMut(&mut Trace)) {
        let mut pending: Vec<&mut Self> = vec![self];
        while let Some(cause) = pending.pop() {
            match cause {
                Self::Empty => {}
                Self::Fail { trace, .. }
                | Self::Die { trace, .. }
                | Self::Interrupt { trace, .. } => f(trace),
                Self::Then { left, right } | Self::Both { left, right } => {
                    pending.push(&mut **right);
                    pending.push(&mut **left);
                }
                Self::Stackless { cause, .. } => pending.push(&mut **cause),
            }
        }
    }
}

/// Exact structural copy; backs `Clone`.
pub(crate) struct Duplicate;

impl<'a, E: Clone> CauseFolder<'a, E> for Duplicate {
    type Output = Cause<E>;

    fn empty(&mut self) -> Cause<E> {
        Cause::Empty
    }

    fn fail(&mut self, value: &'a E, trace: &'a Trace) -> Cause<E> {
        Cause::fail_traced(value.clone(), trace.clone())
    }

    fn die(&mut self, defect: &'a Defect, trace: &'a Trace) -> Cause<E> {
        Cause::die_traced(defect.clone(), trace.clone())
    }

    fn interrupt(&mut self, fiber_id: &'a FiberId, trace: &'a Trace) -> Cause<E> {
        Cause::interrupt_traced(fiber_id.clone(), trace.clone())
    }

    fn then(&mut self, left: Cause<E>, right: Cause<E>) -> Cause<E> {
        Cause::Then {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn both(&mut self, left: Cause<E>, right: Cause<E>) -> Cause<E> {
        Cause::Both {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn stackless(&mut self, inner: Cause<E>, stackless: bool) -> Cause<E> {
        Cause::Stackless {
            cause: Box::new(inner),
            stackless,
        }
    }
}

struct Substitute<F, E2> {
    f: F,
    _out: PhantomData<fn() -> E2>,
}

impl<'a, E, E2, F> CauseFolder<'a, E> for Substitute<F, E2>
where
    F: FnMut(&E) -> Cause<E2>,
{
    type Output = Cause<E2>;

    fn empty(&mut self) -> Cause<E2> {
        Cause::Empty
    }

    fn fail(&mut self, value: &'a E, trace: &'a Trace) -> Cause<E2> {
        (self.f)(value).traced(trace)
    }

    fn die(&mut self, defect: &'a Defect, trace: &'a Trace) -> Cause<E2> {
        Cause::die_traced(defect.clone(), trace.clone())
    }

    fn interrupt(&mut self, fiber_id: &'a FiberId, trace: &'a Trace) -> Cause<E2> {
        Cause::interrupt_traced(fiber_id.clone(), trace.clone())
    }

    fn then(&mut self, left: Cause<E2>, right: Cause<E2>) -> Cause<E2> {
        Cause::then(left, right)
    }

    fn both(&mut self, left: Cause<E2>, right: Cause<E2>) -> Cause<E2> {
        Cause::both(left, right)
    }

    fn stackless(&mut self, inner: Cause<E2>, stackless: bool) -> Cause<E2> {
        Cause::Stackless {
            cause: Box::new(inner),
            stackless,
        }
    }
}
