//! The failure algebra.
//!
//! A [`Cause`] records everything that went wrong while running one or more
//! fibers: typed failures, untyped defects and interruptions, composed
//! sequentially ([`Cause::then`]) or in parallel ([`Cause::both`]).
//!
//! # Laws
//!
//! | Law | Statement |
//! |-----|-----------|
//! | Identity | `then(Empty, c) = c = then(c, Empty)`, same for `both` |
//! | Associativity | `then(then(a, b), c) = then(a, then(b, c))`, same for `both` |
//! | Commutativity | `both(a, b) = both(b, a)`; `then` is not commutative |
//! | Distributivity | `then(a, both(b, c)) = both(then(a, b), then(a, c))` |
//! | Transparency | `Stackless(c) = c` |
//!
//! Equality ([`equal`]) and hashing ([`hash`]) respect these laws, so
//! structurally different trees that denote the same failures compare and
//! hash equal.
//!
//! # Stack safety
//!
//! Supervision trees nest arbitrarily deep, so no operation here recurses on
//! the native stack. Every traversal (including `Drop` and `Clone`) keeps
//! its pending work in a heap-allocated `Vec`.

pub mod equal;
pub mod hash;
pub mod query;
pub mod traverse;

pub use hash::EMPTY_CAUSE_HASH;
pub use traverse::CauseFolder;

use crate::error::Defect;
use crate::types::{FiberId, Trace};
use core::{fmt, mem};

/// Why (and how, sequentially or in parallel) a fiber's work failed.
pub enum Cause<E> {
    /// No failure; the identity of both compositions.
    Empty,
    /// A recoverable, typed application error.
    Fail {
        /// The error value.
        value: E,
        /// Where the failure was raised.
        trace: Trace,
    },
    /// An unrecoverable defect.
    Die {
        /// The defect.
        defect: Defect,
        /// Where the defect was raised.
        trace: Trace,
    },
    /// Cancellation attributed to the responsible fiber(s).
    Interrupt {
        /// The interrupting fiber(s).
        fiber_id: FiberId,
        /// Where the interruption was observed.
        trace: Trace,
    },
    /// `left` happened, then `right`.
    Then {
        /// The earlier cause.
        left: Box<Cause<E>>,
        /// The later cause.
        right: Box<Cause<E>>,
    },
    /// `left` and `right` happened concurrently.
    Both {
        /// One branch.
        left: Box<Cause<E>>,
        /// The other branch.
        right: Box<Cause<E>>,
    },
    /// Presentation-only wrapper; never affects equality or queries.
    Stackless {
        /// The wrapped cause.
        cause: Box<Cause<E>>,
        /// Whether stack rendering is suppressed.
        stackless: bool,
    },
}

impl<E> Cause<E> {
    /// The empty cause.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Empty
    }

    /// A typed failure with an empty trace.
    #[must_use]
    pub const fn fail(value: E) -> Self {
        Self::fail_traced(value, Trace::empty())
    }

    /// A typed failure with an explicit trace.
    #[must_use]
    pub const fn fail_traced(value: E, trace: Trace) -> Self {
        Self::Fail { value, trace }
    }

    /// A defect with an empty trace.
    #[must_use]
    pub fn die(defect: impl Into<Defect>) -> Self {
        Self::die_traced(defect, Trace::empty())
    }

    /// A defect with an explicit trace.
    #[must_use]
    pub fn die_traced(defect: impl Into<Defect>, trace: Trace) -> Self {
        Self::Die {
            defect: defect.into(),
            trace,
        }
    }

    /// An interruption with an empty trace.
    #[must_use]
    pub const fn interrupt(fiber_id: FiberId) -> Self {
        Self::interrupt_traced(fiber_id, Trace::empty())
    }

    /// An interruption with an explicit trace.
    #[must_use]
    pub const fn interrupt_traced(fiber_id: FiberId, trace: Trace) -> Self {
        Self::Interrupt { fiber_id, trace }
    }

    /// Sequential composition: `left` happened, then `right`.
    ///
    /// An `Empty` operand (bare or under `Stackless`) is dropped instead of
    /// allocating a node.
    #[must_use]
    pub fn then(left: Self, right: Self) -> Self {
        match (left.peels_to_empty(), right.peels_to_empty()) {
            (true, _) => right,
            (_, true) => left,
            _ => Self::Then {
                left: Box::new(left),
                right: Box::new(right),
            },
        }
    }

    /// Parallel composition: `left` and `right` happened concurrently.
    ///
    /// An `Empty` operand (bare or under `Stackless`) is dropped instead of
    /// allocating a node.
    #[must_use]
    pub fn both(left: Self, right: Self) -> Self {
        match (left.peels_to_empty(), right.peels_to_empty()) {
            (true, _) => right,
            (_, true) => left,
            _ => Self::Both {
                left: Box::new(left),
                right: Box::new(right),
            },
        }
    }

    /// Sequentially composes every cause, in iteration order.
    #[must_use]
    pub fn then_all(causes: impl IntoIterator<Item = Self>) -> Self {
        causes.into_iter().fold(Self::Empty, Self::then)
    }

    /// Composes every cause in parallel.
    #[must_use]
    pub fn both_all(causes: impl IntoIterator<Item = Self>) -> Self {
        causes.into_iter().fold(Self::Empty, Self::both)
    }

    /// Wraps a cause, suppressing stack rendering.
    #[must_use]
    pub fn stackless(cause: Self) -> Self {
        Self::Stackless {
            cause: Box::new(cause),
            stackless: true,
        }
    }

    /// Wraps a cause, explicitly keeping stack rendering.
    #[must_use]
    pub fn stack(cause: Self) -> Self {
        Self::Stackless {
            cause: Box::new(cause),
            stackless: false,
        }
    }

    /// Returns true if no `Fail`, `Die` or `Interrupt` leaf is reachable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let mut pending: Vec<&Self> = Vec::new();
        let mut current = self;
        loop {
            match current {
                Self::Empty => match pending.pop() {
                    Some(next) => current = next,
                    None => return true,
                },
                Self::Fail { .. } | Self::Die { .. } | Self::Interrupt { .. } => return false,
                Self::Then { left, right } | Self::Both { left, right } => {
                    pending.push(right);
                    current = left;
                }
                Self::Stackless { cause, .. } => current = cause,
            }
        }
    }

    /// Returns true if this node is `Empty` once `Stackless` wrappers are
    /// stripped.
    pub(crate) fn peels_to_empty(&self) -> bool {
        matches!(self.peel(), Self::Empty)
    }

    /// Strips any `Stackless` wrappers around this node.
    pub(crate) fn peel(&self) -> &Self {
        let mut current = self;
        while let Self::Stackless { cause, .. } = current {
            current = cause;
        }
        current
    }

    /// Moves this node's children onto `out`, leaving `Empty` in their place.
    fn detach_children(&mut self, out: &mut Vec<Self>) {
        match self {
            Self::Then { left, right } | Self::Both { left, right } => {
                out.push(mem::replace(&mut **left, Self::Empty));
                out.push(mem::replace(&mut **right, Self::Empty));
            }
            Self::Stackless { cause, .. } => out.push(mem::replace(&mut **cause, Self::Empty)),
            Self::Empty | Self::Fail { .. } | Self::Die { .. } | Self::Interrupt { .. } => {}
        }
    }

    const fn has_children(&self) -> bool {
        matches!(
            self,
            Self::Then { .. } | Self::Both { .. } | Self::Stackless { .. }
        )
    }

    /// True when dropping this node recursively would go deeper than one level.
    fn has_grandchildren(&self) -> bool {
        match self {
            Self::Then { left, right } | Self::Both { left, right } => {
                left.has_children() || right.has_children()
            }
            Self::Stackless { cause, .. } => cause.has_children(),
            Self::Empty | Self::Fail { .. } | Self::Die { .. } | Self::Interrupt { .. } => false,
        }
    }
}

impl<E> Default for Cause<E> {
    fn default() -> Self {
        Self::Empty
    }
}

/// Pending output of the `Debug` renderer.
enum Render<'a, E> {
    Node(&'a Cause<E>),
    Text(&'static str),
}

impl<E: fmt::Debug> fmt::Debug for Cause<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn leaf(
            f: &mut fmt::Formatter<'_>,
            name: &str,
            payload: &dyn fmt::Debug,
            trace: &Trace,
        ) -> fmt::Result {
            let mut tuple = f.debug_tuple(name);
            tuple.field(payload);
            if !trace.is_empty() {
                tuple.field(trace);
            }
            tuple.finish()
        }

        let mut pending = vec![Render::Node(self)];
        while let Some(item) = pending.pop() {
            let cause = match item {
                Render::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Render::Node(cause) => cause,
            };
            match cause {
                Self::Empty => f.write_str("Empty")?,
                Self::Fail { value, trace } => leaf(f, "Fail", value, trace)?,
                Self::Die { defect, trace } => leaf(f, "Die", defect, trace)?,
                Self::Interrupt { fiber_id, trace } => leaf(f, "Interrupt", fiber_id, trace)?,
                Self::Then { left, right } | Self::Both { left, right } => {
                    let open = if matches!(cause, Self::Then { .. }) {
                        "Then("
                    } else {
                        "Both("
                    };
                    f.write_str(open)?;
                    pending.push(Render::Text(")"));
                    pending.push(Render::Node(right));
                    pending.push(Render::Text(", "));
                    pending.push(Render::Node(left));
                }
                Self::Stackless { cause, stackless } => {
                    f.write_str(if *stackless { "Stackless(" } else { "Stack(" })?;
                    pending.push(Render::Text(")"));
                    pending.push(Render::Node(cause));
                }
            }
        }
        Ok(())
    }
}

impl<E: Clone> Clone for Cause<E> {
    fn clone(&self) -> Self {
        self.fold(&mut traverse::Duplicate)
    }
}

impl<E> Drop for Cause<E> {
    fn drop(&mut self) {
        if !self.has_grandchildren() {
            return;
        }
        let mut orphans = Vec::new();
        self.detach_children(&mut orphans);
        while let Some(mut node) = orphans.pop() {
            if node.has_grandchildren() {
                node.detach_children(&mut orphans);
            }
        }
    }
}
