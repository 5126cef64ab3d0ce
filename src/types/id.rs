//! Fiber identity.
//!
//! A [`FiberId`] attributes an interruption to the fiber (or fibers) that
//! requested it. Identities combine into composites when several fibers are
//! responsible for the same interruption; the combination is normalized so
//! that `combine` is associative, commutative and has [`FiberId::None`] as
//! its identity under both `==` and `Hash`.

use core::fmt;
use std::collections::BTreeSet;

/// A logical timestamp recording when a fiber started.
///
/// In a production runtime this corresponds to wall-clock milliseconds; in a
/// deterministic test harness it is whatever the virtual clock reports.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Time(u64);

impl Time {
    /// The zero instant (epoch).
    pub const ZERO: Self = Self(0);

    /// Creates a new time from milliseconds since epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Creates a new time from seconds since epoch.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000))
    }

    /// Returns the time as milliseconds since epoch.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Time({}ms)", self.0)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 1_000 {
            write!(f, "{}.{:03}s", self.0 / 1_000, self.0 % 1_000)
        } else {
            write!(f, "{}ms", self.0)
        }
    }
}

/// Identity of a single runtime fiber.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuntimeFiberId {
    id: u64,
    started_at: Time,
}

impl RuntimeFiberId {
    /// Creates a runtime fiber identity.
    #[must_use]
    pub const fn new(id: u64, started_at: Time) -> Self {
        Self { id, started_at }
    }

    /// Returns the numeric fiber id.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.id
    }

    /// Returns the time the fiber started.
    #[must_use]
    pub const fn started_at(self) -> Time {
        self.started_at
    }
}

impl fmt::Debug for RuntimeFiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FiberId(#{}@{})", self.id, self.started_at)
    }
}

impl fmt::Display for RuntimeFiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

/// Identity of the fiber(s) responsible for an interruption.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FiberId {
    /// No fiber; the identity of [`FiberId::combine`].
    #[default]
    None,
    /// A single runtime fiber.
    Runtime(RuntimeFiberId),
    /// Two or more distinct runtime fibers.
    Composite(BTreeSet<RuntimeFiberId>),
}

impl FiberId {
    /// Creates the identity of a single runtime fiber.
    #[must_use]
    pub const fn runtime(id: u64, started_at: Time) -> Self {
        Self::Runtime(RuntimeFiberId::new(id, started_at))
    }

    /// Creates a runtime fiber id started at [`Time::ZERO`], for tests and
    /// benchmarks.
    #[doc(hidden)]
    #[must_use]
    pub const fn new_for_test(id: u64) -> Self {
        Self::runtime(id, Time::ZERO)
    }

    /// Builds the normalized identity for a set of runtime fibers.
    #[must_use]
    pub fn from_runtime_ids(ids: impl IntoIterator<Item = RuntimeFiberId>) -> Self {
        let mut set: BTreeSet<RuntimeFiberId> = ids.into_iter().collect();
        match set.len() {
            0 => Self::None,
            1 => set.pop_first().map_or(Self::None, Self::Runtime),
            _ => Self::Composite(set),
        }
    }

    /// Combines two identities into one attributing both.
    ///
    /// The result is normalized: no ids gives [`FiberId::None`], one distinct
    /// id gives [`FiberId::Runtime`], anything larger a [`FiberId::Composite`].
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::None, other) => other.clone(),
            (this, Self::None) => this.clone(),
            (this, other) => Self::from_runtime_ids(
                this.runtime_ids()
                    .into_iter()
                    .chain(other.runtime_ids()),
            ),
        }
    }

    /// Returns true for [`FiberId::None`].
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns every runtime fiber this identity attributes.
    #[must_use]
    pub fn runtime_ids(&self) -> BTreeSet<RuntimeFiberId> {
        match self {
            Self::None => BTreeSet::new(),
            Self::Runtime(id) => BTreeSet::from([*id]),
            Self::Composite(ids) => ids.clone(),
        }
    }

    /// Returns the numeric ids of every fiber this identity attributes.
    #[must_use]
    pub fn ids(&self) -> BTreeSet<u64> {
        match self {
            Self::None => BTreeSet::new(),
            Self::Runtime(id) => BTreeSet::from([id.id()]),
            Self::Composite(ids) => ids.iter().map(|id| id.id()).collect(),
        }
    }
}

impl fmt::Debug for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "FiberId(none)"),
            Self::Runtime(id) => write!(f, "{id:?}"),
            Self::Composite(ids) => f.debug_set().entries(ids.iter()).finish(),
        }
    }
}

impl fmt::Display for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "#none"),
            Self::Runtime(id) => write!(f, "{id}"),
            Self::Composite(ids) => {
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{id}")?;
                }
                Ok(())
            }
        }
    }
}
