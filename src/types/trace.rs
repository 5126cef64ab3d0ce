//! Execution traces attached to failure leaves.
//!
//! A [`Trace`] records which fiber produced a failure and the frames it was
//! executing. Traces are diagnostics only: they never take part in cause
//! equality or hashing.

use super::id::FiberId;
use core::fmt;
use std::panic::Location;

/// A single execution location.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TraceFrame {
    location: String,
}

impl TraceFrame {
    /// Creates a frame from a free-form location string.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Creates a frame for the caller's source location.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self {
            location: format!(
                "{}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            ),
        }
    }

    /// Returns the recorded location.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl fmt::Debug for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {}", self.location)
    }
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location)
    }
}

/// A fiber id plus the ordered frames it was executing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Trace {
    fiber_id: FiberId,
    frames: Vec<TraceFrame>,
}

impl Trace {
    /// The empty trace; the identity of [`Trace::combine`].
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            fiber_id: FiberId::None,
            frames: Vec::new(),
        }
    }

    /// Creates a trace for a fiber.
    #[must_use]
    pub fn new(fiber_id: FiberId, frames: Vec<TraceFrame>) -> Self {
        Self { fiber_id, frames }
    }

    /// Creates a trace holding the caller's location.
    #[must_use]
    #[track_caller]
    pub fn here(fiber_id: FiberId) -> Self {
        Self {
            fiber_id,
            frames: vec![TraceFrame::caller()],
        }
    }

    /// Returns the fiber this trace belongs to.
    #[must_use]
    pub fn fiber_id(&self) -> &FiberId {
        &self.fiber_id
    }

    /// Returns the recorded frames, oldest first.
    #[must_use]
    pub fn frames(&self) -> &[TraceFrame] {
        &self.frames
    }

    /// Returns true if the trace carries neither a fiber nor frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fiber_id.is_none() && self.frames.is_empty()
    }

    /// Appends a frame.
    #[must_use]
    pub fn with_frame(mut self, frame: TraceFrame) -> Self {
        self.frames.push(frame);
        self
    }

    /// Combines two traces: fiber ids combine, frames concatenate.
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut frames = Vec::with_capacity(self.frames.len() + other.frames.len());
        frames.extend_from_slice(&self.frames);
        frames.extend_from_slice(&other.frames);
        Self {
            fiber_id: self.fiber_id.combine(&other.fiber_id),
            frames,
        }
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fiber {}", self.fiber_id)?;
        for frame in &self.frames {
            write!(f, "\n  at {frame}")?;
        }
        Ok(())
    }
}
