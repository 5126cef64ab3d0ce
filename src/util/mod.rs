//! Internal utilities.
//!
//! Hashing here is seeded with fixed constants, so canonical cause hashes are
//! reproducible across processes.

pub mod det_hash;

pub use det_hash::{DetBuildHasher, DetHashSet, DetHasher};
