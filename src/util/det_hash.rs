//! Deterministic hashing for canonical cause hashes.
//!
//! Cause hashes must be reproducible across runs and processes, so they are
//! computed with a fixed-seed hasher instead of `RandomState`. The helpers
//! here combine already-computed 64-bit hashes either in order (sequential
//! stages) or independently of order (members of one parallel stage).

use std::collections::BTreeSet;
use std::hash::{BuildHasher, Hash, Hasher};

/// Deterministic, non-cryptographic hasher.
///
/// This uses a fixed seed and a simple mixing strategy for reproducibility.
#[derive(Debug, Clone)]
pub struct DetHasher {
    state: u64,
}

impl DetHasher {
    /// Fixed seed ensures deterministic hashes across runs.
    const SEED: u64 = 0x16f1_1fe8_9b0d_677c;
    /// Prime multiplier for mixing.
    const MULTIPLIER: u64 = 0x517c_c1b7_2722_0a95;
}

impl Default for DetHasher {
    fn default() -> Self {
        Self { state: Self::SEED }
    }
}

impl Hasher for DetHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state = self.state.wrapping_mul(Self::MULTIPLIER);
            self.state ^= u64::from(byte);
        }
    }

    fn write_u8(&mut self, i: u8) {
        self.state = self.state.wrapping_mul(Self::MULTIPLIER) ^ u64::from(i);
    }

    fn write_u64(&mut self, i: u64) {
        self.state = self.state.wrapping_mul(Self::MULTIPLIER) ^ i;
    }

    fn finish(&self) -> u64 {
        let mut h = self.state;
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^= h >> 33;
        h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
        h ^= h >> 33;
        h
    }
}

/// Builder for deterministic hashers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetBuildHasher;

impl BuildHasher for DetBuildHasher {
    type Hasher = DetHasher;

    fn build_hasher(&self) -> Self::Hasher {
        DetHasher::default()
    }
}

/// Deterministic `HashSet`.
pub type DetHashSet<K> = std::collections::HashSet<K, DetBuildHasher>;

/// Hashes a single value with a fresh [`DetHasher`], prefixed by `tag`.
#[must_use]
pub fn hash_tagged<T: Hash + ?Sized>(tag: u8, value: &T) -> u64 {
    let mut hasher = DetHasher::default();
    hasher.write_u8(tag);
    value.hash(&mut hasher);
    hasher.finish()
}

/// Combines hashes so that their order matters.
#[must_use]
pub fn combine_ordered(hashes: impl IntoIterator<Item = u64>) -> u64 {
    let mut hasher = DetHasher::default();
    let mut len = 0u64;
    for hash in hashes {
        hasher.write_u64(hash);
        len += 1;
    }
    hasher.write_u64(len);
    hasher.finish()
}

/// Combines a set of hashes independently of insertion order and multiplicity.
#[must_use]
pub fn combine_unordered(hashes: &BTreeSet<u64>) -> u64 {
    let mut hasher = DetHasher::default();
    hasher.write_u8(0xB0);
    for &hash in hashes {
        hasher.write_u64(hash);
    }
    hasher.write_u64(hashes.len() as u64);
    hasher.finish()
}
