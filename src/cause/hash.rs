//! Canonical flattening and hashing.
//!
//! [`Cause::flatten`] rewrites a cause into its sequential stages: stage `k`
//! holds every failure leaf reached after exactly `k` sequential steps along
//! some execution path. `Both` forks a path without advancing it, `Then`
//! advances it, and `Empty`/`Stackless` are transparent. A `Both` branch
//! with no reachable leaf adds no path, matching `both(Empty, c) = c`.
//! Within a stage the order carries no meaning; across stages it does.
//! Because every law of the algebra preserves these stages as sets, hashing
//! stage sets in order gives a hash that agrees with law-respecting equality.
//!
//! Flattening uses an index arena of sequential continuations plus a pending
//! stack, so it never recurses.

use super::Cause;
use crate::tracing_compat::trace;
use crate::util::det_hash::{combine_ordered, combine_unordered, hash_tagged};
use core::hash::{Hash, Hasher};
use core::ptr;
use std::collections::{BTreeSet, HashSet};

/// Hash of every cause that carries no failures.
pub const EMPTY_CAUSE_HASH: u64 = 0x9e37_79b9_7f4a_7c15;

const FAIL_TAG: u8 = 1;
const DIE_TAG: u8 = 2;
const INTERRUPT_TAG: u8 = 3;

/// One sequential continuation: run `head`, then whatever `tail` names.
struct Link<'a, E> {
    head: &'a Cause<E>,
    tail: Option<usize>,
}

/// A cause still to be run, followed by an optional continuation.
type Frontier<'a, E> = (&'a Cause<E>, Option<usize>);

struct Flattener<'a, E> {
    links: Vec<Link<'a, E>>,
    /// Nodes under `root` with no reachable leaf.
    hollow: HashSet<*const Cause<E>>,
}

impl<'a, E> Flattener<'a, E> {
    fn new(root: &'a Cause<E>) -> Self {
        Self {
            links: Vec::new(),
            hollow: hollow_nodes(root),
        }
    }

    fn is_hollow(&self, cause: &Cause<E>) -> bool {
        self.hollow.contains(&ptr::from_ref(cause))
    }

    /// Runs one sequential step from `start`, pushing the leaves it hits into
    /// `parallel` and their continuations into `sequential`.
    fn step(
        &mut self,
        start: Frontier<'a, E>,
        parallel: &mut Vec<&'a Cause<E>>,
        sequential: &mut Vec<Frontier<'a, E>>,
    ) {
        let mut pending: Vec<Frontier<'a, E>> = vec![start];
        while let Some((mut cause, mut suffix)) = pending.pop() {
            loop {
                match cause {
                    Cause::Empty => match suffix {
                        Some(index) => {
                            let link = &self.links[index];
                            cause = link.head;
                            suffix = link.tail;
                        }
                        None => break,
                    },
                    Cause::Stackless { cause: inner, .. } => cause = &**inner,
                    Cause::Then { left, right } => {
                        self.links.push(Link {
                            head: &**right,
                            tail: suffix,
                        });
                        suffix = Some(self.links.len() - 1);
                        cause = &**left;
                    }
                    // A hollow branch adds no path to the continuation.
                    Cause::Both { left, right } => {
                        match (self.is_hollow(left), self.is_hollow(right)) {
                            (true, _) => cause = &**right,
                            (false, true) => cause = &**left,
                            (false, false) => {
                                pending.push((&**right, suffix));
                                cause = &**left;
                            }
                        }
                    }
                    Cause::Fail { .. } | Cause::Die { .. } | Cause::Interrupt { .. } => {
                        parallel.push(cause);
                        if let Some(index) = suffix {
                            let link = &self.links[index];
                            sequential.push((link.head, link.tail));
                        }
                        break;
                    }
                }
            }
        }
    }
}

/// Collects every node with no reachable `Fail`, `Die` or `Interrupt` leaf,
/// in one post-order pass.
fn hollow_nodes<E>(root: &Cause<E>) -> HashSet<*const Cause<E>> {
    let mut hollow = HashSet::new();
    let mut pending: Vec<(&Cause<E>, bool)> = vec![(root, false)];
    while let Some((cause, expanded)) = pending.pop() {
        match cause {
            Cause::Empty => {
                hollow.insert(ptr::from_ref(cause));
            }
            Cause::Fail { .. } | Cause::Die { .. } | Cause::Interrupt { .. } => {}
            Cause::Then { left, right } | Cause::Both { left, right } => {
                if expanded {
                    if hollow.contains(&ptr::from_ref(&**left))
                        && hollow.contains(&ptr::from_ref(&**right))
                    {
                        hollow.insert(ptr::from_ref(cause));
                    }
                } else {
                    pending.push((cause, true));
                    pending.push((&**right, false));
                    pending.push((&**left, false));
                }
            }
            Cause::Stackless { cause: inner, .. } => {
                if expanded {
                    if hollow.contains(&ptr::from_ref(&**inner)) {
                        hollow.insert(ptr::from_ref(cause));
                    }
                } else {
                    pending.push((cause, true));
                    pending.push((&**inner, false));
                }
            }
        }
    }
    hollow
}

impl<E> Cause<E> {
    /// Flattens this cause into its sequential stages.
    ///
    /// Each inner vector is one stage: leaves that happen in parallel, in no
    /// meaningful order. Empty stages are omitted, so an empty cause flattens
    /// to an empty vector.
    #[must_use]
    pub fn flatten(&self) -> Vec<Vec<&Self>> {
        let mut flattener = Flattener::new(self);
        let mut stages = Vec::new();
        let mut frontier: Vec<Frontier<'_, E>> = vec![(self, None)];
        while !frontier.is_empty() {
            let mut parallel = Vec::new();
            let mut sequential = Vec::new();
            for start in frontier.drain(..) {
                flattener.step(start, &mut parallel, &mut sequential);
            }
            if !parallel.is_empty() {
                stages.push(parallel);
            }
            let mut seen: HashSet<(*const Self, Option<usize>)> = HashSet::new();
            frontier = sequential
                .into_iter()
                .filter(|(head, tail)| seen.insert((ptr::from_ref(*head), *tail)))
                .collect();
        }
        stages
    }
}

impl<E: Hash> Cause<E> {
    /// Hash of this cause that agrees with law-respecting equality.
    ///
    /// Traces and `Stackless` markers are excluded. All empty causes share
    /// [`EMPTY_CAUSE_HASH`]; a cause whose only stage holds one distinct leaf
    /// hashes as that leaf.
    #[must_use]
    pub fn canonical_hash(&self) -> u64 {
        let stages: Vec<BTreeSet<u64>> = self
            .flatten()
            .into_iter()
            .map(|stage| stage.into_iter().map(leaf_hash).collect())
            .collect();
        let hash = match stages.as_slice() {
            [] => EMPTY_CAUSE_HASH,
            [only] if only.len() == 1 => only.first().copied().unwrap_or(EMPTY_CAUSE_HASH),
            _ => combine_ordered(stages.iter().map(combine_unordered)),
        };
        trace!(stages = stages.len(), hash, "canonical cause hash");
        hash
    }
}

fn leaf_hash<E: Hash>(leaf: &Cause<E>) -> u64 {
    match leaf {
        Cause::Fail { value, .. } => hash_tagged(FAIL_TAG, value),
        Cause::Die { defect, .. } => hash_tagged(DIE_TAG, defect),
        Cause::Interrupt { fiber_id, .. } => hash_tagged(INTERRUPT_TAG, fiber_id),
        _ => EMPTY_CAUSE_HASH,
    }
}

impl<E: Hash> Hash for Cause<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.canonical_hash());
    }
}
