//! Law-aware structural equality.
//!
//! Two causes are equal when they denote the same failures under the
//! algebra's laws. Each comparison `(a, b)` expands into a list of
//! alternatives; an alternative is a list of sub-comparisons that must all
//! hold. The rules, in order, each tried for `(a, b)` and then `(b, a)`:
//!
//! 1. Same tag: leaves compare payloads (traces are ignored); `Then`/`Both`
//!    compare children pairwise.
//! 2. `Stackless` is peeled off both sides before anything else, including
//!    at nested shape positions.
//! 3. Zero: a `Then`/`Both` with an `Empty` child is its other child.
//! 4. Associativity: `(a;b);c` against `a;(b;c)`, and likewise for `||`.
//! 5. Distributivity: `a;(b||c)` against `(a;b)||(a;c)`, and
//!    `(a||b);c` against `(a;c)||(b;c)`. The distributed branches must be
//!    non-empty.
//! 6. Commutativity: `a||b` against `b||a`.
//!
//! Only these shapes are matched; there is no general rewrite search.
//!
//! Evaluation runs on an explicit frame stack: an `All` frame holds the
//! remaining conjuncts of the alternative being checked, an `Any` frame the
//! remaining alternatives of a comparison. Native stack depth is constant.

use super::Cause;
use crate::tracing_compat::trace;
use core::ptr;
use std::vec::IntoIter;

type Goal<'a, E> = (&'a Cause<E>, &'a Cause<E>);
type Alternative<'a, E> = Vec<Goal<'a, E>>;

enum Frame<'a, E> {
    All(IntoIter<Goal<'a, E>>),
    Any(IntoIter<Alternative<'a, E>>),
}

enum Control<'a, E> {
    Prove(Goal<'a, E>),
    Return(bool),
}

impl<E: PartialEq> PartialEq for Cause<E> {
    fn eq(&self, other: &Self) -> bool {
        structurally_equal(self, other)
    }
}

impl<E: Eq> Eq for Cause<E> {}

/// Decides whether two causes denote the same failures.
pub fn structurally_equal<E: PartialEq>(left: &Cause<E>, right: &Cause<E>) -> bool {
    let mut frames: Vec<Frame<'_, E>> = Vec::new();
    let mut control = Control::Prove((left, right));
    #[cfg(feature = "tracing-integration")]
    let mut comparisons = 0usize;
    loop {
        control = match control {
            Control::Prove((a, b)) => {
                #[cfg(feature = "tracing-integration")]
                {
                    comparisons += 1;
                }
                let (a, b) = (a.peel(), b.peel());
                if ptr::eq(a, b) {
                    Control::Return(true)
                } else {
                    let mut alternatives = alternatives(a, b).into_iter();
                    match alternatives.next() {
                        None => Control::Return(false),
                        Some(first) => {
                            frames.push(Frame::Any(alternatives));
                            begin_all(first, &mut frames)
                        }
                    }
                }
            }
            Control::Return(result) => match frames.pop() {
                None => {
                    trace!(comparisons, result, "cause equality decided");
                    return result;
                }
                Some(Frame::All(mut rest)) => {
                    if result {
                        match rest.next() {
                            None => Control::Return(true),
                            Some(goal) => {
                                frames.push(Frame::All(rest));
                                Control::Prove(goal)
                            }
                        }
                    } else {
                        Control::Return(false)
                    }
                }
                Some(Frame::Any(mut rest)) => {
                    if result {
                        Control::Return(true)
                    } else {
                        match rest.next() {
                            None => Control::Return(false),
                            Some(alternative) => {
                                frames.push(Frame::Any(rest));
                                begin_all(alternative, &mut frames)
                            }
                        }
                    }
                }
            },
        };
    }
}

fn begin_all<'a, E>(goals: Alternative<'a, E>, frames: &mut Vec<Frame<'a, E>>) -> Control<'a, E> {
    let mut goals = goals.into_iter();
    match goals.next() {
        None => Control::Return(true),
        Some(goal) => {
            frames.push(Frame::All(goals));
            Control::Prove(goal)
        }
    }
}

/// Every way `a` and `b` could be shown equal, in rule order.
fn alternatives<'a, E: PartialEq>(a: &'a Cause<E>, b: &'a Cause<E>) -> Vec<Alternative<'a, E>> {
    let mut out = Vec::new();
    same_tag(a, b, &mut out);
    for (x, y) in [(a, b), (b, a)] {
        zero(x, y, &mut out);
    }
    for (x, y) in [(a, b), (b, a)] {
        associativity(x, y, &mut out);
    }
    for (x, y) in [(a, b), (b, a)] {
        distributivity(x, y, &mut out);
    }
    commutativity(a, b, &mut out);
    out
}

fn same_tag<'a, E: PartialEq>(a: &'a Cause<E>, b: &'a Cause<E>, out: &mut Vec<Alternative<'a, E>>) {
    let holds = match (a, b) {
        (Cause::Empty, Cause::Empty) => true,
        (Cause::Fail { value: x, .. }, Cause::Fail { value: y, .. }) => x == y,
        (Cause::Die { defect: x, .. }, Cause::Die { defect: y, .. }) => x == y,
        (Cause::Interrupt { fiber_id: x, .. }, Cause::Interrupt { fiber_id: y, .. }) => x == y,
        (
            Cause::Then {
                left: al,
                right: ar,
            },
            Cause::Then {
                left: bl,
                right: br,
            },
        )
        | (
            Cause::Both {
                left: al,
                right: ar,
            },
            Cause::Both {
                left: bl,
                right: br,
            },
        ) => {
            out.push(vec![(&**al, &**bl), (&**ar, &**br)]);
            return;
        }
        _ => false,
    };
    if holds {
        out.push(Vec::new());
    }
}

fn zero<'a, E>(x: &'a Cause<E>, y: &'a Cause<E>, out: &mut Vec<Alternative<'a, E>>) {
    if let Cause::Then { left, right } | Cause::Both { left, right } = x {
        if left.peels_to_empty() {
            out.push(vec![(&**right, y)]);
        }
        if right.peels_to_empty() {
            out.push(vec![(&**left, y)]);
        }
    }
}

/// Splits a `Then` node (seen through `Stackless`) into its children.
fn as_then<E>(cause: &Cause<E>) -> Option<(&Cause<E>, &Cause<E>)> {
    match cause.peel() {
        Cause::Then { left, right } => Some((&**left, &**right)),
        _ => None,
    }
}

/// Splits a `Both` node (seen through `Stackless`) into its children.
fn as_both<E>(cause: &Cause<E>) -> Option<(&Cause<E>, &Cause<E>)> {
    match cause.peel() {
        Cause::Both { left, right } => Some((&**left, &**right)),
        _ => None,
    }
}

fn associativity<'a, E>(x: &'a Cause<E>, y: &'a Cause<E>, out: &mut Vec<Alternative<'a, E>>) {
    let splits: [fn(&Cause<E>) -> Option<(&Cause<E>, &Cause<E>)>; 2] = [as_then, as_both];
    for split in splits {
        let Some((xl, c1)) = split(x) else { continue };
        let Some((a1, b1)) = split(xl) else { continue };
        let Some((a2, yr)) = split(y) else { continue };
        let Some((b2, c2)) = split(yr) else { continue };
        out.push(vec![(a1, a2), (b1, b2), (c1, c2)]);
    }
}

fn distributivity<'a, E>(x: &'a Cause<E>, y: &'a Cause<E>, out: &mut Vec<Alternative<'a, E>>) {
    let Some((yl, yr)) = as_both(y) else { return };
    let (Some((a2, b2)), Some((a3, c2))) = (as_then(yl), as_then(yr)) else {
        return;
    };
    let Some((xl, xr)) = as_then(x) else { return };

    // a;(b||c) against (a;b)||(a;c)
    if let Some((b1, c1)) = as_both(xr) {
        if all_occupied([b1, c1, b2, c2]) {
            out.push(vec![(a2, a3), (xl, a2), (b1, b2), (c1, c2)]);
        }
    }
    // (a||b);c against (a;c)||(b;c), where yl = a;c and yr = b;c
    if let Some((a1, b1)) = as_both(xl) {
        if all_occupied([a1, b1, a2, a3]) {
            let (c_left, c_right) = (b2, c2);
            out.push(vec![(c_left, c_right), (a1, a2), (b1, a3), (xr, c_left)]);
        }
    }
}

/// Distribution only holds for parallel branches that carry a failure. An
/// empty branch is absorbed by `||`, but once distributed it would add a path
/// that skips straight to the shared component.
fn all_occupied<E>(branches: [&Cause<E>; 4]) -> bool {
    branches.iter().all(|branch| !branch.is_empty())
}

fn commutativity<'a, E>(a: &'a Cause<E>, b: &'a Cause<E>, out: &mut Vec<Alternative<'a, E>>) {
    if let (Cause::Both { left: al, right: ar }, Cause::Both { left: bl, right: br }) = (a, b) {
        out.push(vec![(&**al, &**br), (&**ar, &**bl)]);
    }
}
