//! End-to-end checks of the derived queries on representative causes.

#[macro_use]
mod common;

use common::*;
use fiber_cause::{Cause, Defect, DefectKind, Exit, FiberFailure};

fn init_test(name: &str) {
    init_test_logging();
    test_phase!(name);
}

fn sample() -> Cause<&'static str> {
    Cause::both(
        Cause::then(Cause::fail("e"), Cause::die("d")),
        Cause::interrupt(fid(1)),
    )
}

#[test]
fn containment_of_sub_causes() {
    init_test("containment_of_sub_causes");
    let cause = sample();
    assert!(cause.contains(&Cause::then(Cause::fail("e"), Cause::die("d"))));
    assert!(cause.contains(&Cause::interrupt(fid(1))));
    assert!(cause.contains(&Cause::empty()));
    // Leaves are visited like any other node.
    assert!(cause.contains(&Cause::fail("e")));
    assert!(!cause.contains(&Cause::fail("missing")));
    assert!(!cause.contains(&Cause::then(Cause::die("d"), Cause::fail("e"))));
    assert!(!cause.contains(&Cause::interrupt(fid(2))));
    test_complete!("containment_of_sub_causes");
}

#[test]
fn query_precedence() {
    init_test("query_precedence");
    let sequential: Cause<&str> = Cause::then(Cause::fail("A"), Cause::fail("B"));
    assert_eq!(sequential.failure_option(), Some(&"A"));
    assert_eq!(sequential.failures(), vec![&"A", &"B"]);

    let mixed: Cause<&str> = Cause::both(Cause::die("1"), Cause::fail("X"));
    assert!(mixed.is_failure());
    assert!(mixed.is_die());
    assert!(!mixed.is_interrupted_only());
    assert!(!mixed.is_interrupted());
    test_complete!("query_precedence");
}

#[test]
fn squash_interruptions_names_every_fiber() {
    init_test("squash_interruptions_names_every_fiber");
    let cause: Cause<&str> = Cause::both(Cause::interrupt(fid(1)), Cause::interrupt(fid(2)));
    let defect = cause.squash();
    assert_eq!(defect.kind(), DefectKind::Interrupted);
    assert!(defect.message().contains("#1"));
    assert!(defect.message().contains("#2"));

    let boom: Cause<&str> = Cause::fail("boom");
    let squashed = boom.squash_with(|e| Defect::new(format!("f({e})")));
    assert_eq!(squashed, Defect::new("f(boom)"));
    test_complete!("squash_interruptions_names_every_fiber");
}

#[test]
fn keep_defects_examples() {
    init_test("keep_defects_examples");
    let with_defect: Cause<&str> = Cause::then(Cause::fail("e"), Cause::die("d"));
    assert_eq!(with_defect.keep_defects(), Some(Cause::die("d")));

    let failures_only: Cause<&str> = Cause::then(Cause::fail("e1"), Cause::fail("e2"));
    assert_eq!(failures_only.keep_defects(), None);
    test_complete!("keep_defects_examples");
}

#[test]
fn interruptors_are_a_set() {
    init_test("interruptors_are_a_set");
    let cause: Cause<&str> = Cause::then_all([
        Cause::interrupt(fid(3)),
        Cause::both(Cause::interrupt(fid(3)), Cause::interrupt(fid(4))),
        Cause::fail("late"),
    ]);
    let interruptors = cause.interruptors();
    assert_eq!(interruptors.len(), 2);
    assert!(interruptors.contains(&fid(3)));
    assert!(interruptors.contains(&fid(4)));
    test_complete!("interruptors_are_a_set");
}

#[test]
fn exit_aggregation_keeps_every_failure() {
    init_test("exit_aggregation_keeps_every_failure");
    let exits: Vec<Exit<&str, u32>> = vec![
        Exit::succeed(1),
        Exit::fail("first"),
        Exit::interrupt(fid(7)),
        Exit::succeed(4),
    ];
    let collected = Exit::collect_all(exits).expect("non-empty input");
    let cause = collected.cause().expect("aggregate failed");
    assert_eq!(cause.failures(), vec![&"first"]);
    assert!(cause.is_interrupted());

    let result: Result<u32, FiberFailure<&str>> = Exit::fail("nope").into_result();
    let failure = result.expect_err("failed exit");
    assert_eq!(failure.cause().failure_option(), Some(&"nope"));
    test_complete!("exit_aggregation_keeps_every_failure");
}
