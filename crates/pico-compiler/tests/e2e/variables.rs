//! Globals, locals and assignment typing

use super::{compile, expect_int, run};

#[test]
fn test_globals_hold_their_values() {
    let outcome = run("x = 5\ny = x * 2\ny + 1");
    assert_eq!(outcome.int(), 11);
    assert_eq!(outcome.globals["x@g0"], 5);
    assert_eq!(outcome.globals["y@g1"], 10);
}

#[test]
fn test_first_assignment_fixes_the_type() {
    expect_int("x = 1\nx = 2.75\nx", 2);

    let unit = compile("x = 1\nx = 2.75\nx", false);
    assert!(unit.assembly.contains("CONVI"));
}

#[test]
fn test_assignment_is_an_expression() {
    expect_int("a = b = 4\na + b", 8);
}

#[test]
fn test_globals_are_reserved_once() {
    let unit = compile("x = 1\nx = x + 1\nx", true);
    assert_eq!(unit.assembly.matches("RESD 1").count(), 1);
    assert!(unit.assembly.ends_with("x@g0: RESD 1\n"));
}

#[test]
fn test_globals_differing_in_case_are_distinct() {
    let outcome = run("a = 1\nA = 2\na + A");
    assert_eq!(outcome.int(), 3);
    assert_eq!(outcome.globals["a@g0"], 1);
    assert_eq!(outcome.globals["A@g1"], 2);
}

#[test]
fn test_global_named_like_the_frame_register() {
    expect_int("SFP = 7\nSFP", 7);
    let unit = compile("sfp = 7\nsfp", true);
    assert!(unit.assembly.contains("[sfp@g0]"), "{}", unit.assembly);
    assert!(!unit.assembly.contains("[sfp]"));
}

#[test]
fn test_function_locals_live_on_the_stack() {
    let unit = compile("def f(a) { b = a * 2 b + 1 }\nf(3)", false);
    assert!(unit.assembly.contains("[SFP - 4]"));
    assert!(unit.assembly.contains("[SFP + 4]"));
    assert!(!unit.assembly.contains("RESD"));
    expect_int("def f(a) { b = a * 2 b + 1 }\nf(3)", 7);
}
