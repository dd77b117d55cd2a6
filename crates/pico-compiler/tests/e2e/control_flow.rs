//! Conditionals and loops

use super::{compile, expect_float, expect_int};

#[test]
fn test_if_else() {
    expect_int("if 1 < 2 10 else 20", 10);
    expect_int("x = 3\nif x > 5 10 else 20", 20);
}

#[test]
fn test_if_without_else_yields_zero() {
    expect_int("if 0 5", 0);
    expect_int("x = 0\nif x 5", 0);
}

#[test]
fn test_if_with_mixed_branch_types_is_float() {
    expect_float("x = 0\nif x 2.5 else 3", 3.0);
    expect_float("x = 0\nif x 3 else 2.5", 2.5);
    expect_float("x = 1\nif x 3 else 2.5", 3.0);
}

#[test]
fn test_if_with_mixed_branch_types_converts_the_int_branch() {
    let unit = compile("x = 0\nif x 3 else 2.5", false);
    assert!(unit.assembly.contains("CONVF"), "{}", unit.assembly);
    assert!(!unit.assembly.contains("CONVI"), "{}", unit.assembly);
}

#[test]
fn test_while_sum() {
    expect_int(
        "i = 0\ntotal = 0\nwhile i < 10 { total = total + i i = i + 1 }\ntotal",
        45,
    );
}

#[test]
fn test_while_yields_zero() {
    expect_int("i = 3\nwhile i { i = i - 1 }", 0);
}

#[test]
fn test_break_and_continue() {
    let source = "
        i = 0
        n = 0
        while i < 10 {
            i = i + 1
            if i == 3 { continue }
            if i > 6 { break }
            n = n + i
        }
        n
    ";
    expect_int(source, 18);
}

#[test]
fn test_break_and_continue_inside_operands() {
    expect_int(
        "i = 0\nwhile 1 { i = i + 1\n10 + (if i == 3 { break } else { 0 }) }\ni",
        3,
    );

    let source = "
        i = 0
        s = 0
        while i < 5 {
            i = i + 1
            s = s + (if i == 2 { continue } else { i })
        }
        s
    ";
    expect_int(source, 13);
}

#[test]
fn test_infinite_loop_with_break() {
    expect_int("i = 0\nwhile 1 { if i == 7 { break } i = i + 1 }\ni", 7);
}

#[test]
fn test_nested_loops() {
    let source = "
        count = 0
        i = 0
        while i < 4 {
            j = 0
            while j < i {
                count = count + 1
                j = j + 1
            }
            i = i + 1
        }
        count
    ";
    expect_int(source, 6);
}
