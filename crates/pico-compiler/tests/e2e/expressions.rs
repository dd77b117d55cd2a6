//! Arithmetic, comparison and unary operators

use super::{compile, expect_float, expect_int};

#[test]
fn test_literal_sum_folds_to_one_load() {
    let unit = compile("1 + 2", true);
    assert_eq!(unit.assembly, "\tLOAD32 3\n\tHLT\n");
    assert!(!unit.assembly.contains("ADD32"));
}

#[test]
fn test_unoptimized_sum_keeps_the_add() {
    let unit = compile("1 + 2", false);
    assert!(unit.assembly.contains("\tADD32\n"));
    expect_int("1 + 2", 3);
}

#[test]
fn test_integer_arithmetic() {
    expect_int("2 * 3 + 4 * 5", 26);
    expect_int("(2 + 3) * 4", 20);
    expect_int("10 - 4 - 3", 3);
    expect_int("10 / 3", 3);
    expect_int("-7 / 2", -3);
}

#[test]
fn test_float_promotion() {
    expect_float("1.5 * 2", 3.0);
    expect_float("1 + .25", 1.25);
    expect_float("7 / 2.0", 3.5);
}

#[test]
fn test_comparisons_yield_zero_or_one() {
    expect_int("3 < 5", 1);
    expect_int("5 < 3", 0);
    expect_int("2 == 2", 1);
    expect_int("2 != 2", 0);
    expect_int("4 >= 4", 1);
    expect_int("4 <= 3", 0);
    expect_int("1.5 > 1.0", 1);
}

#[test]
fn test_comparison_over_variables() {
    expect_int("a = 3\nb = 5\na < b", 1);
    expect_int("a = 3\nb = 5\na > b", 0);
    expect_int("a = 2.5\nb = 2\na > b", 1);
}

#[test]
fn test_unary_operators() {
    expect_int("x = 5\n(-x) + !0", -4);
    expect_int("x = 5\n!x", 0);
    expect_int("+3", 3);
    expect_float("y = 2.5\n(-y)", -2.5);
}

#[test]
fn test_newlines_do_not_end_expressions() {
    // `5` and `- 2` on separate lines are one subtraction
    expect_int("x = 5\n- 2\nx", 3);
}

#[test]
fn test_character_literal_is_its_code_point() {
    expect_int("'A' + 1", 66);
}
