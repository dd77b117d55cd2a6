//! Calls, recursion and monomorphization

use super::{compile, expect_float, expect_int};

const FACT: &str = "def fact(n) if n < 2 1 else n * fact(n - 1)\n";

#[test]
fn test_recursive_factorial() {
    expect_int(&format!("{}fact(5)", FACT), 120);
    expect_int(&format!("{}fact(1)", FACT), 1);
}

#[test]
fn test_two_instances_of_one_definition() {
    let source = "def half(x) x / 2\na = half(3)\nb = half(3.0)\na + b";
    let unit = compile(source, true);
    assert_eq!(unit.functions, vec!["half@@i32", "half@@f32"]);
    expect_float(source, 2.5);
}

#[test]
fn test_repeated_calls_reuse_instances() {
    let source = "
        def id(x) x
        id(1) id(2.0) id(3) id(4.0)
    ";
    let unit = compile(source, false);
    assert_eq!(unit.functions, vec!["id@@i32", "id@@f32"]);
    assert_eq!(unit.assembly.matches("id@@i32:").count(), 1);
    assert_eq!(unit.assembly.matches("id@@f32:").count(), 1);
}

#[test]
fn test_uncalled_definition_is_not_emitted() {
    let unit = compile("def unused(a) a + 1\n42", true);
    assert!(unit.functions.is_empty());
    assert!(!unit.assembly.contains("unused"));
    expect_int("def unused(a) a + 1\n42", 42);
}

#[test]
fn test_zero_argument_call() {
    let unit = compile("def seven() 7\nseven()", true);
    assert_eq!(unit.functions, vec!["seven@@"]);
    expect_int("def seven() 7\nseven()", 7);
}

#[test]
fn test_call_before_definition() {
    expect_int("twice(21)\ndef twice(x) x * 2", 42);
}

#[test]
fn test_arguments_in_declaration_order() {
    expect_int("def sub(a, b) a - b\nsub(10, 3)", 7);
    expect_float("def mix(a, b) a + b\nmix(1, 0.5)", 1.5);
}

#[test]
fn test_return_type_from_another_instance() {
    let source = "
        def g(x) x * 2
        def f() g(1.5)
        f()
    ";
    expect_float(source, 3.0);
}

#[test]
fn test_loop_with_locals() {
    let source = "
        def sum_to(n) {
            total = 0
            while n > 0 {
                total = total + n
                n = n - 1
            }
            total
        }
        sum_to(4)
    ";
    expect_int(source, 10);
}

#[test]
fn test_return_from_inside_a_loop() {
    let source = "
        def first_square_over(limit) {
            i = 0
            while 1 {
                if i * i > limit { return i }
                i = i + 1
            }
        }
        first_square_over(50)
    ";
    expect_int(source, 8);
}

#[test]
fn test_tail_return() {
    expect_int("def inc(x) { return x + 1 }\ninc(41)", 42);
}

#[test]
fn test_return_from_inside_an_operand() {
    expect_int("def f(a) { 1 + (if a { return 5 } else { 2 }) }\nf(1) + f(0)", 8);
}

#[test]
fn test_return_from_inside_an_argument() {
    let source = "
        def add(x, y) x + y
        def g(a) add(10, if a { return 7 } else { 2 })
        g(1) + g(0)
    ";
    expect_int(source, 19);
}
