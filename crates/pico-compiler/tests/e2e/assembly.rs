//! Compiled output fed through the assembler

use super::compile;
use pico_bytecode::assemble;
use pico_compiler::{CompileOptions, Compiler, Optimizer};

const PROGRAMS: &[&str] = &[
    "1 + 2",
    "def fact(n) if n < 2 1 else n * fact(n - 1)\nx = fact(5)",
    "i = 0\nwhile 1 { if i == 7 { break } i = i + 1 }\ni",
    "def half(x) x / 2\nhalf(3) + half(3.0)",
    "y = 2.5\n(-y) * 4",
];

#[test]
fn test_compiled_programs_assemble() {
    for source in PROGRAMS {
        for optimize in [true, false] {
            let unit = compile(source, optimize);
            if let Err(err) = assemble(&unit.assembly, 0) {
                panic!("{}\n{}", err, unit.assembly);
            }
        }
    }
}

#[test]
fn test_literal_sum_bytes() {
    let unit = compile("1 + 2", true);
    let image = assemble(&unit.assembly, 0).unwrap();
    assert_eq!(image.bytes, vec![0x0E, 3, 0, 0, 0, 0xFF]);
}

#[test]
fn test_function_labels_are_exported() {
    let unit = compile(PROGRAMS[1], true);
    let image = assemble(&unit.assembly, 0x100).unwrap();
    assert!(image.labels.contains_key("fact@@i32"));
    assert!(image.labels["x@g0"] as usize >= 0x100 + image.bytes.len());
}

#[test]
fn test_globals_differing_in_case_assemble() {
    for optimize in [true, false] {
        let unit = compile("a = 1\nA = 2\na + A", optimize);
        let image = assemble(&unit.assembly, 0).unwrap();
        assert!(image.labels.contains_key("a@g0"));
        assert!(image.labels.contains_key("A@g1"));
    }
}

#[test]
fn test_global_named_sfp_uses_absolute_addressing() {
    let unit = compile("SFP = 7\nSFP", true);
    let image = assemble(&unit.assembly, 0).unwrap();
    let cell = image.labels["SFP@g0"] as u8;
    // LOAD32 7; STORE32 [SFP@g0]; LOAD32 [SFP@g0]; HLT
    assert_eq!(
        image.bytes,
        vec![0x0E, 7, 0, 0, 0, 0x12, cell, 0, 0x02, cell, 0, 0xFF]
    );
    assert_eq!(cell, 12);
}

#[test]
fn test_inline_assembly_passes_through() {
    let unit = compile("__asm__ \"YIELD\"\n1", true);
    assert!(unit.assembly.starts_with("YIELD\n"));
    let image = assemble(&unit.assembly, 0).unwrap();
    assert_eq!(image.bytes, vec![0xFE, 0x0E, 1, 0, 0, 0, 0xFF]);
}

#[test]
fn test_float_immediates_are_bit_patterns() {
    let unit = compile("y = 1.5\ny", true);
    assert!(unit.assembly.contains("LOAD32 0x3FC00000    ; 1.5"));
    let image = assemble(&unit.assembly, 0).unwrap();
    assert_eq!(&image.bytes[..5], &[0x0E, 0x00, 0x00, 0xC0, 0x3F]);
}

#[test]
fn test_optimizing_finished_output_is_a_no_op() {
    let compiler = Compiler::new(CompileOptions::default());
    for source in PROGRAMS {
        let mut unit = compiler.compile_unit(source, "test.pico").unwrap();
        let before = unit.program.clone();
        let stats = Optimizer::new().optimize(&mut unit.program).clone();
        assert_eq!(stats.total_rewrites(), 0, "source: {}", source);
        let ops = |p: &pico_compiler::IrProgram| {
            p.iter().map(|id| p.get(id).clone()).collect::<Vec<_>>()
        };
        assert_eq!(ops(&before), ops(&unit.program));
    }
}
