//! Integration tests for the `picoc` and `picoasm` binaries.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn picoc(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_picoc"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("PICO_LOG")
        .output()
        .expect("failed to spawn picoc")
}

fn picoasm(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_picoasm"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("PICO_LOG")
        .output()
        .expect("failed to spawn picoasm")
}

fn write(dir: &TempDir, name: &str, text: &str) {
    std::fs::write(dir.path().join(name), text).expect("write fixture");
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ============================================================================
// picoc
// ============================================================================

#[test]
fn test_picoc_asm_to_stdout() {
    let dir = TempDir::new().unwrap();
    write(&dir, "sum.pico", "1 + 2\n");

    let out = picoc(dir.path(), &["-s", "--asm", "sum.pico"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "\tLOAD32 3\n\tHLT\n");
}

#[test]
fn test_picoc_default_output_is_a_hex() {
    let dir = TempDir::new().unwrap();
    write(&dir, "sum.pico", "1 + 2\n");

    let out = picoc(dir.path(), &["sum.pico"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let image = std::fs::read(dir.path().join("a.hex")).unwrap();
    assert_eq!(image, vec![0x0E, 3, 0, 0, 0, 0xFF]);
}

#[test]
fn test_picoc_asm_default_output_is_out_asm() {
    let dir = TempDir::new().unwrap();
    write(&dir, "sum.pico", "1 + 2\n");

    let out = picoc(dir.path(), &["--asm", "sum.pico"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = std::fs::read_to_string(dir.path().join("out.asm")).unwrap();
    assert_eq!(text, "\tLOAD32 3\n\tHLT\n");
    assert!(!dir.path().join("a.hex").exists());
}

#[test]
fn test_picoc_output_and_map() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fact.pico", "def fact(n) if n < 2 1 else n * fact(n - 1)\nfact(5)\n");

    let out = picoc(dir.path(), &["-o", "fact.bin", "--map", "fact.json", "fact.pico"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(!std::fs::read(dir.path().join("fact.bin")).unwrap().is_empty());

    let map: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("fact.json")).unwrap())
            .unwrap();
    assert!(map["labels"]["fact@@i32"].is_u64());
    assert!(map["line_mapping"].is_object());
}

#[test]
fn test_picoc_reports_semantic_error() {
    let dir = TempDir::new().unwrap();
    write(&dir, "bad.pico", "1 + missing\n");

    let out = picoc(dir.path(), &["bad.pico"]);
    assert!(!out.status.success());
    let err = stderr(&out);
    assert!(err.contains("unknown identifier"), "stderr: {}", err);
    assert!(err.contains("bad.pico"), "stderr: {}", err);
    assert!(!dir.path().join("a.hex").exists());
}

#[test]
fn test_picoc_concatenates_sources() {
    let dir = TempDir::new().unwrap();
    write(&dir, "lib.pico", "def twice(x) x + x");
    write(&dir, "main.pico", "twice(21)\n");

    let out = picoc(dir.path(), &["-s", "--asm", "lib.pico", "main.pico"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("twice@@i32:"), "assembly: {}", text);
}

#[test]
fn test_picoc_error_points_at_second_file() {
    let dir = TempDir::new().unwrap();
    write(&dir, "lib.pico", "def twice(x) x + x\n");
    write(&dir, "main.pico", "twice(nothing)\n");

    let out = picoc(dir.path(), &["lib.pico", "main.pico"]);
    assert!(!out.status.success());
    let err = stderr(&out);
    assert!(err.contains("main.pico:1:"), "stderr: {}", err);
}

#[test]
fn test_picoc_no_opt_keeps_arithmetic() {
    let dir = TempDir::new().unwrap();
    write(&dir, "sum.pico", "1 + 2\n");

    let out = picoc(dir.path(), &["-s", "--asm", "--no-opt", "sum.pico"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(String::from_utf8_lossy(&out.stdout).contains("\tADD32\n"));
}

#[test]
fn test_picoc_missing_file() {
    let dir = TempDir::new().unwrap();
    let out = picoc(dir.path(), &["absent.pico"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("failed to read absent.pico"));
}

// ============================================================================
// picoasm
// ============================================================================

#[test]
fn test_picoasm_to_stdout() {
    let dir = TempDir::new().unwrap();
    write(&dir, "loop.asm", "start: JMP start\n");

    let out = picoasm(dir.path(), &["-s", "loop.asm"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(out.stdout, vec![0xC0, 0xFF]);
}

#[test]
fn test_picoasm_duplicate_label_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write(&dir, "dup.asm", "loop: HLT\nLOOP: HLT\n");

    let out = picoasm(dir.path(), &["dup.asm"]);
    assert!(!out.status.success());
    let err = stderr(&out);
    assert!(err.contains("dup.asm"), "stderr: {}", err);
    assert!(!dir.path().join("a.hex").exists());
}

#[test]
fn test_picoasm_origin_shifts_labels() {
    let dir = TempDir::new().unwrap();
    write(&dir, "loop.asm", "start: JMP start\n");

    let out = picoasm(
        dir.path(),
        &["--origin", "0x100", "--map", "map.json", "-o", "loop.bin", "loop.asm"],
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let map: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("map.json")).unwrap())
            .unwrap();
    assert_eq!(map["labels"]["start"], 0x100);
    assert_eq!(std::fs::read(dir.path().join("loop.bin")).unwrap(), vec![0xC0, 0xFF]);
}

#[test]
fn test_picoasm_rejects_bad_origin() {
    let dir = TempDir::new().unwrap();
    write(&dir, "loop.asm", "start: JMP start\n");

    let out = picoasm(dir.path(), &["--origin", "0x10000", "loop.asm"]);
    assert!(!out.status.success());
}
