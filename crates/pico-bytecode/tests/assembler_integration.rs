//! Integration tests for the assembler

use pico_bytecode::{assemble, AsmError, Assembler};

#[test]
fn test_self_jump_is_one_relative_byte() {
    let assembly = assemble("start: JMP start", 0).unwrap();
    assert_eq!(assembly.bytes, vec![0xC0, 0xFF]);
    assert_eq!(assembly.labels["start"], 0);
}

#[test]
fn test_duplicate_label_ignores_case() {
    let err = assemble("loop: HLT\nLOOP: HLT", 0).unwrap_err();
    assert_eq!(
        err,
        AsmError::DuplicateLabel {
            line: 1,
            label: "LOOP".to_string()
        }
    );
}

#[test]
fn test_forward_distance_127_is_relative() {
    let assembly = assemble("JMP end\nRESB 126\nend: HLT", 0).unwrap();
    assert_eq!(assembly.bytes.len(), 129);
    assert_eq!(&assembly.bytes[..2], &[0xC0, 127]);
    assert_eq!(assembly.labels["end"], 128);
}

#[test]
fn test_forward_distance_128_stays_absolute() {
    let assembly = assemble("JMP end\nRESB 127\nend: HLT", 0).unwrap();
    assert_eq!(assembly.bytes.len(), 131);
    assert_eq!(&assembly.bytes[..3], &[0xC1, 130, 0x00]);
    assert_eq!(assembly.bytes[130], 0xFF);
}

#[test]
fn test_backward_distance_limits() {
    let near = assemble("start: RESB 127\nJMP start", 0).unwrap();
    assert_eq!(&near.bytes[127..], &[0xC0, 0x80]);

    let far = assemble("start: RESB 128\nJMP start", 0).unwrap();
    assert_eq!(&far.bytes[128..], &[0xC1, 0x00, 0x00]);
}

#[test]
fn test_shrink_reoffsets_later_labels() {
    let assembly = assemble("JMP far\nJMP near\nnear: RESB 200\nfar: HLT", 0).unwrap();
    assert_eq!(assembly.labels["near"], 5);
    assert_eq!(assembly.labels["far"], 205);
    assert_eq!(&assembly.bytes[..5], &[0xC1, 205, 0x00, 0xC0, 1]);
    assert_eq!(assembly.bytes.len(), 206);
}

#[test]
fn test_shrink_cascades() {
    let assembly = assemble("JMP end\nJMP mid\nmid: RESB 124\nend: HLT", 0).unwrap();
    assert_eq!(&assembly.bytes[..4], &[0xC0, 127, 0xC0, 1]);
    assert_eq!(assembly.labels["end"], 128);
    assert_eq!(
        assembly.line_mapping.iter().map(|(&at, &line)| (at, line)).collect::<Vec<_>>(),
        vec![(0, 0), (2, 1), (128, 3)]
    );
}

#[test]
fn test_origin_offsets_addresses() {
    let assembly = assemble("JMP data\nRESB 200\ndata: DB 1", 0x8000).unwrap();
    assert_eq!(assembly.labels["data"], 0x8000 + 203);
    assert_eq!(&assembly.bytes[..3], &[0xC1, 0xCB, 0x80]);
}

#[test]
fn test_undefined_label() {
    let err = assemble("\tHLT\n\tCALL missing", 0).unwrap_err();
    assert_eq!(
        err,
        AsmError::UndefinedLabel {
            line: 1,
            label: "missing".to_string()
        }
    );
}

#[test]
fn test_conditional_jumps() {
    let text = "top:\n\tJEQ top\n\tJNE top\n\tJLE top\n\tJGE top\n\tJLT top\n\tJGT top";
    let assembly = assemble(text, 0).unwrap();
    assert_eq!(
        assembly.bytes,
        vec![0xC2, 0xFF, 0xC4, 0xFD, 0xC6, 0xFB, 0xC8, 0xF9, 0xCA, 0xF7, 0xCC, 0xF5]
    );
}

#[test]
fn test_compiler_style_listing() {
    let text = "\
\tLOAD32 0    ; return slot
\tLOAD32 5
\tCALL fact@@i32
\tPOP32
\tHLT
fact@@i32:
\tLOAD32 [SFP + 4]    ; load n
\tLOAD32 1
\tSUB32
\tPOP32
\tJGT L@0
\tLOAD32 1
\tJMP L@1
L@0:
\tLOAD32 [SFP + 4]
L@1:
\tSTORE32 [SFP + 8]    ; return value
\tRET
";
    let assembly = assemble(text, 0).unwrap();
    let entry = assembly.labels["fact@@i32"];
    assert_eq!(entry, 15);
    assert_eq!(&assembly.bytes[10..13], &[0x40, 15, 0]);
    assert_eq!(*assembly.bytes.last().unwrap(), 0x42);
    assert_eq!(assembly.line_mapping[&entry], 6);
}

#[test]
fn test_line_by_line_assembler() {
    let mut assembler = Assembler::new(0);
    assembler.assemble_line(0, "main: LOAD 1").unwrap();
    assembler.assemble_line(1, "\tJMP main").unwrap();
    let assembly = assembler.finish().unwrap();
    assert_eq!(assembly.bytes, vec![0x0C, 0x01, 0xC0, 0xFD]);
}

#[test]
fn test_map_serializes_labels_and_lines() {
    let assembly = assemble("main: HLT", 0x10).unwrap();
    let json = serde_json::to_value(&assembly).unwrap();
    assert_eq!(json["origin"], 0x10);
    assert_eq!(json["labels"]["main"], 0x10);
    assert_eq!(json["line_mapping"]["16"], 0);
    assert!(json.get("bytes").is_none());
}
