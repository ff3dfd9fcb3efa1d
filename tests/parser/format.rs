//! The four-column format and the validation contract, end to end.

use pl0vm_foundation::Opcode;
use pl0vm_parser::parse_program;

#[test]
fn a_full_program_round_trips() {
    let source = "\
0 INT 0 1
1 LIT 0 3
2 STO 0 1
3 LOD 0 1
4 JMC 0 7
5 LIT 0 42
6 WRI 0 0
7 RET 0 0";
    let outcome = parse_program(source);
    assert!(outcome.is_ok());
    assert_eq!(outcome.instructions.len(), 8);
    // Display reproduces the source line for each instruction.
    let rendered: Vec<String> = outcome
        .instructions
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(rendered.join("\n"), source);
}

#[test]
fn every_mnemonic_parses() {
    let source = "\
0 LIT 0 1
1 OPR 0 2
2 LOD 1 3
3 STO 1 3
4 CAL 2 0
5 INT 0 3
6 JMP 0 0
7 JMC 0 0
8 RET 0 0
9 REA 0 0
10 WRI 0 0
11 NEW 0 0
12 DEL 0 0
13 LDA 0 0
14 STA 0 0
15 PLD 0 0
16 PST 0 0";
    let outcome = parse_program(source);
    assert!(outcome.is_ok(), "{:?}", outcome.validation_errors);
    assert_eq!(outcome.instructions.len(), Opcode::ALL.len());
    for (instruction, opcode) in outcome.instructions.iter().zip(Opcode::ALL) {
        assert_eq!(instruction.opcode, opcode);
    }
}

#[test]
fn parse_and_validation_errors_are_reported_separately() {
    // Line 1 is malformed; with any parse error no validation runs.
    let outcome = parse_program("0 LIT 0 5\n1 LIT zero");
    assert_eq!(outcome.parse_errors.len(), 1);
    assert!(outcome.validation_errors.is_empty());
    assert!(outcome.instructions.is_empty());

    // Clean parse, two constraint violations.
    let outcome = parse_program("0 LIT 1 5\n1 OPR 0 20");
    assert!(outcome.parse_errors.is_empty());
    assert_eq!(outcome.validation_errors.len(), 2);
    assert_eq!(outcome.instructions.len(), 2);
    assert!(!outcome.is_ok());
}

#[test]
fn misnumbered_programs_are_rejected() {
    let outcome = parse_program("0 LIT 0 5\n2 RET 0 0");
    assert_eq!(outcome.validation_errors.len(), 1);
    assert_eq!(outcome.validation_errors[0].line, 1);
}

#[test]
fn negative_parameters_are_allowed_where_meaningful() {
    // INT may shrink; LIT may push negatives.
    let outcome = parse_program("0 LIT 0 -9\n1 INT 0 -1\n2 RET 0 0");
    assert!(outcome.is_ok());
    assert_eq!(outcome.instructions[0].parameter, -9);
    assert_eq!(outcome.instructions[1].parameter, -1);
}

#[test]
fn whitespace_is_flexible() {
    let outcome = parse_program("  0   LIT\t0    5  \n1 RET 0 0");
    assert!(outcome.is_ok());
    assert_eq!(outcome.instructions[0].parameter, 5);
}
