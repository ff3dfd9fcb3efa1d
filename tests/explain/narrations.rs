//! Narration content: messages, placeholders, and highlight sets.

use pl0vm_explain::{Highlight, NarrationKind, explain};
use pl0vm_foundation::{DataModel, Opcode, Operation};
use pl0vm_machine::step;

use crate::program;

#[test]
fn opr_narration_orders_operands_like_the_engine() {
    let mut model = DataModel::new(64, 10);
    model.sp = model.stack.push(model.sp, &[5, 3]).unwrap();
    let prog = program(&[(Opcode::Opr, 0, Operation::Sub.code()), (Opcode::Ret, 0, 0)]);

    let narration = explain(&model, &prog, "");
    // %2 is the value below the top: 5 - 3, not 3 - 5.
    assert_eq!(narration.render(), "Subtracts the top two stack values (5 - 3)");
    assert_eq!(narration.placeholders[0].stack, vec![2]);
    assert_eq!(narration.placeholders[1].stack, vec![1]);
}

#[test]
fn lod_narration_highlights_the_level_trail() {
    let mut model = DataModel::new(64, 10);
    // A frame at cell 5 linking to the outermost frame.
    model.stack.set_cell(5, 0).unwrap();
    model.base = 5;
    model.sp = 5;
    let prog = program(&[(Opcode::Lod, 1, 2), (Opcode::Ret, 0, 0)]);

    let narration = explain(&model, &prog, "");
    assert_eq!(narration.kind, NarrationKind::Describe);
    let level = &narration.placeholders[0];
    assert!(level.level);
    assert_eq!(level.stack, vec![5, 0]);
    // Resolved base 0 + parameter 2.
    assert_eq!(narration.placeholders[2].value, 2);
    assert_eq!(narration.placeholders[2].stack, vec![2]);
}

#[test]
fn cal_narration_names_the_whole_linkage() {
    let model = DataModel::new(64, 10);
    let prog = program(&[(Opcode::Cal, 0, 2), (Opcode::Ret, 0, 0), (Opcode::Ret, 0, 0)]);

    let narration = explain(&model, &prog, "");
    assert_eq!(
        narration.render(),
        "Jumps to instruction 2 and opens a frame with return address 1, dynamic base 0, and static base 0"
    );
    assert_eq!(narration.placeholders[0].instructions, vec![2]);
    assert!(narration.placeholders[0].parameter);
}

#[test]
fn new_narration_highlights_the_predicted_block() {
    let mut model = DataModel::new(64, 10);
    model.sp = model.stack.push(model.sp, &[3]).unwrap();
    let prog = program(&[(Opcode::New, 0, 0), (Opcode::Ret, 0, 0)]);

    let narration = explain(&model, &prog, "");
    let block = &narration.placeholders[1];
    assert_eq!(block.highlight, Highlight::Background);
    assert_eq!(block.heap, vec![0, 1, 2]);
}

#[test]
fn del_narration_reports_the_block_before_coalescing() {
    let mut model = DataModel::new(64, 10);
    let setup = program(&[(Opcode::Lit, 0, 4), (Opcode::New, 0, 0)]);
    step(&mut model, &setup, "").unwrap();
    step(&mut model, &setup, "").unwrap();
    model.pc = 0;

    let prog = program(&[(Opcode::Del, 0, 0), (Opcode::Ret, 0, 0)]);
    let narration = explain(&model, &prog, "");
    assert_eq!(narration.render(), "Frees 4 cells starting at address 0");
    assert_eq!(narration.placeholders[1].heap, vec![0, 1, 2, 3]);
}

#[test]
fn wri_narration_marks_the_output_pane() {
    let mut model = DataModel::new(64, 10);
    model.sp = model.stack.push(model.sp, &[66]).unwrap();
    let prog = program(&[(Opcode::Wri, 0, 0), (Opcode::Ret, 0, 0)]);

    let narration = explain(&model, &prog, "");
    assert!(narration.placeholders[0].output);
    assert!(!narration.placeholders[0].input);
}

#[test]
fn rea_narration_marks_the_input_pane() {
    let model = DataModel::new(64, 10);
    let prog = program(&[(Opcode::Rea, 0, 0), (Opcode::Ret, 0, 0)]);

    let narration = explain(&model, &prog, "Q");
    assert!(narration.placeholders[0].input);
    assert_eq!(narration.render(), "Reads the next input character (code 81) and pushes it onto the stack");
}

#[test]
fn fault_narrations_never_panic_and_state_the_fault() {
    let model = DataModel::new(64, 10);
    let prog = program(&[(Opcode::Jmp, 0, 40)]);
    let narration = explain(&model, &prog, "");
    assert!(narration.is_fault());
    assert_eq!(narration.render(), "Jumps to instruction 40, which does not exist");
}

#[test]
fn level_too_deep_narration_is_terminal_text() {
    let model = DataModel::new(64, 10);
    let prog = program(&[(Opcode::Lod, 9, 0)]);
    let narration = explain(&model, &prog, "");
    assert!(narration.is_fault());
    assert!(narration.render().contains("level is too deep"));
}

#[test]
fn last_fall_through_instruction_narrates_the_end() {
    let mut model = DataModel::new(64, 10);
    model.sp = model.stack.push(model.sp, &[1]).unwrap();
    let prog = program(&[(Opcode::Wri, 0, 0)]);
    let narration = explain(&model, &prog, "");
    assert!(narration.ends);
    assert!(!narration.is_fault());
}
