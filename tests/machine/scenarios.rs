//! The canonical stepping scenarios, end to end.

use pl0vm_foundation::{DataModel, StackFrame};
use pl0vm_machine::step;

use crate::{load, run};

#[test]
fn arithmetic_scenario() {
    // Stack [5, 3], OPR SUB computes 5 - 3 and leaves [2].
    let mut model = DataModel::new(64, 10);
    let program = load("0 LIT 0 5\n1 LIT 0 3\n2 OPR 0 3\n3 RET 0 0");

    step(&mut model, &program, "").unwrap();
    step(&mut model, &program, "").unwrap();
    assert_eq!(model.sp, 2);

    step(&mut model, &program, "").unwrap();
    assert_eq!(model.sp, 1);
    assert_eq!(model.stack.cell(1).unwrap(), 2);
}

#[test]
fn call_return_scenario() {
    // CAL 0 3 from the initial state pushes the linkage triple (0, 0, 1),
    // opens a frame at cell 1, and jumps; RET unwinds it again.
    let mut model = DataModel::new(64, 10);
    let program = load("0 CAL 0 3\n1 RET 0 0\n2 RET 0 0\n3 RET 0 0");

    let outcome = step(&mut model, &program, "").unwrap();
    assert!(!outcome.ended);
    assert_eq!(model.base, 1);
    assert_eq!(model.pc, 3);
    assert_eq!(
        (
            model.stack.cell(1).unwrap(),
            model.stack.cell(2).unwrap(),
            model.stack.cell(3).unwrap(),
        ),
        (0, 0, 1)
    );
    assert_eq!(
        model.stack.current_frame(),
        &StackFrame { index: 1, size: 0 }
    );

    // RET at base 1 restores pc = 1, base = 0, sp = 0.
    let outcome = step(&mut model, &program, "").unwrap();
    assert!(!outcome.ended);
    assert_eq!(model.pc, 1);
    assert_eq!(model.base, 0);
    assert_eq!(model.sp, 0);

    // The next RET is at the outermost frame and ends the program.
    let outcome = step(&mut model, &program, "").unwrap();
    assert!(outcome.ended);
}

#[test]
fn heap_scenario() {
    // NEW 4 on a 10-cell heap allocates [0,4) and pushes 0; DEL 0 returns
    // the partition to a single free block.
    let mut model = DataModel::new(64, 10);
    let program = load("0 LIT 0 4\n1 NEW 0 0\n2 DEL 0 0\n3 RET 0 0");

    step(&mut model, &program, "").unwrap();
    let outcome = step(&mut model, &program, "").unwrap();
    assert!(outcome.warnings.is_empty());
    assert_eq!(model.stack.cell(model.sp).unwrap(), 0);
    assert_eq!(model.heap.blocks.len(), 2);
    assert!(!model.heap.blocks[0].free);
    assert_eq!(model.heap.blocks[0].size, 4);
    assert!(model.heap.blocks[1].free);
    assert_eq!(model.heap.blocks[1].size, 6);

    // DEL consumes the pushed address.
    let outcome = step(&mut model, &program, "").unwrap();
    assert!(outcome.warnings.is_empty());
    assert_eq!(model.heap.blocks.len(), 1);
    assert!(model.heap.blocks[0].free);
    assert_eq!(model.heap.blocks[0].size, 10);
}

#[test]
fn io_scenario() {
    // REA on input "A" pushes 65; WRI pops it and writes "A".
    let mut model = DataModel::new(64, 10);
    let program = load("0 REA 0 0\n1 WRI 0 0\n2 RET 0 0");

    let outcome = step(&mut model, &program, "A").unwrap();
    assert_eq!(outcome.remaining_input, "");
    assert_eq!(model.stack.cell(model.sp).unwrap(), 65);

    let outcome = step(&mut model, &program, &outcome.remaining_input).unwrap();
    assert_eq!(outcome.output, "A");
    assert_eq!(model.output, "A");
}

#[test]
fn countdown_program_runs_to_completion() {
    // Stores 3 in a local, decrements to 0, writing '*' each iteration.
    let source = "\
0 INT 0 1
1 LIT 0 3
2 STO 0 1
3 LOD 0 1
4 JMC 0 11
5 LIT 0 42
6 WRI 0 0
7 LOD 0 1
8 LIT 0 1
9 OPR 0 3
10 JMP 0 2
11 RET 0 0";
    let mut model = DataModel::new(64, 10);
    let program = load(source);
    let _ = run(&mut model, &program, "").unwrap();
    assert_eq!(model.output, "***");
    assert_eq!(model.sp, 1);
}
