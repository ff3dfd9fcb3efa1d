//! The explanation generator: a pure shadow of the execution engine.
//!
//! [`explain`] re-derives the addresses, operands, and would-be results for
//! the instruction at the current program counter, using the same probe
//! helpers the engine executes through (`find_base_trail`, the allocator
//! probes, the stack cell accessors). Every fault the engine can raise is
//! detected here first and turned into a fault narration; this function
//! never errors and never mutates the model.

#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]

use pl0vm_foundation::{DataModel, ErrorKind, Instruction, Opcode, Operation, Stack};
use pl0vm_machine::allocator::{self, HeapAccessError};
use pl0vm_machine::frame::find_base_trail;

use crate::narration::{Narration, Placeholder};

/// Unwraps an engine derivation or returns its fault narration.
macro_rules! probe {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => return Narration::from_error(&err.kind),
        }
    };
}

/// Explains the instruction at `model.pc` without executing it.
///
/// The narration mirrors the engine exactly: it reports a fault if and only
/// if [`pl0vm_machine::step`] on the same state would fault, and the
/// addresses in its placeholders are the cells the engine would touch.
#[must_use]
pub fn explain(model: &DataModel, instructions: &[Instruction], input: &str) -> Narration {
    let Some(instruction) = instructions.get(model.pc) else {
        return Narration::from_error(&ErrorKind::NoInstruction {
            pc: model.pc,
            program_len: instructions.len(),
        });
    };

    let level = instruction.level;
    let parameter = instruction.parameter;
    let program_len = instructions.len();
    let stack = &model.stack;
    let heap = &model.heap;
    let sp = model.sp;

    let narration = match instruction.opcode {
        Opcode::Lit => {
            if !stack.fits(sp + 1) {
                return overflow(stack);
            }
            Narration::describe("Pushes %1 onto the top of the stack")
                .with(Placeholder::bold(1, parameter).marks_parameter())
        }
        Opcode::Opr => explain_operation(stack, parameter, sp),
        Opcode::Lod => {
            let trail = probe!(find_base_trail(stack, model.base, level));
            let resolved = *trail.last().expect("trail is never empty");
            let address = resolved + parameter;
            let value = probe!(stack.cell(address));
            if !stack.fits(sp + 1) {
                return overflow(stack);
            }
            Narration::describe(
                "Loads the value at level %1, address %2 (stack index %3, value %4) and pushes it onto the top",
            )
            .with(Placeholder::bold(1, level).marks_level().on_stack(trail))
            .with(Placeholder::bold(2, parameter).marks_parameter())
            .with(Placeholder::bold(3, address).on_stack([address]))
            .with(Placeholder::bold(4, value).on_stack([address]))
        }
        Opcode::Sto => {
            let trail = probe!(find_base_trail(stack, model.base, level));
            let resolved = *trail.last().expect("trail is never empty");
            let address = resolved + parameter;
            let top = probe!(stack.peek(sp, 1))[0];
            probe!(stack.cell(address));
            Narration::describe(
                "Stores the value on top of the stack (%1) at level %2, address %3 (stack index %4)",
            )
            .with(Placeholder::bold(1, top).on_stack([sp]))
            .with(Placeholder::bold(2, level).marks_level().on_stack(trail))
            .with(Placeholder::bold(3, parameter).marks_parameter())
            .with(Placeholder::bold(4, address).on_stack([address]))
        }
        Opcode::Cal => {
            let Some(target) = valid_target(parameter, program_len) else {
                return Narration::fault("Call target %1 is outside the program")
                    .with(Placeholder::bold(1, parameter).marks_parameter());
            };
            let trail = probe!(find_base_trail(stack, model.base, level));
            let static_link = *trail.last().expect("trail is never empty");
            if !stack.fits(sp + 3) {
                return overflow(stack);
            }
            Narration::describe(
                "Jumps to instruction %1 and opens a frame with return address %2, dynamic base %3, and static base %4",
            )
            .with(
                Placeholder::bold(1, parameter)
                    .marks_parameter()
                    .on_instruction(target),
            )
            .with(Placeholder::bold(2, model.pc as i64 + 1))
            .with(Placeholder::bold(3, model.base).on_stack([model.base]))
            .with(Placeholder::bold(4, static_link).on_stack(trail))
        }
        Opcode::Int => {
            let new_sp = sp + parameter;
            if parameter >= 0 {
                if new_sp >= 0 && !stack.fits(new_sp) {
                    return overflow(stack);
                }
                Narration::describe("Raises the top of the stack by %1")
                    .with(Placeholder::bold(1, parameter).marks_parameter())
            } else {
                let frame_start = stack.current_frame().index;
                if new_sp < frame_start - 1 || new_sp < -1 {
                    return Narration::from_error(&ErrorKind::InvalidShrink { target: new_sp });
                }
                Narration::describe("Lowers the top of the stack by %1")
                    .with(Placeholder::bold(1, -parameter).marks_parameter())
            }
        }
        Opcode::Jmp => match valid_target(parameter, program_len) {
            Some(target) => Narration::describe("Jumps to instruction %1").with(
                Placeholder::bold(1, parameter)
                    .marks_parameter()
                    .on_instruction(target),
            ),
            None => Narration::fault("Jumps to instruction %1, which does not exist")
                .with(Placeholder::bold(1, parameter).marks_parameter()),
        },
        Opcode::Jmc => {
            let top = probe!(stack.peek(sp, 1))[0];
            if top == 0 {
                match valid_target(parameter, program_len) {
                    Some(target) => Narration::describe(
                        "The top of the stack is %1, so execution jumps to instruction %2",
                    )
                    .with(Placeholder::bold(1, top).on_stack([sp]))
                    .with(
                        Placeholder::bold(2, parameter)
                            .marks_parameter()
                            .on_instruction(target),
                    ),
                    None => Narration::fault(
                        "The top of the stack is %1, but the jump would go to instruction %2, which does not exist",
                    )
                    .with(Placeholder::bold(1, top).on_stack([sp]))
                    .with(Placeholder::bold(2, parameter).marks_parameter()),
                }
            } else if model.pc + 1 >= program_len {
                Narration::describe(
                    "The top of the stack is %1, the jump is not taken, and no next instruction exists",
                )
                .with(Placeholder::bold(1, top).on_stack([sp]))
                .ending()
            } else {
                Narration::describe("The top of the stack is %1, so the jump is not taken")
                    .with(Placeholder::bold(1, top).on_stack([sp]))
            }
        }
        Opcode::Ret => {
            if model.base == 0 {
                return Narration::describe("End of the program").ending();
            }
            let linkage = probe!(stack.peek(model.base + 2, 2));
            let (return_pc, dynamic_base) = (linkage[0], linkage[1]);
            if return_pc < 0 {
                return Narration::from_error(&ErrorKind::JumpOutOfRange {
                    target: return_pc,
                    program_len,
                });
            }
            if stack.frames.len() < 2 {
                return Narration::from_error(&ErrorKind::Internal(String::new()));
            }
            let mut first = Placeholder::bold(1, return_pc).on_stack([model.base + 2]);
            if (return_pc as usize) < program_len {
                first = first.on_instruction(return_pc as usize);
            }
            let narration = Narration::describe(
                "Removes the frame, jumps to instruction %1, restores the dynamic base %2, and sets the stack top to %3",
            )
            .with(first)
            .with(Placeholder::bold(2, dynamic_base).on_stack([model.base + 1]))
            .with(Placeholder::bold(3, model.base - 1).on_stack([model.base - 1]));
            if return_pc as usize >= program_len {
                narration.ending()
            } else {
                narration
            }
        }
        Opcode::Rea => {
            let Some(ch) = input.chars().next() else {
                return Narration::from_error(&ErrorKind::InputExhausted);
            };
            if !stack.fits(sp + 1) {
                return overflow(stack);
            }
            Narration::describe("Reads the next input character (code %1) and pushes it onto the stack")
                .with(Placeholder::bold(1, i64::from(u32::from(ch))).marks_input())
        }
        Opcode::Wri => {
            let top = probe!(stack.peek(sp, 1))[0];
            if !(0..=255).contains(&top) {
                return Narration::fault(
                    "The value on top of the stack (%1) is not an unsigned byte",
                )
                .with(Placeholder::bold(1, top).on_stack([sp]));
            }
            Narration::describe(
                "Writes the value on top of the stack (%1) to the output as a character",
            )
            .with(Placeholder::bold(1, top).on_stack([sp]).marks_output())
        }
        Opcode::New => {
            let count = probe!(stack.peek(sp, 1))[0];
            let requested = Placeholder::bold(1, count).on_stack([sp]);
            if count <= 0 || count > heap.capacity as i64 {
                Narration::describe(
                    "Attempts to allocate %1 heap cells, which is not a valid count; -1 is pushed instead",
                )
                .with(requested)
            } else {
                match allocator::first_fit(heap, count as usize) {
                    Some(address) => Narration::describe(
                        "Allocates %1 heap cells starting at address %2, and pushes %2",
                    )
                    .with(requested)
                    .with(
                        Placeholder::background(2, address as i64)
                            .on_heap(address..address + count as usize),
                    ),
                    None => Narration::describe(
                        "Attempts to allocate %1 heap cells, but no free block is large enough; -1 is pushed instead",
                    )
                    .with(requested),
                }
            }
        }
        Opcode::Del => {
            let address = probe!(stack.peek(sp, 1))[0];
            match allocator::free_target(heap, address) {
                Some(block) => Narration::describe("Frees %1 cells starting at address %2")
                    .with(Placeholder::bold(1, block.size as i64))
                    .with(
                        Placeholder::background(2, block.index as i64)
                            .on_heap(block.index..block.index + block.size),
                    ),
                None => Narration::describe("No allocated block starts at address %1")
                    .with(Placeholder::bold(1, address).on_stack([sp])),
            }
        }
        Opcode::Lda => {
            let address = probe!(stack.peek(sp, 1))[0];
            match allocator::read_cell(heap, address) {
                Ok(value) => Narration::describe(
                    "Pushes the value at heap address %1 (%2) onto the top of the stack",
                )
                .with(
                    Placeholder::background(1, address)
                        .on_stack([sp])
                        .on_heap([address as usize]),
                )
                .with(Placeholder::bold(2, value)),
                Err(HeapAccessError::OutOfRange { .. }) => {
                    Narration::fault("Address %1 is outside the heap")
                        .with(Placeholder::bold(1, address).on_stack([sp]))
                }
                Err(HeapAccessError::Unallocated { .. }) => {
                    Narration::fault("Address %1 is not allocated").with(
                        Placeholder::background(1, address)
                            .on_stack([sp])
                            .on_heap([address as usize]),
                    )
                }
            }
        }
        Opcode::Sta => {
            let operands = probe!(stack.peek(sp, 2));
            let (value, address) = (operands[0], operands[1]);
            match allocator::write_status(heap, address) {
                Ok(()) => Narration::describe("Stores the value %1 at heap address %2")
                    .with(Placeholder::bold(1, value).on_stack([sp]))
                    .with(
                        Placeholder::background(2, address)
                            .on_stack([sp - 1])
                            .on_heap([address as usize]),
                    ),
                Err(HeapAccessError::OutOfRange { .. }) => {
                    Narration::fault("Address %1 is outside the heap")
                        .with(Placeholder::bold(1, address).on_stack([sp - 1]))
                }
                Err(HeapAccessError::Unallocated { .. }) => {
                    Narration::fault("Storing to heap address %1, which is not allocated").with(
                        Placeholder::background(1, address)
                            .on_stack([sp - 1])
                            .on_heap([address as usize]),
                    )
                }
            }
        }
        Opcode::Pld => {
            let operands = probe!(stack.peek(sp, 2));
            let (offset, dynamic_level) = (operands[0], operands[1]);
            let trail = probe!(find_base_trail(stack, model.base, dynamic_level));
            let resolved = *trail.last().expect("trail is never empty");
            let address = resolved + offset;
            let value = probe!(stack.cell(address));
            Narration::describe(
                "Loads the value at level %1, address %2 of the stack (index %3, value %4) and pushes it onto the top",
            )
            .with(
                Placeholder::bold(1, dynamic_level)
                    .on_stack([sp - 1])
                    .on_stack(trail),
            )
            .with(Placeholder::bold(2, offset).on_stack([sp]))
            .with(Placeholder::bold(3, address).on_stack([address]))
            .with(Placeholder::bold(4, value).on_stack([address]))
        }
        Opcode::Pst => {
            let operands = probe!(stack.peek(sp, 3));
            let (offset, dynamic_level, value) = (operands[0], operands[1], operands[2]);
            let trail = probe!(find_base_trail(stack, model.base, dynamic_level));
            let resolved = *trail.last().expect("trail is never empty");
            let address = resolved + offset;
            probe!(stack.cell(address));
            Narration::describe("Stores the value %1 at level %2, address %3 of the stack (index %4)")
                .with(Placeholder::bold(1, value).on_stack([sp - 2]))
                .with(
                    Placeholder::bold(2, dynamic_level)
                        .on_stack([sp - 1])
                        .on_stack(trail),
                )
                .with(Placeholder::bold(3, offset).on_stack([sp]))
                .with(Placeholder::bold(4, address).on_stack([address]))
        }
    };

    finish(narration, instruction.opcode, model.pc, program_len)
}

/// Marks fall-through narrations that run off the end of the program.
fn finish(narration: Narration, opcode: Opcode, pc: usize, program_len: usize) -> Narration {
    let falls_through = !matches!(
        opcode,
        Opcode::Jmp | Opcode::Jmc | Opcode::Cal | Opcode::Ret
    );
    if falls_through && !narration.is_fault() && pc + 1 >= program_len {
        narration.ending()
    } else {
        narration
    }
}

fn overflow(stack: &Stack) -> Narration {
    Narration::from_error(&ErrorKind::StackOverflow {
        limit: stack.max_size,
    })
}

fn valid_target(parameter: i64, program_len: usize) -> Option<usize> {
    match usize::try_from(parameter) {
        Ok(target) if target < program_len => Some(target),
        _ => None,
    }
}

/// Explains an `OPR` sub-operation, mirroring the engine's operand order:
/// `%1` is the top of stack (pushed second), `%2` the value below it.
fn explain_operation(stack: &Stack, code: i64, sp: i64) -> Narration {
    let Some(operation) = Operation::from_code(code) else {
        return Narration::from_error(&ErrorKind::UnknownOperation { code });
    };

    match operation {
        Operation::Neg => {
            let top = probe!(stack.peek(sp, 1))[0];
            Narration::describe("Negates the value on top of the stack (-1 * %1)")
                .with(Placeholder::bold(1, top).on_stack([sp]))
        }
        Operation::Odd => {
            let top = probe!(stack.peek(sp, 1))[0];
            Narration::describe("Tests whether the value on top of the stack (%1) is odd")
                .with(Placeholder::bold(1, top).on_stack([sp]))
        }
        _ => {
            let operands = probe!(stack.peek(sp, 2));
            let (top, second) = (operands[0], operands[1]);
            if matches!(operation, Operation::Div | Operation::Mod) && top == 0 {
                return Narration::from_error(&ErrorKind::DivisionByZero)
                    .with(Placeholder::bold(1, top).on_stack([sp]));
            }
            let message = match operation {
                Operation::Add => "Adds the top two stack values (%2 + %1)",
                Operation::Sub => "Subtracts the top two stack values (%2 - %1)",
                Operation::Mul => "Multiplies the top two stack values (%2 * %1)",
                Operation::Div => "Divides the top two stack values (%2 / %1)",
                Operation::Mod => "Takes the top two stack values modulo (%2 mod %1)",
                Operation::Eq => "Tests the top two stack values for equality (%2 == %1)",
                Operation::Ne => "Tests the top two stack values for inequality (%2 != %1)",
                Operation::Lt => "Compares the top two stack values (%2 < %1)",
                Operation::Ge => "Compares the top two stack values (%2 >= %1)",
                Operation::Gt => "Compares the top two stack values (%2 > %1)",
                Operation::Le => "Compares the top two stack values (%2 <= %1)",
                Operation::Neg | Operation::Odd => unreachable!("handled above"),
            };
            Narration::describe(message)
                .with(Placeholder::bold(1, top).on_stack([sp]))
                .with(Placeholder::bold(2, second).on_stack([sp - 1]))
        }
    }
}
