//! The execution engine: one instruction per call.
//!
//! [`step`] mutates the machine state in place according to the instruction
//! at the current program counter and reports whether the program ended,
//! what output the step produced, any non-fatal warnings, and the input
//! left for the next step. Fatal conditions abort the step with a typed
//! [`Error`](pl0vm_foundation::Error); the state may then be partially
//! mutated and it is the caller's call whether to revert a snapshot.

#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

use pl0vm_foundation::{
    DataModel, Error, ErrorKind, Instruction, Opcode, Operation, Result, StackFrame, StepContext,
    Warning,
};

use crate::allocator;
use crate::frame::find_base;

/// The result of one completed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// True when the program ended with this step.
    pub ended: bool,
    /// Characters written by this step.
    pub output: String,
    /// Non-fatal conditions raised by this step.
    pub warnings: Vec<Warning>,
    /// Input left over for the next step.
    pub remaining_input: String,
}

/// Executes the instruction at `model.pc`.
///
/// `input` is the pending input buffer; `REA` consumes its first character
/// and the rest is handed back in [`StepOutcome::remaining_input`].
///
/// # Errors
///
/// Any fatal condition of the executed opcode, with [`StepContext`]
/// attached. Calling with `pc` past the last instruction is the fatal
/// [`ErrorKind::NoInstruction`], distinct from the natural end of the
/// program reported through [`StepOutcome::ended`].
pub fn step(model: &mut DataModel, instructions: &[Instruction], input: &str) -> Result<StepOutcome> {
    let pc = model.pc;
    let instruction = *instructions
        .get(pc)
        .ok_or_else(|| {
            Error::new(ErrorKind::NoInstruction {
                pc,
                program_len: instructions.len(),
            })
        })?;

    execute(model, instructions, input, instruction).map_err(|err| {
        err.with_context(StepContext {
            pc,
            opcode: instruction.opcode,
        })
    })
}

#[allow(clippy::too_many_lines)]
fn execute(
    model: &mut DataModel,
    instructions: &[Instruction],
    input: &str,
    instruction: Instruction,
) -> Result<StepOutcome> {
    let level = instruction.level;
    let parameter = instruction.parameter;

    let mut warnings = Vec::new();
    let mut ended = false;
    let mut output = String::new();
    let mut remaining_input = input.to_string();

    match instruction.opcode {
        Opcode::Lit => {
            model.sp = model.stack.push(model.sp, &[parameter])?;
            model.pc += 1;
        }
        Opcode::Opr => {
            model.sp = perform_operation(model, parameter)?;
            model.pc += 1;
        }
        Opcode::Lod => {
            let base = find_base(&model.stack, model.base, level)?;
            let value = model.stack.cell(base + parameter)?;
            model.sp = model.stack.push(model.sp, &[value])?;
            model.pc += 1;
        }
        Opcode::Sto => {
            let base = find_base(&model.stack, model.base, level)?;
            let values = model.stack.take(model.sp, 1)?;
            model.sp -= 1;
            model.stack.set_cell(base + parameter, values[0])?;
            model.pc += 1;
        }
        Opcode::Cal => {
            let target = jump_target(parameter, instructions.len())?;
            let static_link = find_base(&model.stack, model.base, level)?;
            let return_pc = model.pc as i64 + 1;
            model
                .stack
                .place(model.sp + 1, &[static_link, model.base, return_pc])?;
            model.stack.frames.push(StackFrame {
                index: model.sp + 1,
                size: 0,
            });
            model.base = model.sp + 1;
            model.pc = target;
        }
        Opcode::Int => {
            model.sp = model.stack.grow(model.sp, parameter)?;
            model.pc += 1;
        }
        Opcode::Jmp => {
            model.pc = jump_target(parameter, instructions.len())?;
        }
        Opcode::Jmc => {
            let values = model.stack.take(model.sp, 1)?;
            model.sp -= 1;
            if values[0] == 0 {
                model.pc = jump_target(parameter, instructions.len())?;
            } else {
                model.pc += 1;
            }
        }
        Opcode::Ret => {
            if model.base == 0 {
                ended = true;
            } else {
                let values = model.stack.peek(model.base + 2, 2)?;
                let return_pc = usize::try_from(values[0]).map_err(|_| {
                    Error::jump_out_of_range(values[0], instructions.len())
                })?;
                model.sp = model.base - 1;
                model.pc = return_pc;
                model.base = values[1];
                if model.stack.frames.len() < 2 {
                    return Err(Error::new(ErrorKind::Internal(
                        "return from a non-zero base without an open frame".to_string(),
                    )));
                }
                model.stack.frames.pop();
            }
        }
        Opcode::Rea => {
            let mut chars = remaining_input.chars();
            let ch = chars
                .next()
                .ok_or_else(|| Error::new(ErrorKind::InputExhausted))?;
            remaining_input = chars.as_str().to_string();
            model.sp = model.stack.push(model.sp, &[i64::from(u32::from(ch))])?;
            model.pc += 1;
        }
        Opcode::Wri => {
            let values = model.stack.take(model.sp, 1)?;
            model.sp -= 1;
            let byte = u8::try_from(values[0])
                .map_err(|_| Error::new(ErrorKind::ByteOutOfRange { value: values[0] }))?;
            output.push(char::from(byte));
            model.output.push(char::from(byte));
            model.pc += 1;
        }
        Opcode::New => {
            let values = model.stack.take(model.sp, 1)?;
            model.sp -= 1;
            let count = values[0];
            let address = if count <= 0 || count > model.heap.capacity as i64 {
                warnings.push(Warning::InvalidAllocationSize { count });
                -1
            } else {
                match allocator::allocate(&mut model.heap, count as usize) {
                    Some(address) => address as i64,
                    None => {
                        warnings.push(Warning::HeapExhausted { count });
                        -1
                    }
                }
            };
            model.sp = model.stack.push(model.sp, &[address])?;
            model.pc += 1;
        }
        Opcode::Del => {
            let values = model.stack.take(model.sp, 1)?;
            model.sp -= 1;
            if allocator::free(&mut model.heap, values[0]).is_err() {
                warnings.push(Warning::FreeUnallocated { address: values[0] });
            }
            model.pc += 1;
        }
        Opcode::Lda => {
            let values = model.stack.take(model.sp, 1)?;
            model.sp -= 1;
            let value = allocator::read_cell(&model.heap, values[0])
                .map_err(|err| Error::new(err.into()))?;
            model.sp = model.stack.push(model.sp, &[value])?;
            model.pc += 1;
        }
        Opcode::Sta => {
            let values = model.stack.take(model.sp, 2)?;
            model.sp -= 2;
            let (value, address) = (values[0], values[1]);
            allocator::write_cell(&mut model.heap, address, value)
                .map_err(|err| Error::new(err.into()))?;
            model.pc += 1;
        }
        Opcode::Pld => {
            let values = model.stack.take(model.sp, 2)?;
            model.sp -= 2;
            let (offset, dyn_level) = (values[0], values[1]);
            let base = find_base(&model.stack, model.base, dyn_level)?;
            let value = model.stack.cell(base + offset)?;
            model.sp = model.stack.push(model.sp, &[value])?;
            model.pc += 1;
        }
        Opcode::Pst => {
            let values = model.stack.take(model.sp, 3)?;
            model.sp -= 3;
            let (offset, dyn_level, value) = (values[0], values[1], values[2]);
            let base = find_base(&model.stack, model.base, dyn_level)?;
            model.stack.set_cell(base + offset, value)?;
            model.pc += 1;
        }
    }

    // Falling past the last instruction is the natural end of the program.
    if model.pc >= instructions.len() {
        ended = true;
    }

    Ok(StepOutcome {
        ended,
        output,
        warnings,
        remaining_input,
    })
}

/// Validates a jump/call target against the program length.
fn jump_target(parameter: i64, program_len: usize) -> Result<usize> {
    match usize::try_from(parameter) {
        Ok(target) if target < program_len => Ok(target),
        _ => Err(Error::jump_out_of_range(parameter, program_len)),
    }
}

/// Applies an `OPR` sub-operation and returns the new top-of-stack index.
fn perform_operation(model: &mut DataModel, code: i64) -> Result<i64> {
    let operation =
        Operation::from_code(code).ok_or_else(|| Error::new(ErrorKind::UnknownOperation { code }))?;
    let stack = &mut model.stack;
    let mut sp = model.sp;

    match operation {
        Operation::Neg => {
            let value = stack.cell(sp)?;
            stack.set_cell(sp, -value)?;
        }
        Operation::Odd => {
            let values = stack.take(sp, 1)?;
            sp -= 1;
            sp = stack.push(sp, &[values[0].rem_euclid(2)])?;
        }
        _ => {
            let values = stack.take(sp, 2)?;
            sp -= 2;
            let (top, second) = (values[0], values[1]);
            let result = match operation {
                Operation::Add => second + top,
                Operation::Sub => second - top,
                Operation::Mul => second * top,
                Operation::Div => {
                    if top == 0 {
                        return Err(Error::new(ErrorKind::DivisionByZero));
                    }
                    floor_div(second, top)
                }
                Operation::Mod => {
                    if top == 0 {
                        return Err(Error::new(ErrorKind::DivisionByZero));
                    }
                    floor_mod(second, top)
                }
                Operation::Eq => i64::from(second == top),
                Operation::Ne => i64::from(second != top),
                Operation::Lt => i64::from(second < top),
                Operation::Ge => i64::from(second >= top),
                Operation::Gt => i64::from(second > top),
                Operation::Le => i64::from(second <= top),
                Operation::Neg | Operation::Odd => unreachable!("handled above"),
            };
            sp = stack.push(sp, &[result])?;
        }
    }

    Ok(sp)
}

/// Floored integer division (rounds toward negative infinity).
pub(crate) fn floor_div(dividend: i64, divisor: i64) -> i64 {
    let quotient = dividend / divisor;
    if dividend % divisor != 0 && (dividend < 0) != (divisor < 0) {
        quotient - 1
    } else {
        quotient
    }
}

/// Floored modulo: the result has the sign of the divisor.
pub(crate) fn floor_mod(dividend: i64, divisor: i64) -> i64 {
    dividend - divisor * floor_div(dividend, divisor)
}
