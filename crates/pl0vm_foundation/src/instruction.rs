//! The PL/0 instruction set.
//!
//! Instructions are produced by an external validator and trusted here: the
//! `index` of each instruction equals its position in the program, levels are
//! non-negative, and per-opcode operand constraints hold.

use std::fmt;
use std::str::FromStr;

/// A single PL/0 instruction kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Push the literal `parameter` onto the stack.
    Lit,
    /// Arithmetic/logic sub-operation selected by `parameter` (see [`Operation`]).
    Opr,
    /// Load the cell at `base(level) + parameter` and push it.
    Lod,
    /// Pop the top of stack and store it at `base(level) + parameter`.
    Sto,
    /// Call the procedure at `parameter`, opening a new activation frame.
    Cal,
    /// Grow (or, with a negative `parameter`, shrink) the current frame.
    Int,
    /// Unconditional jump to `parameter`.
    Jmp,
    /// Pop the top of stack; jump to `parameter` if it is zero.
    Jmc,
    /// Return from the current frame; ends the program at the outermost one.
    Ret,
    /// Read one input character and push its code.
    Rea,
    /// Pop the top of stack and write it to the output as a character.
    Wri,
    /// Pop a cell count and push the address of a freshly allocated heap block.
    New,
    /// Pop a heap address and free the block starting there.
    Del,
    /// Pop a heap address and push the value stored there.
    Lda,
    /// Pop a value and a heap address and store the value there.
    Sta,
    /// Dynamic-level counterpart of `Lod`: level and address come from the stack.
    Pld,
    /// Dynamic-level counterpart of `Sto`: level, address, and value come from the stack.
    Pst,
}

impl Opcode {
    /// All opcodes, in mnemonic-table order.
    pub const ALL: [Opcode; 17] = [
        Opcode::Lit,
        Opcode::Opr,
        Opcode::Lod,
        Opcode::Sto,
        Opcode::Cal,
        Opcode::Int,
        Opcode::Jmp,
        Opcode::Jmc,
        Opcode::Ret,
        Opcode::Rea,
        Opcode::Wri,
        Opcode::New,
        Opcode::Del,
        Opcode::Lda,
        Opcode::Sta,
        Opcode::Pld,
        Opcode::Pst,
    ];

    /// Returns the three-letter mnemonic for this opcode.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Lit => "LIT",
            Opcode::Opr => "OPR",
            Opcode::Lod => "LOD",
            Opcode::Sto => "STO",
            Opcode::Cal => "CAL",
            Opcode::Int => "INT",
            Opcode::Jmp => "JMP",
            Opcode::Jmc => "JMC",
            Opcode::Ret => "RET",
            Opcode::Rea => "REA",
            Opcode::Wri => "WRI",
            Opcode::New => "NEW",
            Opcode::Del => "DEL",
            Opcode::Lda => "LDA",
            Opcode::Sta => "STA",
            Opcode::Pld => "PLD",
            Opcode::Pst => "PST",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for Opcode {
    type Err = ();

    /// Parses a mnemonic, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// An `OPR` sub-operation, selected by the instruction parameter (1-13).
///
/// For binary operations the top of stack is the operand pushed *second*:
/// `Sub` computes `second_from_top - top`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Negate the top of stack in place.
    Neg,
    /// `[a, b] -> [a + b]`
    Add,
    /// `[a, b] -> [a - b]`
    Sub,
    /// `[a, b] -> [a * b]`
    Mul,
    /// `[a, b] -> [a / b]` (floored; zero divisor faults)
    Div,
    /// `[a, b] -> [a mod b]` (floored; zero divisor faults)
    Mod,
    /// `[a] -> [a mod 2]`
    Odd,
    /// `[a, b] -> [a == b]` as 1/0
    Eq,
    /// `[a, b] -> [a != b]` as 1/0
    Ne,
    /// `[a, b] -> [a < b]` as 1/0
    Lt,
    /// `[a, b] -> [a >= b]` as 1/0
    Ge,
    /// `[a, b] -> [a > b]` as 1/0
    Gt,
    /// `[a, b] -> [a <= b]` as 1/0
    Le,
}

impl Operation {
    /// Decodes an `OPR` parameter, returning `None` for unknown codes.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Operation> {
        match code {
            1 => Some(Operation::Neg),
            2 => Some(Operation::Add),
            3 => Some(Operation::Sub),
            4 => Some(Operation::Mul),
            5 => Some(Operation::Div),
            6 => Some(Operation::Mod),
            7 => Some(Operation::Odd),
            8 => Some(Operation::Eq),
            9 => Some(Operation::Ne),
            10 => Some(Operation::Lt),
            11 => Some(Operation::Ge),
            12 => Some(Operation::Gt),
            13 => Some(Operation::Le),
            _ => None,
        }
    }

    /// Returns the numeric sub-operation code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Operation::Neg => 1,
            Operation::Add => 2,
            Operation::Sub => 3,
            Operation::Mul => 4,
            Operation::Div => 5,
            Operation::Mod => 6,
            Operation::Odd => 7,
            Operation::Eq => 8,
            Operation::Ne => 9,
            Operation::Lt => 10,
            Operation::Ge => 11,
            Operation::Gt => 12,
            Operation::Le => 13,
        }
    }

    /// Returns true for operations that consume two operands.
    #[must_use]
    pub const fn is_binary(self) -> bool {
        !matches!(self, Operation::Neg | Operation::Odd)
    }
}

/// One validated instruction of a program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Position in the program; equals the array index (validated externally).
    pub index: usize,
    /// The instruction kind.
    pub opcode: Opcode,
    /// Lexical level for scoped addressing (`LOD`, `STO`, `CAL`); 0 elsewhere.
    pub level: i64,
    /// Operand; meaning depends on the opcode.
    pub parameter: i64,
}

impl Instruction {
    /// Creates an instruction.
    #[must_use]
    pub const fn new(index: usize, opcode: Opcode, level: i64, parameter: i64) -> Self {
        Self {
            index,
            opcode,
            level,
            parameter,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.index, self.opcode, self.level, self.parameter
        )
    }
}
