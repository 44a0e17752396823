use std::fmt;

use super::opcode::Opcode;

/// Storage an out-of-range index pointed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    Stack,
    Globals,
    /// The 16-slot scratch buffer used by `swizzle`.
    LaneBuffer,
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Space::Stack => f.write_str("stack"),
            Space::Globals => f.write_str("globals"),
            Space::LaneBuffer => f.write_str("swizzle lane buffer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    UnknownOpcode(u8),
    /// Reserved opcode that has no execution semantics.
    Unsupported(Opcode),
    /// Opcode that cannot be wrapped by `vector`.
    UnsupportedLaneOp(Opcode),
    /// Instruction pointer ran past the end of the body.
    CodeOverrun,
    Misaligned {
        width: usize,
    },
    StackUnderflow,
    OutOfBounds {
        space: Space,
        index: i64,
        len: usize,
    },
    InvalidLaneCount(u8),
    DivisionByZero,
    BudgetExhausted {
        limit: u64,
    },
    ArgumentCount {
        expected: usize,
        actual: usize,
    },
    InputCount {
        expected: usize,
        actual: usize,
    },
}

impl FaultKind {
    #[inline]
    pub fn at(self, ip: usize) -> Fault {
        Fault { ip: Some(ip), kind: self }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::UnknownOpcode(byte) => write!(f, "unknown opcode {byte:#04x}"),
            FaultKind::Unsupported(op) => write!(f, "unsupported instruction '{op}'"),
            FaultKind::UnsupportedLaneOp(op) => write!(f, "instruction '{op}' cannot be used inside vector"),
            FaultKind::CodeOverrun => f.write_str("instruction pointer ran past the end of the code"),
            FaultKind::Misaligned { width } => write!(f, "{width}-byte operand is not {width}-byte aligned"),
            FaultKind::StackUnderflow => f.write_str("stack underflow"),
            FaultKind::OutOfBounds { space, index, len } => {
                write!(f, "{space} index {index} out of bounds (len {len})")
            }
            FaultKind::InvalidLaneCount(count) => write!(f, "lane count {count} outside 1..=16"),
            FaultKind::DivisionByZero => f.write_str("integer division by zero"),
            FaultKind::BudgetExhausted { limit } => write!(f, "instruction budget of {limit} exhausted"),
            FaultKind::ArgumentCount { expected, actual } => {
                write!(f, "function expects {expected} argument slots, got {actual}")
            }
            FaultKind::InputCount { expected, actual } => {
                write!(f, "function expects {expected} input slots, got {actual}")
            }
        }
    }
}

/// Fatal outcome of one invocation.
///
/// `ip` is the offset of the instruction that faulted, or `None` when the
/// invocation was rejected before execution started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub ip: Option<usize>,
    pub kind: FaultKind,
}

impl From<FaultKind> for Fault {
    fn from(kind: FaultKind) -> Self {
        Fault { ip: None, kind }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            Some(ip) => write!(f, "{} at ip {}", self.kind, ip),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Fault {}
