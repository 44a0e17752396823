//! Operand decoding over a raw byte-code body.
//!
//! Wide operands are little-endian and must be naturally aligned relative to
//! the start of the body: branch targets on even offsets, immediates on
//! multiples of four. The generator pads with `nop` to satisfy this.

use super::fault::FaultKind;
use super::opcode::{Opcode, Operands};
use super::value::Value;

/// Widest lane group `vector` and `swizzle` operate on.
pub const MAX_LANES: usize = 16;

/// Sub-instruction wrapped by `vector`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneOp {
    Plain(Opcode),
    Branch(u16),
    ConditionalBranch(u16),
    LoadGlobal(u8),
}

impl LaneOp {
    pub fn opcode(self) -> Opcode {
        match self {
            LaneOp::Plain(op) => op,
            LaneOp::Branch(_) => Opcode::Branch,
            LaneOp::ConditionalBranch(_) => Opcode::ConditionalBranch,
            LaneOp::LoadGlobal(_) => Opcode::LoadGlobal,
        }
    }
}

/// One decoded instruction; offset lists borrow from the code body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// Opcode without inline operands.
    Plain(Opcode),
    Branch(u16),
    ConditionalBranch(u16),
    DupDown(u8),
    LoadGlobal(u8),
    Pop(u8),
    Return(u8),
    PushImmediate(Value),
    LoadSwizzle(&'a [u8]),
    StoreSwizzle(&'a [u8]),
    Swizzle { src: u8, indices: &'a [u8] },
    Vector { lanes: u8, op: LaneOp },
}

impl Instruction<'_> {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Plain(op) => *op,
            Instruction::Branch(_) => Opcode::Branch,
            Instruction::ConditionalBranch(_) => Opcode::ConditionalBranch,
            Instruction::DupDown(_) => Opcode::DupDown,
            Instruction::LoadGlobal(_) => Opcode::LoadGlobal,
            Instruction::Pop(_) => Opcode::Pop,
            Instruction::Return(_) => Opcode::Return,
            Instruction::PushImmediate(_) => Opcode::PushImmediate,
            Instruction::LoadSwizzle(_) => Opcode::LoadSwizzle,
            Instruction::StoreSwizzle(_) => Opcode::StoreSwizzle,
            Instruction::Swizzle { .. } => Opcode::Swizzle,
            Instruction::Vector { .. } => Opcode::Vector,
        }
    }
}

/// Instruction pointer over a code body.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    code: &'a [u8],
    ip: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(code: &'a [u8]) -> Self {
        Self { code, ip: 0 }
    }

    #[inline]
    pub fn ip(&self) -> usize {
        self.ip
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.ip >= self.code.len()
    }

    /// Absolute jump; an out-of-range target faults on the next fetch.
    #[inline]
    pub fn jump(&mut self, target: u16) {
        self.ip = target as usize;
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, FaultKind> {
        let byte = *self.code.get(self.ip).ok_or(FaultKind::CodeOverrun)?;
        self.ip += 1;
        Ok(byte)
    }

    pub fn read_u16(&mut self) -> Result<u16, FaultKind> {
        let bytes = self.read_aligned::<2>()?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_u32(&mut self) -> Result<u32, FaultKind> {
        let bytes = self.read_aligned::<4>()?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_aligned<const N: usize>(&mut self) -> Result<[u8; N], FaultKind> {
        if self.ip % N != 0 {
            return Err(FaultKind::Misaligned { width: N });
        }
        let end = self.ip + N;
        let slice = self.code.get(self.ip..end).ok_or(FaultKind::CodeOverrun)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(slice);
        self.ip = end;
        Ok(buf)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], FaultKind> {
        let end = self.ip + count;
        let slice = self.code.get(self.ip..end).ok_or(FaultKind::CodeOverrun)?;
        self.ip = end;
        Ok(slice)
    }

    fn read_opcode(&mut self) -> Result<Opcode, FaultKind> {
        let byte = self.read_u8()?;
        Opcode::from_byte(byte).ok_or(FaultKind::UnknownOpcode(byte))
    }

    /// Decodes the instruction at `ip` and advances past its operands.
    pub fn next_instruction(&mut self) -> Result<Instruction<'a>, FaultKind> {
        let op = self.read_opcode()?;
        let inst = match op.operands() {
            Operands::None => Instruction::Plain(op),
            Operands::Target => {
                let target = self.read_u16()?;
                if op == Opcode::Branch {
                    Instruction::Branch(target)
                } else {
                    Instruction::ConditionalBranch(target)
                }
            }
            Operands::Byte => {
                let n = self.read_u8()?;
                match op {
                    Opcode::DupDown => Instruction::DupDown(n),
                    Opcode::LoadGlobal => Instruction::LoadGlobal(n),
                    Opcode::Pop => Instruction::Pop(n),
                    _ => Instruction::Return(n),
                }
            }
            Operands::Word => Instruction::PushImmediate(Value::from_bits(self.read_u32()?)),
            Operands::ByteList => {
                let count = self.read_u8()? as usize;
                let offsets = self.read_bytes(count)?;
                if op == Opcode::LoadSwizzle {
                    Instruction::LoadSwizzle(offsets)
                } else {
                    Instruction::StoreSwizzle(offsets)
                }
            }
            Operands::Swizzle => {
                let src = self.read_u8()?;
                let dst = self.read_u8()? as usize;
                let indices = self.read_bytes(dst)?;
                Instruction::Swizzle { src, indices }
            }
            Operands::Vector => {
                let lanes = self.read_u8()?;
                if lanes == 0 || lanes as usize > MAX_LANES {
                    return Err(FaultKind::InvalidLaneCount(lanes));
                }
                let op = self.read_lane_op()?;
                Instruction::Vector { lanes, op }
            }
        };
        Ok(inst)
    }

    fn read_lane_op(&mut self) -> Result<LaneOp, FaultKind> {
        let op = self.read_opcode()?;
        match op {
            Opcode::Branch => Ok(LaneOp::Branch(self.read_u16()?)),
            Opcode::ConditionalBranch => Ok(LaneOp::ConditionalBranch(self.read_u16()?)),
            Opcode::LoadGlobal => Ok(LaneOp::LoadGlobal(self.read_u8()?)),
            Opcode::Load | Opcode::Store => Ok(LaneOp::Plain(op)),
            op if op.is_binary() || op.is_unary() => Ok(LaneOp::Plain(op)),
            op => Err(FaultKind::UnsupportedLaneOp(op)),
        }
    }
}
