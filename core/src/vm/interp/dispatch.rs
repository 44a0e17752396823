use tracing::{Level, info, trace};

use super::{Interpreter, TRACE_TARGET};
use crate::vm::decode::{Cursor, Instruction, MAX_LANES};
use crate::vm::fault::{Fault, FaultKind, Space};
use crate::vm::opcode::Opcode;
use crate::vm::ops::{eval_binary, eval_unary};
use crate::vm::value::Value;

const DEBUG_PRINT_TARGET: &str = "shadevm::debug_print";

pub(super) enum Flow {
    Next,
    Return(usize),
}

impl Interpreter {
    /// Fetch/decode/dispatch until `return`. Yields the returned slot count.
    pub(super) fn execute(&mut self, code: &[u8]) -> Result<usize, Fault> {
        let mut cursor = Cursor::new(code);
        let trace_steps = tracing::enabled!(target: TRACE_TARGET, Level::TRACE);
        loop {
            let ip = cursor.ip();
            if let Some(limit) = self.options.instruction_budget
                && self.steps >= limit
            {
                return Err(FaultKind::BudgetExhausted { limit }.at(ip));
            }
            self.steps += 1;

            let inst = cursor.next_instruction().map_err(|kind| kind.at(ip))?;
            let flow = self.step(inst, &mut cursor).map_err(|kind| kind.at(ip))?;
            if trace_steps {
                trace!(target: TRACE_TARGET, ip, op = %inst.opcode(), stack = ?self.stack.as_slice(), "step");
            }
            if let Flow::Return(count) = flow {
                return Ok(count);
            }
        }
    }

    fn step(&mut self, inst: Instruction<'_>, cursor: &mut Cursor<'_>) -> Result<Flow, FaultKind> {
        match inst {
            Instruction::Plain(op) => self.plain(op)?,
            Instruction::Branch(target) => cursor.jump(target),
            Instruction::ConditionalBranch(target) => {
                if self.stack.pop()?.as_bool() {
                    cursor.jump(target);
                }
            }
            Instruction::DupDown(count) => self.stack.dup_down(count as usize)?,
            Instruction::LoadGlobal(index) => {
                let value = self.globals.get(index as i64)?;
                self.stack.push(value);
            }
            Instruction::Pop(count) => self.stack.drop_top(count as usize)?,
            Instruction::PushImmediate(value) => self.stack.push(value),
            Instruction::Return(count) => {
                self.stack.return_to_bottom(count as usize)?;
                return Ok(Flow::Return(count as usize));
            }
            Instruction::LoadSwizzle(offsets) => self.load_swizzle(offsets)?,
            Instruction::StoreSwizzle(offsets) => self.store_swizzle(offsets)?,
            Instruction::Swizzle { src, indices } => self.swizzle(src, indices)?,
            Instruction::Vector { lanes, op } => self.lanes(lanes as usize, op, cursor)?,
        }
        Ok(Flow::Next)
    }

    fn plain(&mut self, op: Opcode) -> Result<(), FaultKind> {
        match op {
            op if op.is_binary() => {
                let rhs = self.stack.pop()?;
                let lhs = self.stack.top_mut()?;
                *lhs = eval_binary(op, *lhs, rhs)?;
            }
            op if op.is_unary() => {
                let top = self.stack.top_mut()?;
                *top = eval_unary(op, *top)?;
            }
            Opcode::Nop => {}
            Opcode::Dup => {
                let top = self.stack.top()?;
                self.stack.push(top);
            }
            Opcode::DebugPrint => {
                let v = self.stack.pop()?;
                info!(
                    target: DEBUG_PRINT_TARGET,
                    int = v.as_i32(),
                    uint = v.as_u32(),
                    float = v.as_f32() as f64,
                    "debug print"
                );
            }
            Opcode::Load => {
                let target = self.stack.pop()?;
                let value = self.stack.get(target.as_i32() as i64)?;
                self.stack.push(value);
            }
            Opcode::Store => {
                let value = self.stack.pop()?;
                let target = self.stack.pop()?;
                self.stack.set(target.as_i32() as i64, value)?;
            }
            // Global writes address through the stack; global reads use an
            // immediate index (see `LoadGlobal`).
            Opcode::StoreGlobal => {
                let value = self.stack.pop()?;
                let target = self.stack.pop()?;
                self.globals.set(target.as_i32() as i64, value)?;
            }
            other => return Err(FaultKind::Unsupported(other)),
        }
        Ok(())
    }

    fn load_swizzle(&mut self, offsets: &[u8]) -> Result<(), FaultKind> {
        let base = self.stack.pop()?.as_i32() as i64;
        for offset in offsets {
            let value = self.stack.get(base + *offset as i64)?;
            self.stack.push(value);
        }
        Ok(())
    }

    /// The base index sits directly beneath the values being stored and is
    /// discarded once they are written.
    fn store_swizzle(&mut self, offsets: &[u8]) -> Result<(), FaultKind> {
        let base = self.stack.peek(offsets.len())?.as_i32() as i64;
        for offset in offsets.iter().rev() {
            let value = self.stack.pop()?;
            self.stack.set(base + *offset as i64, value)?;
        }
        self.stack.pop()?;
        Ok(())
    }

    fn swizzle(&mut self, src: u8, indices: &[u8]) -> Result<(), FaultKind> {
        let src_count = src as usize;
        if src_count > MAX_LANES {
            return Err(FaultKind::InvalidLaneCount(src));
        }
        let mut buffer = [Value::ZERO; MAX_LANES];
        for slot in buffer[..src_count].iter_mut().rev() {
            *slot = self.stack.pop()?;
        }
        for index in indices {
            let index = *index as usize;
            if index >= src_count {
                return Err(FaultKind::OutOfBounds {
                    space: Space::LaneBuffer,
                    index: index as i64,
                    len: src_count,
                });
            }
            self.stack.push(buffer[index]);
        }
        Ok(())
    }
}
