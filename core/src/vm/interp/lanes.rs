//! `vector` forms: a scalar opcode applied across N independent lanes.

use super::Interpreter;
use crate::vm::decode::{Cursor, LaneOp, MAX_LANES};
use crate::vm::fault::FaultKind;
use crate::vm::opcode::Opcode;
use crate::vm::ops::{eval_binary, eval_unary};
use crate::vm::value::Value;

impl Interpreter {
    /// `lanes` has already been validated against `1..=MAX_LANES` by the decoder.
    pub(super) fn lanes(&mut self, lanes: usize, op: LaneOp, cursor: &mut Cursor<'_>) -> Result<(), FaultKind> {
        match op {
            // Lane width does not affect control transfer.
            LaneOp::Branch(target) => cursor.jump(target),
            LaneOp::ConditionalBranch(target) => {
                if self.stack.pop()?.as_bool() {
                    cursor.jump(target);
                }
            }
            LaneOp::LoadGlobal(index) => {
                for lane in 0..lanes {
                    let value = self.globals.get(index as i64 + lane as i64)?;
                    self.stack.push(value);
                }
            }
            LaneOp::Plain(Opcode::Load) => {
                let base = self.stack.pop()?.as_i32() as i64;
                for lane in 0..lanes {
                    let value = self.stack.get(base + lane as i64)?;
                    self.stack.push(value);
                }
            }
            LaneOp::Plain(Opcode::Store) => {
                let mut values = [Value::ZERO; MAX_LANES];
                for slot in values[..lanes].iter_mut().rev() {
                    *slot = self.stack.pop()?;
                }
                let base = self.stack.pop()?.as_i32() as i64;
                for (lane, value) in values[..lanes].iter().enumerate().rev() {
                    self.stack.set(base + lane as i64, *value)?;
                }
            }
            LaneOp::Plain(op) if op.is_binary() => {
                let mut rhs = [Value::ZERO; MAX_LANES];
                for slot in rhs[..lanes].iter_mut().rev() {
                    *slot = self.stack.pop()?;
                }
                let lhs = self.stack.top_n_mut(lanes)?;
                for (left, right) in lhs.iter_mut().zip(&rhs[..lanes]) {
                    *left = eval_binary(op, *left, *right)?;
                }
            }
            LaneOp::Plain(op) if op.is_unary() => {
                for slot in self.stack.top_n_mut(lanes)? {
                    *slot = eval_unary(op, *slot)?;
                }
            }
            LaneOp::Plain(op) => return Err(FaultKind::UnsupportedLaneOp(op)),
        }
        Ok(())
    }
}
