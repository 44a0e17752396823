//! Human-readable listings of byte-code bodies. Diagnostic only.

use std::fmt::Write as _;

use super::decode::{Cursor, Instruction, LaneOp};
use super::fault::Fault;
use super::value::Value;

fn push_int(out: &mut String, v: impl itoa::Integer) {
    let mut buf = itoa::Buffer::new();
    out.push_str(buf.format(v));
}

fn push_list(out: &mut String, bytes: &[u8]) {
    for b in bytes {
        out.push_str(", ");
        push_int(out, *b);
    }
}

fn push_immediate(out: &mut String, value: Value) {
    push_int(out, value.as_i32());
    out.push_str(" (");
    let f = value.as_f32();
    if f.is_finite() {
        let mut buf = ryu::Buffer::new();
        out.push_str(buf.format_finite(f));
    } else {
        let _ = write!(out, "{f}");
    }
    out.push(')');
}

/// Formats one instruction without its offset, e.g. `loadswizzle 2, 0, 1`.
pub fn format_instruction(inst: &Instruction<'_>) -> String {
    let mut out = String::from(inst.opcode().mnemonic());
    match *inst {
        Instruction::Plain(_) => {}
        Instruction::Branch(target) | Instruction::ConditionalBranch(target) => {
            out.push(' ');
            push_int(&mut out, target);
        }
        Instruction::DupDown(n) | Instruction::LoadGlobal(n) | Instruction::Pop(n) | Instruction::Return(n) => {
            out.push(' ');
            push_int(&mut out, n);
        }
        Instruction::PushImmediate(value) => {
            out.push(' ');
            push_immediate(&mut out, value);
        }
        Instruction::LoadSwizzle(offsets) | Instruction::StoreSwizzle(offsets) => {
            out.push(' ');
            push_int(&mut out, offsets.len());
            push_list(&mut out, offsets);
        }
        Instruction::Swizzle { src, indices } => {
            out.push(' ');
            push_int(&mut out, src);
            out.push_str(", ");
            push_int(&mut out, indices.len());
            push_list(&mut out, indices);
        }
        Instruction::Vector { lanes, op } => {
            out.push(' ');
            push_int(&mut out, lanes);
            out.push(' ');
            out.push_str(op.opcode().mnemonic());
            match op {
                LaneOp::Branch(target) | LaneOp::ConditionalBranch(target) => {
                    out.push(' ');
                    push_int(&mut out, target);
                }
                LaneOp::LoadGlobal(index) => {
                    out.push(' ');
                    push_int(&mut out, index);
                }
                LaneOp::Plain(_) => {}
            }
        }
    }
    out
}

/// One `offset: instruction` line per instruction, in code order.
pub fn disassemble(code: &[u8]) -> Result<String, Fault> {
    let mut cursor = Cursor::new(code);
    let mut out = String::new();
    while !cursor.is_at_end() {
        let ip = cursor.ip();
        let inst = cursor.next_instruction().map_err(|kind| kind.at(ip))?;
        push_int(&mut out, ip);
        out.push_str(": ");
        out.push_str(&format_instruction(&inst));
        out.push('\n');
    }
    Ok(out)
}
