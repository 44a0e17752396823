//! Scalar operator semantics shared by the plain and lane-wide dispatch paths.

use super::fault::FaultKind;
use super::opcode::Opcode;
use super::value::Value;

#[inline]
fn int_div(lhs: i32, rhs: i32) -> Result<i32, FaultKind> {
    if rhs == 0 {
        return Err(FaultKind::DivisionByZero);
    }
    Ok(lhs.wrapping_div(rhs))
}

#[inline]
fn int_rem(lhs: i32, rhs: i32) -> Result<i32, FaultKind> {
    if rhs == 0 {
        return Err(FaultKind::DivisionByZero);
    }
    Ok(lhs.wrapping_rem(rhs))
}

#[inline]
fn uint_div(lhs: u32, rhs: u32) -> Result<u32, FaultKind> {
    lhs.checked_div(rhs).ok_or(FaultKind::DivisionByZero)
}

#[inline]
fn uint_rem(lhs: u32, rhs: u32) -> Result<u32, FaultKind> {
    lhs.checked_rem(rhs).ok_or(FaultKind::DivisionByZero)
}

/// Applies a two-operand opcode. `op` must satisfy [`Opcode::is_binary`].
pub(crate) fn eval_binary(op: Opcode, a: Value, b: Value) -> Result<Value, FaultKind> {
    let out = match op {
        Opcode::AddI => Value::from_i32(a.as_i32().wrapping_add(b.as_i32())),
        Opcode::AddF => Value::from_f32(a.as_f32() + b.as_f32()),
        Opcode::SubtractI => Value::from_i32(a.as_i32().wrapping_sub(b.as_i32())),
        Opcode::SubtractF => Value::from_f32(a.as_f32() - b.as_f32()),
        Opcode::MultiplyS => Value::from_i32(a.as_i32().wrapping_mul(b.as_i32())),
        Opcode::MultiplyU => Value::from_u32(a.as_u32().wrapping_mul(b.as_u32())),
        Opcode::MultiplyF => Value::from_f32(a.as_f32() * b.as_f32()),
        Opcode::DivideS => Value::from_i32(int_div(a.as_i32(), b.as_i32())?),
        Opcode::DivideU => Value::from_u32(uint_div(a.as_u32(), b.as_u32())?),
        Opcode::DivideF => Value::from_f32(a.as_f32() / b.as_f32()),
        Opcode::RemainderS => Value::from_i32(int_rem(a.as_i32(), b.as_i32())?),
        Opcode::RemainderU => Value::from_u32(uint_rem(a.as_u32(), b.as_u32())?),
        Opcode::CompareIEq => Value::from_bool(a.as_i32() == b.as_i32()),
        Opcode::CompareINeq => Value::from_bool(a.as_i32() != b.as_i32()),
        Opcode::CompareFEq => Value::from_bool(a.as_f32() == b.as_f32()),
        Opcode::CompareFNeq => Value::from_bool(a.as_f32() != b.as_f32()),
        Opcode::CompareSGt => Value::from_bool(a.as_i32() > b.as_i32()),
        Opcode::CompareUGt => Value::from_bool(a.as_u32() > b.as_u32()),
        Opcode::CompareFGt => Value::from_bool(a.as_f32() > b.as_f32()),
        Opcode::CompareSGtEq => Value::from_bool(a.as_i32() >= b.as_i32()),
        Opcode::CompareUGtEq => Value::from_bool(a.as_u32() >= b.as_u32()),
        Opcode::CompareFGtEq => Value::from_bool(a.as_f32() >= b.as_f32()),
        Opcode::CompareSLt => Value::from_bool(a.as_i32() < b.as_i32()),
        Opcode::CompareULt => Value::from_bool(a.as_u32() < b.as_u32()),
        Opcode::CompareFLt => Value::from_bool(a.as_f32() < b.as_f32()),
        Opcode::CompareSLtEq => Value::from_bool(a.as_i32() <= b.as_i32()),
        Opcode::CompareULtEq => Value::from_bool(a.as_u32() <= b.as_u32()),
        Opcode::CompareFLtEq => Value::from_bool(a.as_f32() <= b.as_f32()),
        other => return Err(FaultKind::Unsupported(other)),
    };
    Ok(out)
}

/// Applies an in-place single-slot opcode. `op` must satisfy [`Opcode::is_unary`].
pub(crate) fn eval_unary(op: Opcode, v: Value) -> Result<Value, FaultKind> {
    let out = match op {
        // `as` saturates and maps NaN to zero.
        Opcode::FloatToInt => Value::from_i32(v.as_f32() as i32),
        Opcode::SignedToFloat => Value::from_f32(v.as_i32() as f32),
        Opcode::UnsignedToFloat => Value::from_f32(v.as_u32() as f32),
        Opcode::NegateF => Value::from_f32(-v.as_f32()),
        Opcode::NegateS => Value::from_i32(v.as_i32().wrapping_neg()),
        Opcode::Not => Value::from_bool(!v.as_bool()),
        other => return Err(FaultKind::Unsupported(other)),
    };
    Ok(out)
}
