use serde::{Deserialize, Serialize};
use std::fmt;

/// One 32-bit slot on the stack or in the global table.
///
/// A slot carries no type tag. The opcode consuming it decides whether the
/// bits are read as a signed or unsigned integer, a float, or a boolean; the
/// byte-code generator is responsible for producer/consumer agreement.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Value(u32);

impl Value {
    /// Pattern written into locals and globals before an invocation starts.
    pub const UNINITIALIZED: Value = Value(0xDEAD_BEEF);
    pub const ZERO: Value = Value(0);
    pub const TRUE: Value = Value(1);
    pub const FALSE: Value = Value(0);

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Value(bits)
    }

    #[inline]
    pub const fn from_i32(v: i32) -> Self {
        Value(v as u32)
    }

    #[inline]
    pub const fn from_u32(v: u32) -> Self {
        Value(v)
    }

    #[inline]
    pub fn from_f32(v: f32) -> Self {
        Value(v.to_bits())
    }

    #[inline]
    pub const fn from_bool(v: bool) -> Self {
        if v { Value::TRUE } else { Value::FALSE }
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0 as i32
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn as_f32(self) -> f32 {
        f32::from_bits(self.0)
    }

    /// Any non-zero word reads as `true`.
    #[inline]
    pub const fn as_bool(self) -> bool {
        self.0 != 0
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::from_i32(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::from_u32(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::from_f32(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::from_bool(v)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.as_i32(), self.as_f32())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
