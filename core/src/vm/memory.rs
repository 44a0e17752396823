//! Bounds-checked slot storage.
//!
//! Every index arrives from byte-code, either as an immediate or as a value
//! computed on the stack, so each access is checked before it touches memory.

use super::fault::{FaultKind, Space};
use super::value::Value;

fn out_of_bounds(space: Space, index: i64, len: usize) -> FaultKind {
    FaultKind::OutOfBounds { space, index, len }
}

/// Operand stack that also holds parameters and locals at its bottom.
#[derive(Debug, Default, Clone)]
pub struct SlotStack {
    slots: Vec<Value>,
}

impl SlotStack {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Value] {
        &self.slots
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    #[inline]
    pub fn push(&mut self, value: Value) {
        self.slots.push(value);
    }

    #[inline]
    pub fn pop(&mut self) -> Result<Value, FaultKind> {
        self.slots.pop().ok_or(FaultKind::StackUnderflow)
    }

    /// Pops `count` slots, discarding them.
    pub fn drop_top(&mut self, count: usize) -> Result<(), FaultKind> {
        let len = self.require(count)?;
        self.slots.truncate(len - count);
        Ok(())
    }

    #[inline]
    pub fn top(&self) -> Result<Value, FaultKind> {
        self.slots.last().copied().ok_or(FaultKind::StackUnderflow)
    }

    #[inline]
    pub fn top_mut(&mut self) -> Result<&mut Value, FaultKind> {
        self.slots.last_mut().ok_or(FaultKind::StackUnderflow)
    }

    /// The top `count` slots, bottom-most first.
    pub fn top_n_mut(&mut self, count: usize) -> Result<&mut [Value], FaultKind> {
        let len = self.require(count)?;
        Ok(&mut self.slots[len - count..])
    }

    /// Slot `depth` positions beneath the top (`0` is the top itself).
    pub fn peek(&self, depth: usize) -> Result<Value, FaultKind> {
        let len = self.require(depth + 1)?;
        Ok(self.slots[len - depth - 1])
    }

    fn require(&self, count: usize) -> Result<usize, FaultKind> {
        let len = self.slots.len();
        if count > len {
            return Err(FaultKind::StackUnderflow);
        }
        Ok(len)
    }

    fn resolve(&self, index: i64) -> Result<usize, FaultKind> {
        let len = self.slots.len();
        usize::try_from(index)
            .ok()
            .filter(|i| *i < len)
            .ok_or_else(|| out_of_bounds(Space::Stack, index, len))
    }

    /// Absolute read used by `load` and friends.
    pub fn get(&self, index: i64) -> Result<Value, FaultKind> {
        let idx = self.resolve(index)?;
        Ok(self.slots[idx])
    }

    /// Absolute write used by `store` and friends.
    pub fn set(&mut self, index: i64, value: Value) -> Result<(), FaultKind> {
        let idx = self.resolve(index)?;
        self.slots[idx] = value;
        Ok(())
    }

    /// Copies the top `count` slots and inserts the copies, in order,
    /// directly beneath the top `count + 1` slots.
    pub fn dup_down(&mut self, count: usize) -> Result<(), FaultKind> {
        let len = self.require(count + 1)?;
        let copies: Vec<Value> = self.slots[len - count..].to_vec();
        let at = len - count - 1;
        self.slots.splice(at..at, copies);
        Ok(())
    }

    /// Copies the top `count` slots over positions `0..count`. Slots above
    /// the copied block keep their contents.
    pub fn return_to_bottom(&mut self, count: usize) -> Result<(), FaultKind> {
        let len = self.require(count)?;
        self.slots.copy_within(len - count.., 0);
        Ok(())
    }
}

/// Per-invocation global slots.
#[derive(Debug, Default, Clone)]
pub struct GlobalTable {
    slots: Vec<Value>,
}

impl GlobalTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops previous contents and fills `count` slots with `fill`.
    pub fn reset(&mut self, count: usize, fill: Value) {
        self.slots.clear();
        self.slots.resize(count, fill);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Value] {
        &self.slots
    }

    fn resolve(&self, index: i64) -> Result<usize, FaultKind> {
        let len = self.slots.len();
        usize::try_from(index)
            .ok()
            .filter(|i| *i < len)
            .ok_or_else(|| out_of_bounds(Space::Globals, index, len))
    }

    pub fn get(&self, index: i64) -> Result<Value, FaultKind> {
        let idx = self.resolve(index)?;
        Ok(self.slots[idx])
    }

    pub fn set(&mut self, index: i64, value: Value) -> Result<(), FaultKind> {
        let idx = self.resolve(index)?;
        self.slots[idx] = value;
        Ok(())
    }
}
