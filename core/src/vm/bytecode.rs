use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Global-slot layout shared by every function compiled from one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalLayout {
    pub global_count: usize,
    /// Global indices the host fills before execution, in the order the
    /// caller supplies `inputs`.
    pub input_slots: Vec<usize>,
}

impl GlobalLayout {
    pub fn new(global_count: usize, input_slots: Vec<usize>) -> Self {
        Self {
            global_count,
            input_slots,
        }
    }
}

/// Formal parameter of a byte-code function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Component count, in slots.
    pub width: u8,
    /// `in`/`out` parameters are copied back into the caller's arguments.
    #[serde(default)]
    pub out: bool,
}

impl Parameter {
    pub const fn input(width: u8) -> Self {
        Self { width, out: false }
    }

    pub const fn inout(width: u8) -> Self {
        Self { width, out: true }
    }
}

/// A compiled function body plus the metadata the interpreter needs to set
/// up its frame.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub local_count: usize,
    pub code: Vec<u8>,
    pub owner: Arc<GlobalLayout>,
}

impl Function {
    pub fn new(name: impl Into<String>, code: Vec<u8>, owner: Arc<GlobalLayout>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            local_count: 0,
            code,
            owner,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_locals(mut self, local_count: usize) -> Self {
        self.local_count = local_count;
        self
    }

    /// Total slots occupied by all parameters.
    pub fn parameter_slots(&self) -> usize {
        self.parameters.iter().map(|p| p.width as usize).sum()
    }
}
