pub mod vm;

pub use vm::{Fault, FaultKind, Function, Interpreter, InterpreterOptions, Value};
