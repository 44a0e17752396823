//! Stack-based byte-code interpreter for shader bodies.
//!
//! Functions are raw byte sequences plus layout metadata ([`Function`]).
//! [`Interpreter::run`] binds parameters, locals and globals into fresh
//! storage and executes until the function's `return`.

mod asm;
mod batch;
mod bytecode;
mod decode;
mod disasm;
mod fault;
mod interp;
mod memory;
mod opcode;
mod ops;
mod program;
mod value;

pub use asm::{Assembler, Label, assemble, parse_immediate};
pub use batch::{Invocation, Outcome, run_batch};
pub use bytecode::{Function, GlobalLayout, Parameter};
pub use decode::{Cursor, Instruction, LaneOp, MAX_LANES};
pub use disasm::{disassemble, format_instruction};
pub use fault::{Fault, FaultKind, Space};
pub use interp::{Interpreter, InterpreterOptions, run};
pub use memory::{GlobalTable, SlotStack};
pub use opcode::{Opcode, Operands};
pub use program::{FunctionFile, Program, ProgramFile, ProgramFormat, load_program, parse_program};
pub use value::Value;
