mod dispatch;
mod lanes;

use tracing::{Level, debug, trace, warn};

use super::bytecode::Function;
use super::disasm::disassemble;
use super::fault::{Fault, FaultKind};
use super::memory::{GlobalTable, SlotStack};
use super::value::Value;

pub(crate) const TRACE_TARGET: &str = "shadevm::interp";

/// Tunables for one interpreter instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterpreterOptions {
    /// Maximum instructions a single invocation may execute. `None` lets a
    /// non-terminating program run forever.
    pub instruction_budget: Option<u64>,
}

impl InterpreterOptions {
    pub const BUDGET_ENV: &'static str = "SHADEVM_MAX_STEPS";

    pub fn with_instruction_budget(mut self, limit: u64) -> Self {
        self.instruction_budget = Some(limit);
        self
    }

    /// Reads `SHADEVM_MAX_STEPS`; unset or unparsable values leave the
    /// budget disabled.
    pub fn from_env() -> Self {
        Self {
            instruction_budget: std::env::var(Self::BUDGET_ENV).ok().and_then(|raw| parse_budget(&raw)),
        }
    }
}

fn parse_budget(raw: &str) -> Option<u64> {
    match raw.trim().parse::<u64>() {
        Ok(limit) => Some(limit),
        Err(err) => {
            warn!(target: TRACE_TARGET, value = %raw, error = %err, "ignoring invalid {}", InterpreterOptions::BUDGET_ENV);
            None
        }
    }
}

/// Executes byte-code functions one invocation at a time.
///
/// The stack and global table are private to the instance and cleared at the
/// start of every [`Interpreter::run`], so a faulted invocation never leaks
/// state into the next one. Run concurrent invocations on separate
/// instances.
#[derive(Debug, Default)]
pub struct Interpreter {
    stack: SlotStack,
    globals: GlobalTable,
    options: InterpreterOptions,
    steps: u64,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: InterpreterOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> InterpreterOptions {
        self.options
    }

    /// Stack contents left by the last invocation.
    pub fn stack(&self) -> &[Value] {
        self.stack.as_slice()
    }

    /// Global slots left by the last invocation.
    pub fn globals(&self) -> &[Value] {
        self.globals.as_slice()
    }

    /// Instructions executed by the last invocation.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Runs `function` to completion.
    ///
    /// `args` supplies the parameter slots in declaration order and receives
    /// the final value of every `out` parameter at the same offset. `inputs`
    /// fills the owner's input slots. Returns the slots handed back by the
    /// terminal `return`.
    pub fn run(&mut self, function: &Function, args: &mut [Value], inputs: &[Value]) -> Result<&[Value], Fault> {
        self.prepare(function, args, inputs)?;

        if tracing::enabled!(target: TRACE_TARGET, Level::TRACE)
            && let Ok(listing) = disassemble(&function.code)
        {
            trace!(target: TRACE_TARGET, function = %function.name, "\n{listing}");
        }

        let count = match self.execute(&function.code) {
            Ok(count) => count,
            Err(fault) => {
                debug!(target: TRACE_TARGET, function = %function.name, %fault, steps = self.steps, "invocation faulted");
                return Err(fault);
            }
        };
        self.copy_out(function, args)?;
        debug!(
            target: TRACE_TARGET,
            function = %function.name,
            results = count,
            steps = self.steps,
            "invocation finished"
        );
        Ok(&self.stack.as_slice()[..count])
    }

    fn prepare(&mut self, function: &Function, args: &[Value], inputs: &[Value]) -> Result<(), Fault> {
        self.steps = 0;
        let expected = function.parameter_slots();
        if args.len() < expected {
            return Err(FaultKind::ArgumentCount {
                expected,
                actual: args.len(),
            }
            .into());
        }
        let layout = &function.owner;
        if inputs.len() != layout.input_slots.len() {
            return Err(FaultKind::InputCount {
                expected: layout.input_slots.len(),
                actual: inputs.len(),
            }
            .into());
        }

        self.stack.clear();
        for value in &args[..expected] {
            self.stack.push(*value);
        }
        for _ in 0..function.local_count {
            self.stack.push(Value::UNINITIALIZED);
        }
        self.globals.reset(layout.global_count, Value::UNINITIALIZED);
        for (slot, value) in layout.input_slots.iter().zip(inputs) {
            self.globals.set(*slot as i64, *value)?;
        }

        debug!(
            target: TRACE_TARGET,
            function = %function.name,
            params = expected,
            locals = function.local_count,
            globals = layout.global_count,
            "invocation start"
        );
        Ok(())
    }

    /// Copies `out` parameters back into `args`. The write cursor advances
    /// past every parameter, so `in` parameters keep their caller values.
    fn copy_out(&self, function: &Function, args: &mut [Value]) -> Result<(), Fault> {
        let mut offset = 0usize;
        for param in &function.parameters {
            let width = param.width as usize;
            if param.out {
                for slot in offset..offset + width {
                    args[slot] = self.stack.get(slot as i64)?;
                }
            }
            offset += width;
        }
        Ok(())
    }
}

/// Runs `function` on a fresh interpreter and returns an owned copy of its
/// results.
pub fn run(function: &Function, args: &mut [Value], inputs: &[Value]) -> Result<Vec<Value>, Fault> {
    let mut interp = Interpreter::new();
    interp.run(function, args, inputs).map(<[Value]>::to_vec)
}
