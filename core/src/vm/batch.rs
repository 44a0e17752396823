//! Many invocations of one function, spread over worker threads.
//!
//! Each worker owns a private [`Interpreter`]; nothing mutable is shared, so
//! no locking is involved.

use std::panic;

use tracing::debug;

use super::bytecode::Function;
use super::fault::Fault;
use super::interp::{Interpreter, InterpreterOptions};
use super::value::Value;

/// Arguments and inputs for one invocation. `args` receives the `out`
/// parameters after the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    pub args: Vec<Value>,
    pub inputs: Vec<Value>,
}

impl Invocation {
    pub fn new(args: Vec<Value>, inputs: Vec<Value>) -> Self {
        Self { args, inputs }
    }
}

pub type Outcome = Result<Vec<Value>, Fault>;

fn run_chunk(function: &Function, chunk: &mut [Invocation], options: InterpreterOptions) -> Vec<Outcome> {
    let mut interp = Interpreter::with_options(options);
    chunk
        .iter_mut()
        .map(|inv| interp.run(function, &mut inv.args, &inv.inputs).map(<[Value]>::to_vec))
        .collect()
}

/// Runs every invocation and returns the outcomes in input order.
///
/// `workers` is clamped to `1..=invocations.len()`; with one worker the batch
/// runs on the calling thread.
pub fn run_batch(
    function: &Function,
    invocations: &mut [Invocation],
    options: InterpreterOptions,
    workers: usize,
) -> Vec<Outcome> {
    let workers = workers.clamp(1, invocations.len().max(1));
    debug!(
        target: "shadevm::batch",
        function = %function.name,
        invocations = invocations.len(),
        workers,
        "running batch"
    );
    if workers == 1 {
        return run_chunk(function, invocations, options);
    }

    let chunk_len = invocations.len().div_ceil(workers);
    let joined = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = invocations
            .chunks_mut(chunk_len)
            .map(|chunk| scope.spawn(move |_| run_chunk(function, chunk, options)))
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
            .collect::<Vec<_>>()
    });
    joined.unwrap_or_else(|payload| panic::resume_unwind(payload))
}
