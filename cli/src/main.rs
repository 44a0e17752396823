use std::path::{Component, Path, PathBuf};

use anyhow::{Context, ensure};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use shadevm_core::vm::{Function, Interpreter, InterpreterOptions, Value, assemble, disassemble, load_program, parse_immediate};
use tracing_subscriber::EnvFilter;


const TRACE_ENV: &str = "SHADEVM_TRACE";
const DEFAULT_TRACE_FILTER: &str =
    "shadevm::interp=debug,shadevm::debug_print=info,shadevm::program=debug,shadevm::batch=debug";

#[derive(Debug, Parser)]
#[command(
    name = "shadevm",
    author,
    version,
    about = "Run and inspect shader byte-code",
    long_about = None,
    after_help = "Set SHADEVM_TRACE=1 (or a filter such as shadevm::interp=trace) to log to stderr."
)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,
}

/// How result slots are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum View {
    #[default]
    Int,
    Uint,
    Float,
    Bits,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Execute one function of a program file.
    Run {
        /// Program manifest (.json, .toml, .yaml)
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        /// Function to run; defaults to `main` or the only function
        #[arg(long)]
        function: Option<String>,
        /// Parameter slots, comma separated (ints, floats, 0x bits, true/false)
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        args: Vec<String>,
        /// Input global slots, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        inputs: Vec<String>,
        /// Instruction budget; overrides SHADEVM_MAX_STEPS
        #[arg(long)]
        max_steps: Option<u64>,
        #[arg(long, value_enum, default_value_t = View::Int)]
        view: View,
        /// Print a JSON object instead of plain lines
        #[arg(long)]
        json: bool,
    },
    /// Print the instruction listing of a program file or raw .bin body.
    Disasm {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        #[arg(long)]
        function: Option<String>,
    },
    /// Assemble text into a raw byte-code body.
    Asm {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        /// Output path; defaults to FILE with a .bin extension
        #[arg(short, long, value_parser = parse_sanitized_path)]
        output: Option<PathBuf>,
    },
}

fn sanitize_path(raw: &str) -> anyhow::Result<PathBuf> {
    let path = PathBuf::from(raw);
    ensure!(
        !path.components().any(|c| c == Component::ParentDir),
        "'..' is not allowed in file paths: {raw}"
    );
    Ok(path)
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

/// Reads a `SHADEVM_TRACE` value: `None` leaves tracing off, `Some(None)`
/// falls back to `RUST_LOG` or the default filter, and `Some(Some(expr))`
/// carries an explicit filter.
fn trace_setting(raw: &str) -> Option<Option<String>> {
    let trimmed = raw.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "off" => None,
        "1" | "true" | "on" => Some(None),
        _ => Some(Some(trimmed.to_string())),
    }
}

fn init_tracing() {
    let Some(setting) = std::env::var(TRACE_ENV).ok().and_then(|raw| trace_setting(&raw)) else {
        return;
    };
    let filter = setting
        .or_else(|| std::env::var("RUST_LOG").ok())
        .and_then(|expr| EnvFilter::try_new(expr).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_TRACE_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

fn parse_values(raw: &[String]) -> anyhow::Result<Vec<Value>> {
    raw.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(parse_immediate)
        .collect()
}

/// One slot rendered in the requested view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
enum Rendered {
    Int(i32),
    Uint(u32),
    Float(f32),
    Bits(String),
}

impl View {
    fn render(self, value: Value) -> Rendered {
        match self {
            View::Int => Rendered::Int(value.as_i32()),
            View::Uint => Rendered::Uint(value.as_u32()),
            View::Float => Rendered::Float(value.as_f32()),
            View::Bits => Rendered::Bits(value.to_string()),
        }
    }
}

impl std::fmt::Display for Rendered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rendered::Int(v) => write!(f, "{v}"),
            Rendered::Uint(v) => write!(f, "{v}"),
            Rendered::Float(v) => write!(f, "{v}"),
            Rendered::Bits(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Serialize)]
struct RunReport {
    function: String,
    results: Vec<Rendered>,
    /// Final argument slots; only present when the function has `out` parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<Vec<Rendered>>,
    steps: u64,
}

fn join(values: &[Rendered]) -> String {
    values.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn run_function(
    function: &Function,
    args: &[String],
    inputs: &[String],
    max_steps: Option<u64>,
    view: View,
) -> anyhow::Result<RunReport> {
    let mut args = parse_values(args).context("invalid --args")?;
    let inputs = parse_values(inputs).context("invalid --inputs")?;

    let mut options = InterpreterOptions::from_env();
    if let Some(limit) = max_steps {
        options = options.with_instruction_budget(limit);
    }
    let mut interp = Interpreter::with_options(options);
    let results = interp
        .run(function, &mut args, &inputs)
        .with_context(|| format!("function '{}' faulted", function.name))?
        .iter()
        .map(|v| view.render(*v))
        .collect();

    let has_out = function.parameters.iter().any(|p| p.out);
    Ok(RunReport {
        function: function.name.clone(),
        results,
        args: has_out.then(|| args.iter().map(|v| view.render(*v)).collect()),
        steps: interp.steps(),
    })
}

fn disasm_file(path: &Path, function: Option<&str>) -> anyhow::Result<String> {
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("bin")) {
        let code = std::fs::read(path).with_context(|| format!("Failed to read file '{}'", path.display()))?;
        return Ok(disassemble(&code)?);
    }

    let program = load_program(path)?;
    let selected: Vec<&Function> = match function {
        Some(name) => vec![program.entry(Some(name))?],
        None => program.functions.iter().collect(),
    };
    let mut out = String::new();
    for f in selected {
        let listing = disassemble(&f.code).with_context(|| format!("disassembling '{}'", f.name))?;
        out.push_str(&format!("; function {}\n", f.name));
        out.push_str(&listing);
    }
    Ok(out)
}

fn asm_file(path: &Path, output: Option<PathBuf>) -> anyhow::Result<(PathBuf, usize)> {
    let source =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path.display()))?;
    let code = assemble(&source).with_context(|| format!("assembling '{}'", path.display()))?;
    let out_path = output.unwrap_or_else(|| path.with_extension("bin"));
    std::fs::write(&out_path, &code).with_context(|| format!("Failed to write '{}'", out_path.display()))?;
    Ok((out_path, code.len()))
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let CliArgs { command } = CliArgs::parse();
    match command {
        Commands::Run {
            file,
            function,
            args,
            inputs,
            max_steps,
            view,
            json,
        } => {
            let program = load_program(&file)?;
            let entry = program.entry(function.as_deref())?;
            let report = run_function(entry, &args, &inputs, max_steps, view)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for value in &report.results {
                    println!("{value}");
                }
                if let Some(args) = &report.args {
                    eprintln!("args: {}", join(args));
                }
            }
        }
        Commands::Disasm { file, function } => {
            print!("{}", disasm_file(&file, function.as_deref())?);
        }
        Commands::Asm { file, output } => {
            let (out_path, len) = asm_file(&file, output)?;
            eprintln!("Emitted bytecode to {} ({} bytes)", out_path.display(), len);
        }
    }
    Ok(())
}
