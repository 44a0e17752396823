//! Program manifests: layout metadata plus one or more function bodies,
//! stored as JSON, TOML or YAML.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail, ensure};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::asm::assemble;
use super::bytecode::{Function, GlobalLayout, Parameter};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramFile {
    /// Number of global slots.
    #[serde(default)]
    pub globals: usize,
    /// Global indices filled from the caller's inputs.
    #[serde(default)]
    pub inputs: Vec<usize>,
    pub functions: Vec<FunctionFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionFile {
    pub name: String,
    #[serde(default)]
    pub locals: usize,
    #[serde(default)]
    pub params: Vec<Parameter>,
    /// Assembly text; mutually exclusive with `code`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asm: Option<String>,
    /// Raw byte-code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramFormat {
    Json,
    Toml,
    Yaml,
}

impl ProgramFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| anyhow!("cannot infer program format of '{}' without an extension", path.display()))?;
        match ext.as_str() {
            "json" => Ok(ProgramFormat::Json),
            "toml" => Ok(ProgramFormat::Toml),
            "yaml" | "yml" => Ok(ProgramFormat::Yaml),
            other => bail!("unsupported program format '.{other}' (expected .json, .toml, .yaml)"),
        }
    }
}

/// A loaded program: functions sharing one global layout.
#[derive(Debug, Clone)]
pub struct Program {
    pub layout: Arc<GlobalLayout>,
    pub functions: Vec<Function>,
}

impl Program {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// `name` if given, otherwise `main`, otherwise the only function.
    pub fn entry(&self, name: Option<&str>) -> Result<&Function> {
        if let Some(name) = name {
            return self.function(name).ok_or_else(|| anyhow!("no function named '{name}'"));
        }
        if let Some(main) = self.function("main") {
            return Ok(main);
        }
        match self.functions.as_slice() {
            [only] => Ok(only),
            _ => bail!("program has no 'main'; pick a function explicitly"),
        }
    }
}

impl TryFrom<ProgramFile> for Program {
    type Error = anyhow::Error;

    fn try_from(file: ProgramFile) -> Result<Self> {
        for slot in &file.inputs {
            ensure!(
                *slot < file.globals,
                "input slot {slot} outside the {} declared globals",
                file.globals
            );
        }
        let layout = Arc::new(GlobalLayout::new(file.globals, file.inputs));
        let mut seen = FxHashSet::default();
        let mut functions = Vec::with_capacity(file.functions.len());
        for f in file.functions {
            ensure!(seen.insert(f.name.clone()), "duplicate function '{}'", f.name);
            let code = match (f.asm, f.code) {
                (Some(text), None) => assemble(&text).with_context(|| format!("assembling '{}'", f.name))?,
                (None, Some(code)) => code,
                (Some(_), Some(_)) => bail!("function '{}' has both 'asm' and 'code'", f.name),
                (None, None) => bail!("function '{}' has neither 'asm' nor 'code'", f.name),
            };
            functions.push(
                Function::new(f.name, code, Arc::clone(&layout))
                    .with_parameters(f.params)
                    .with_locals(f.locals),
            );
        }
        Ok(Program { layout, functions })
    }
}

pub fn parse_program(text: &str, format: ProgramFormat) -> Result<Program> {
    let file: ProgramFile = match format {
        ProgramFormat::Json => serde_json::from_str(text).context("invalid JSON program")?,
        ProgramFormat::Toml => toml::from_str(text).context("invalid TOML program")?,
        ProgramFormat::Yaml => serde_yaml::from_str(text).context("invalid YAML program")?,
    };
    Program::try_from(file)
}

pub fn load_program(path: &Path) -> Result<Program> {
    let format = ProgramFormat::from_path(path)?;
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    let program = parse_program(&text, format).with_context(|| format!("loading '{}'", path.display()))?;
    debug!(
        target: "shadevm::program",
        path = %path.display(),
        functions = program.functions.len(),
        globals = program.layout.global_count,
        "program loaded"
    );
    Ok(program)
}
