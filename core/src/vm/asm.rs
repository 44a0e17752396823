//! Byte-code assembler.
//!
//! [`Assembler`] emits instructions with the `nop` padding the decoder
//! requires for wide operands and patches label references on
//! [`Assembler::finish`]. [`assemble`] parses the text syntax printed by the
//! disassembler, plus `label:` definitions and `;`/`#` comments. Compares
//! may also be written as two words (`compares gt`).

use anyhow::{Context, Result, anyhow, bail, ensure};
use rustc_hash::FxHashMap;

use super::decode::MAX_LANES;
use super::opcode::{Opcode, Operands};
use super::value::Value;

/// Branch destination bound with [`Assembler::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(usize);

#[derive(Debug, Default)]
pub struct Assembler {
    code: Vec<u8>,
    labels: Vec<Option<usize>>,
    fixups: Vec<(usize, Label)>,
    errors: Vec<String>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset the next emitted byte will land on.
    pub fn position(&self) -> usize {
        self.code.len()
    }

    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    pub fn bind(&mut self, label: Label) -> &mut Self {
        let here = self.code.len();
        match self.labels.get(label.0).copied() {
            Some(None) => self.labels[label.0] = Some(here),
            Some(Some(prev)) => self.errors.push(format!("label {} bound twice (at {prev} and {here})", label.0)),
            None => self.errors.push(format!("label {} was not created by this assembler", label.0)),
        }
        self
    }

    /// Pads with `nop` so an operand of `width` bytes, placed `header` bytes
    /// after the current position, is naturally aligned.
    fn align(&mut self, header: usize, width: usize) {
        while (self.code.len() + header) % width != 0 {
            self.code.push(Opcode::Nop.byte());
        }
    }

    /// Emits an opcode that takes no inline operands.
    pub fn op(&mut self, op: Opcode) -> &mut Self {
        if op.operands() != Operands::None {
            self.errors.push(format!("'{op}' requires operands"));
        }
        self.code.push(op.byte());
        self
    }

    pub fn push_immediate(&mut self, value: impl Into<Value>) -> &mut Self {
        self.align(1, 4);
        self.code.push(Opcode::PushImmediate.byte());
        self.code.extend_from_slice(&value.into().bits().to_le_bytes());
        self
    }

    fn emit_target(&mut self, label: Label) {
        self.fixups.push((self.code.len(), label));
        self.code.extend_from_slice(&[0, 0]);
    }

    pub fn branch(&mut self, label: Label) -> &mut Self {
        self.align(1, 2);
        self.code.push(Opcode::Branch.byte());
        self.emit_target(label);
        self
    }

    pub fn conditional_branch(&mut self, label: Label) -> &mut Self {
        self.align(1, 2);
        self.code.push(Opcode::ConditionalBranch.byte());
        self.emit_target(label);
        self
    }

    fn byte_op(&mut self, op: Opcode, n: u8) -> &mut Self {
        self.code.extend_from_slice(&[op.byte(), n]);
        self
    }

    pub fn dup_down(&mut self, count: u8) -> &mut Self {
        self.byte_op(Opcode::DupDown, count)
    }

    pub fn load_global(&mut self, index: u8) -> &mut Self {
        self.byte_op(Opcode::LoadGlobal, index)
    }

    pub fn pop(&mut self, count: u8) -> &mut Self {
        self.byte_op(Opcode::Pop, count)
    }

    pub fn ret(&mut self, count: u8) -> &mut Self {
        self.byte_op(Opcode::Return, count)
    }

    fn offsets_op(&mut self, op: Opcode, offsets: &[u8]) -> &mut Self {
        match u8::try_from(offsets.len()) {
            Ok(count) => {
                self.code.extend_from_slice(&[op.byte(), count]);
                self.code.extend_from_slice(offsets);
            }
            Err(_) => self.errors.push(format!("'{op}' takes at most 255 offsets")),
        }
        self
    }

    pub fn load_swizzle(&mut self, offsets: &[u8]) -> &mut Self {
        self.offsets_op(Opcode::LoadSwizzle, offsets)
    }

    pub fn store_swizzle(&mut self, offsets: &[u8]) -> &mut Self {
        self.offsets_op(Opcode::StoreSwizzle, offsets)
    }

    pub fn swizzle(&mut self, src: u8, indices: &[u8]) -> &mut Self {
        match u8::try_from(indices.len()) {
            Ok(count) => {
                self.code.extend_from_slice(&[Opcode::Swizzle.byte(), src, count]);
                self.code.extend_from_slice(indices);
            }
            Err(_) => self.errors.push("'swizzle' takes at most 255 indices".to_string()),
        }
        self
    }

    fn check_lanes(&mut self, lanes: u8) {
        if lanes == 0 || lanes as usize > MAX_LANES {
            self.errors.push(format!("lane count {lanes} outside 1..={MAX_LANES}"));
        }
    }

    /// `vector lanes op` for operand-less lane ops (arithmetic, comparisons,
    /// conversions, `load`, `store`).
    pub fn vector(&mut self, lanes: u8, op: Opcode) -> &mut Self {
        self.check_lanes(lanes);
        if op.operands() != Operands::None {
            self.errors.push(format!("'vector {op}' requires operands"));
        }
        self.code.extend_from_slice(&[Opcode::Vector.byte(), lanes, op.byte()]);
        self
    }

    pub fn vector_load_global(&mut self, lanes: u8, index: u8) -> &mut Self {
        self.check_lanes(lanes);
        self.code
            .extend_from_slice(&[Opcode::Vector.byte(), lanes, Opcode::LoadGlobal.byte(), index]);
        self
    }

    /// `vector lanes branch|conditionalbranch label`.
    pub fn vector_branch(&mut self, lanes: u8, op: Opcode, label: Label) -> &mut Self {
        self.check_lanes(lanes);
        if !matches!(op, Opcode::Branch | Opcode::ConditionalBranch) {
            self.errors.push(format!("'vector {op}' is not a branch"));
        }
        self.align(3, 2);
        self.code.extend_from_slice(&[Opcode::Vector.byte(), lanes, op.byte()]);
        self.emit_target(label);
        self
    }

    /// Resolves labels and returns the finished body.
    pub fn finish(self) -> Result<Vec<u8>> {
        if let Some(first) = self.errors.first() {
            bail!("{first}");
        }
        let mut code = self.code;
        for (at, label) in self.fixups {
            let target = self
                .labels
                .get(label.0)
                .copied()
                .flatten()
                .ok_or_else(|| anyhow!("label {} referenced but never bound", label.0))?;
            let target = u16::try_from(target).map_err(|_| anyhow!("branch target {target} exceeds 16 bits"))?;
            code[at..at + 2].copy_from_slice(&target.to_le_bytes());
        }
        Ok(code)
    }
}

fn parse_u8(token: &str) -> Result<u8> {
    let value = if let Some(hex) = token.strip_prefix("0x") {
        u8::from_str_radix(hex, 16)
    } else {
        token.parse::<u8>()
    };
    value.with_context(|| format!("expected a byte, found '{token}'"))
}

/// Parses an immediate: `true`/`false`, `0x` hex bits, a float literal, or a
/// signed/unsigned 32-bit integer.
pub fn parse_immediate(token: &str) -> Result<Value> {
    let lower = token.to_ascii_lowercase();
    match lower.as_str() {
        "true" => return Ok(Value::TRUE),
        "false" => return Ok(Value::FALSE),
        _ => {}
    }
    if let Some(hex) = lower.strip_prefix("0x") {
        let bits = u32::from_str_radix(hex, 16).with_context(|| format!("invalid hex immediate '{token}'"))?;
        return Ok(Value::from_bits(bits));
    }
    let looks_float = lower.contains('.') || lower.contains('e') || lower.contains("inf") || lower.contains("nan");
    if looks_float {
        let f = lower
            .parse::<f32>()
            .with_context(|| format!("invalid float immediate '{token}'"))?;
        return Ok(Value::from_f32(f));
    }
    let wide = lower
        .parse::<i64>()
        .with_context(|| format!("invalid integer immediate '{token}'"))?;
    if let Ok(v) = i32::try_from(wide) {
        Ok(Value::from_i32(v))
    } else if let Ok(v) = u32::try_from(wide) {
        Ok(Value::from_u32(v))
    } else {
        bail!("immediate '{token}' does not fit in 32 bits")
    }
}

struct TextAssembler {
    asm: Assembler,
    labels: FxHashMap<String, Label>,
    referenced: Vec<(String, usize)>,
}

impl TextAssembler {
    fn label(&mut self, name: &str) -> Label {
        if let Some(label) = self.labels.get(name) {
            return *label;
        }
        let label = self.asm.new_label();
        self.labels.insert(name.to_string(), label);
        label
    }

    /// Branch operand: a label name, or a literal offset that gets bound to a
    /// synthetic label.
    fn target(&mut self, token: &str, line: usize) -> Result<Label> {
        if token.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            let offset: u16 = token
                .parse()
                .with_context(|| format!("invalid branch target '{token}'"))?;
            self.referenced.push((token.to_string(), line));
            return Ok(self.literal_target(offset));
        }
        self.referenced.push((token.to_string(), line));
        Ok(self.label(token))
    }

    fn literal_target(&mut self, offset: u16) -> Label {
        // Literal offsets are resolved on finish by pre-binding a label.
        let key = format!("@{offset}");
        if let Some(label) = self.labels.get(&key) {
            return *label;
        }
        let label = Label(self.asm.labels.len());
        self.asm.labels.push(Some(offset as usize));
        self.labels.insert(key, label);
        label
    }

    fn instruction(&mut self, tokens: &[&str], line: usize) -> Result<()> {
        let (mnemonic, args) = tokens.split_first().ok_or_else(|| anyhow!("empty instruction"))?;
        let op = Opcode::from_mnemonic(&mnemonic.to_ascii_lowercase())
            .ok_or_else(|| anyhow!("unknown mnemonic '{mnemonic}'"))?;
        let arity = |n: usize| -> Result<()> {
            ensure!(args.len() == n, "'{op}' takes {n} operand(s), found {}", args.len());
            Ok(())
        };
        match op.operands() {
            Operands::None => {
                arity(0)?;
                self.asm.op(op);
            }
            Operands::Target => {
                arity(1)?;
                let label = self.target(args[0], line)?;
                if op == Opcode::Branch {
                    self.asm.branch(label);
                } else {
                    self.asm.conditional_branch(label);
                }
            }
            Operands::Byte => {
                arity(1)?;
                let n = parse_u8(args[0])?;
                match op {
                    Opcode::DupDown => self.asm.dup_down(n),
                    Opcode::LoadGlobal => self.asm.load_global(n),
                    Opcode::Pop => self.asm.pop(n),
                    _ => self.asm.ret(n),
                };
            }
            Operands::Word => {
                arity(1)?;
                let value = parse_immediate(args[0])?;
                self.asm.push_immediate(value);
            }
            Operands::ByteList => {
                ensure!(!args.is_empty(), "'{op}' needs a count");
                let count = parse_u8(args[0])? as usize;
                arity(count + 1)?;
                let offsets = args[1..].iter().map(|t| parse_u8(t)).collect::<Result<Vec<_>>>()?;
                if op == Opcode::LoadSwizzle {
                    self.asm.load_swizzle(&offsets);
                } else {
                    self.asm.store_swizzle(&offsets);
                }
            }
            Operands::Swizzle => {
                ensure!(args.len() >= 2, "'swizzle' needs source and destination counts");
                let src = parse_u8(args[0])?;
                let count = parse_u8(args[1])? as usize;
                arity(count + 2)?;
                let indices = args[2..].iter().map(|t| parse_u8(t)).collect::<Result<Vec<_>>>()?;
                self.asm.swizzle(src, &indices);
            }
            Operands::Vector => {
                ensure!(args.len() >= 2, "'vector' needs a lane count and an instruction");
                let lanes = parse_u8(args[0])?;
                let inner = Opcode::from_mnemonic(&args[1].to_ascii_lowercase())
                    .ok_or_else(|| anyhow!("unknown mnemonic '{}'", args[1]))?;
                match inner.operands() {
                    Operands::None => {
                        arity(2)?;
                        self.asm.vector(lanes, inner);
                    }
                    Operands::Target => {
                        arity(3)?;
                        let label = self.target(args[2], line)?;
                        self.asm.vector_branch(lanes, inner, label);
                    }
                    Operands::Byte if inner == Opcode::LoadGlobal => {
                        arity(3)?;
                        let index = parse_u8(args[2])?;
                        self.asm.vector_load_global(lanes, index);
                    }
                    _ => bail!("'{inner}' cannot be used inside vector"),
                }
            }
        }
        Ok(())
    }
}

const COMPARE_FAMILIES: [&str; 4] = ["comparei", "comparef", "compares", "compareu"];

/// Joins the two-word compare spelling (`compares gt`) into its mnemonic
/// (`comparesgt`).
fn fuse_compare_mnemonics<'a>(tokens: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in tokens {
        if let Some(prev) = out.last_mut()
            && COMPARE_FAMILIES.iter().any(|family| prev.eq_ignore_ascii_case(family))
        {
            prev.push_str(token);
            continue;
        }
        out.push(token.to_string());
    }
    out
}

/// Assembles source text into a byte-code body.
pub fn assemble(source: &str) -> Result<Vec<u8>> {
    let mut text = TextAssembler {
        asm: Assembler::new(),
        labels: FxHashMap::default(),
        referenced: Vec::new(),
    };
    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        let body = raw.split([';', '#']).next().unwrap_or_default();
        let mut rest = body.trim();
        while let Some((name, tail)) = rest.split_once(':') {
            let name = name.trim();
            ensure!(
                !name.is_empty() && !name.contains(char::is_whitespace),
                "line {line}: malformed label '{name}'"
            );
            let label = text.label(name);
            text.asm.bind(label);
            rest = tail.trim();
        }
        if rest.is_empty() {
            continue;
        }
        let cleaned = rest.replace(',', " ");
        let tokens = fuse_compare_mnemonics(cleaned.split_whitespace());
        let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
        text.instruction(&tokens, line).with_context(|| format!("line {line}"))?;
    }
    for (name, line) in &text.referenced {
        if let Some(label) = text.labels.get(name) {
            ensure!(
                text.asm.labels[label.0].is_some(),
                "line {line}: undefined label '{name}'"
            );
        }
    }
    text.asm.finish()
}
