//! First pass (C6)
//!
//! Walks the macro-expanded source one line at a time, growing the code and
//! data images, registering labels in the symbol table, and collecting a
//! pending-reference list for every operand that names a symbol — pass two
//! resolves those without re-scanning the code image (§9).

use crate::assembler::identifier;
use crate::assembler::lexer;
use crate::assembler::opcode::{self, Arity, Opcode};
use crate::assembler::operand::{self, Operand};
use crate::assembler::symbol::{SymbolKind, SymbolTable};
use crate::assembler::word::Word;
use crate::diagnostic::{Kind, Reporter};
use crate::preprocessor::MacroTable;

pub const CODE_BASE_ADDRESS: u16 = 100;
const DATA_VALUE_MIN: i32 = -16384;
const DATA_VALUE_MAX: i32 = 32767;
const STRING_CHAR_MAX: u32 = 127;

/// A not-yet-resolved reference to a symbol, left behind by a `Direct`
/// operand. Pass two overwrites the placeholder word at `address`.
#[derive(Debug, Clone)]
pub struct PendingReference {
    pub address: u16,
    pub name: String,
    pub line: usize,
}

/// Everything pass one hands to pass two and the emitter.
#[derive(Debug, Default)]
pub struct FirstPassOutput {
    pub symbols: SymbolTable,
    pub code: Vec<Word>,
    pub data: Vec<Word>,
    pub pending: Vec<PendingReference>,
}

impl FirstPassOutput {
    pub fn ic_end(&self) -> u16 {
        CODE_BASE_ADDRESS + self.code.len() as u16
    }
}

/// Split an optional `label:` prefix off the front of an already-trimmed
/// line. The reference scans for the first `:` without regard to context;
/// this does the same (§9 keeps the naive-but-adequate scan for this step).
fn split_label(line: &str) -> (Option<&str>, &str) {
    match line.find(':') {
        Some(idx) => (Some(&line[..idx]), &line[idx + 1..]),
        None => (None, line),
    }
}

/// Match an opcode mnemonic at the front of `text` by literal comparison
/// against the fixed 16-entry opcode table, the way the reference's
/// `find_command` does (`examples/original_source/assembler/first_phase.c`),
/// rather than scanning for "the end of the run of lowercase letters": the
/// lexer has already stripped every separator (§4.1), so a register operand
/// (`r0`..`r7`) or a lowercase-led label sitting right after the mnemonic is
/// itself a run of lowercase letters and can't be told apart from it by
/// character class alone.
fn match_opcode(text: &str) -> Option<(Opcode, &str)> {
    opcode::ALL_OPCODES
        .into_iter()
        .find_map(|op| text.strip_prefix(op.mnemonic()).map(|rest| (op, rest)))
}

/// Validate a comma-separated operand list against `expected`. Reports
/// [`Kind::InvalidComma`] for a leading, trailing or doubled comma (an empty
/// field in the split result) and [`Kind::IllegalComma`] for more
/// well-formed fields than the opcode's arity allows.
fn split_operand_list<'a>(
    text: &'a str,
    expected: Option<usize>,
    line_number: usize,
    reporter: &mut dyn Reporter,
) -> Option<Vec<&'a str>> {
    let fields = lexer::split_operands(text);
    if fields.iter().any(|f| f.is_empty()) {
        reporter.report(Some(line_number), Kind::InvalidComma);
        return None;
    }
    if let Some(expected) = expected {
        if fields.len() > expected {
            reporter.report(Some(line_number), Kind::IllegalComma);
            return None;
        }
    }
    Some(fields)
}

enum ExtensionSlot {
    Immediate(i16),
    RegisterPair { dest: Option<u16>, src: Option<u16> },
    PendingDirect(String),
}

/// Decide how many extension words this operand pair needs and what goes in
/// each, per §3: register-form operands on both sides share one word,
/// otherwise each non-`None` operand gets its own.
fn plan_extensions(src: Option<&Operand>, dest: &Operand) -> Vec<ExtensionSlot> {
    let src_is_register = src.map(Operand::is_register_form).unwrap_or(false);
    let dest_is_register = dest.is_register_form();

    if src_is_register && dest_is_register {
        return vec![ExtensionSlot::RegisterPair {
            dest: dest.register_number().map(u16::from),
            src: src.and_then(Operand::register_number).map(u16::from),
        }];
    }

    let mut slots = Vec::new();
    if let Some(operand) = src {
        if let Some(slot) = extension_slot_for(operand, true) {
            slots.push(slot);
        }
    }
    if let Some(slot) = extension_slot_for(dest, false) {
        slots.push(slot);
    }
    slots
}

fn extension_slot_for(operand: &Operand, is_src: bool) -> Option<ExtensionSlot> {
    match operand {
        Operand::Immediate(value) => Some(ExtensionSlot::Immediate(*value)),
        Operand::Direct(name) => Some(ExtensionSlot::PendingDirect(name.clone())),
        Operand::RegDirect(n) | Operand::RegIndirect(n) => {
            let n = Some(u16::from(*n));
            Some(if is_src {
                ExtensionSlot::RegisterPair { dest: None, src: n }
            } else {
                ExtensionSlot::RegisterPair { dest: n, src: None }
            })
        }
        Operand::None => None,
    }
}

struct Context<'r> {
    symbols: SymbolTable,
    code: Vec<Word>,
    data: Vec<Word>,
    pending: Vec<PendingReference>,
    macros: &'r MacroTable,
    reporter: &'r mut dyn Reporter,
}

impl<'r> Context<'r> {
    fn push_code(&mut self, word: Word, pending_name: Option<String>, line_number: usize) {
        if let Some(name) = pending_name {
            self.pending.push(PendingReference {
                address: CODE_BASE_ADDRESS + self.code.len() as u16,
                name,
                line: line_number,
            });
        }
        self.code.push(word);
    }

    /// Labels and macro names share one namespace (§4.2): a label can't
    /// shadow a name the pre-processor already bound to a macro body.
    /// Reports [`Kind::MacroNameAlreadyDefined`] and returns `true` if `name`
    /// collides.
    fn collides_with_a_macro(&mut self, name: &str, line_number: usize) -> bool {
        if self.macros.find(name).is_some() {
            self.reporter
                .report(Some(line_number), Kind::MacroNameAlreadyDefined { name: name.to_string() });
            true
        } else {
            false
        }
    }

    fn define_label(&mut self, label: Option<&str>, address: u16, kind: SymbolKind, line_number: usize) {
        let Some(name) = label else { return };
        if name.is_empty() {
            return;
        }
        if let Err(diag) = identifier::validate_label(name) {
            self.reporter.report(Some(line_number), diag);
            return;
        }
        if self.collides_with_a_macro(name, line_number) {
            return;
        }
        if let Err(diag) = self.symbols.define(name, address, kind) {
            self.reporter.report(Some(line_number), diag);
        }
    }

    fn handle_entry(&mut self, name: &str, line_number: usize) {
        if let Err(diag) = identifier::validate_label(name) {
            self.reporter.report(Some(line_number), diag);
            return;
        }
        if self.collides_with_a_macro(name, line_number) {
            return;
        }
        if let Err(diag) = self.symbols.declare_entry(name, line_number) {
            self.reporter.report(Some(line_number), diag);
        }
    }

    fn handle_extern(&mut self, name: &str, line_number: usize) {
        if let Err(diag) = identifier::validate_label(name) {
            self.reporter.report(Some(line_number), diag);
            return;
        }
        if self.collides_with_a_macro(name, line_number) {
            return;
        }
        if let Err(diag) = self.symbols.declare_extern(name) {
            self.reporter.report(Some(line_number), diag);
        }
    }

    fn handle_data(&mut self, label: Option<&str>, text: &str, line_number: usize) {
        let data_address = self.data.len() as u16;
        let Some(fields) = split_operand_list(text, None, line_number, self.reporter) else {
            return;
        };
        if fields.is_empty() {
            self.reporter.report(Some(line_number), Kind::MissingNumber);
            return;
        }
        let mut values = Vec::with_capacity(fields.len());
        let mut ok = true;
        for field in &fields {
            match field.parse::<i32>() {
                Ok(value) if (DATA_VALUE_MIN..=DATA_VALUE_MAX).contains(&value) => {
                    values.push(value as i16);
                }
                Ok(value) => {
                    self.reporter.report(Some(line_number), Kind::NumberOutOfBound { value });
                    ok = false;
                }
                Err(_) => {
                    self.reporter
                        .report(Some(line_number), Kind::IsNotANumber { token: field.to_string() });
                    ok = false;
                }
            }
        }
        if !ok {
            return;
        }
        self.define_label(label, data_address, SymbolKind::Data, line_number);
        for value in values {
            self.data.push(Word::data(value));
        }
    }

    fn handle_string(&mut self, label: Option<&str>, text: &str, line_number: usize) {
        let data_address = self.data.len() as u16;
        if !(text.starts_with('"') && text.ends_with('"') && text.len() >= 2) {
            self.reporter.report(Some(line_number), Kind::MissingQuote);
            return;
        }
        let body = &text[1..text.len() - 1];
        let mut values = Vec::with_capacity(body.chars().count() + 1);
        let mut ok = true;
        for ch in body.chars() {
            if (ch as u32) > STRING_CHAR_MAX {
                self.reporter.report(Some(line_number), Kind::InvalidCharacter { ch });
                ok = false;
                continue;
            }
            values.push(Word::data(ch as i16));
        }
        if !ok {
            return;
        }
        values.push(Word::data(0));
        self.define_label(label, data_address, SymbolKind::Data, line_number);
        self.data.extend(values);
    }

    fn handle_instruction(&mut self, label: Option<&str>, opcode: Opcode, operand_text: &str, line_number: usize) {
        let instruction_address = CODE_BASE_ADDRESS + self.code.len() as u16;

        match opcode.arity() {
            Arity::Zero => {
                if !operand_text.is_empty() {
                    let kind = if opcode == Opcode::Stop {
                        Kind::ExtraneousTextAfterStop
                    } else {
                        Kind::ExtraneousTextAfterRts
                    };
                    self.reporter.report(Some(line_number), kind);
                    return;
                }
                self.define_label(label, instruction_address, SymbolKind::Code, line_number);
                self.push_code(Word::instruction(opcode.code(), 0, 0), None, line_number);
            }
            Arity::One => {
                let Some(fields) = split_operand_list(operand_text, Some(1), line_number, self.reporter) else {
                    return;
                };
                if fields.is_empty() {
                    self.reporter.report(Some(line_number), Kind::MissingOperand);
                    return;
                }
                let dest = match operand::classify(fields[0]) {
                    Ok(o) => o,
                    Err(kind) => {
                        self.reporter.report(Some(line_number), kind);
                        return;
                    }
                };
                if dest.mode_mask() & opcode.dest_legal_modes() == 0 {
                    self.reporter
                        .report(Some(line_number), Kind::IllegalOperand { operand: fields[0].to_string() });
                    return;
                }
                self.define_label(label, instruction_address, SymbolKind::Code, line_number);
                self.push_code(Word::instruction(opcode.code(), 0, dest.mode_mask()), None, line_number);
                for slot in plan_extensions(None, &dest) {
                    self.push_extension_slot(slot, line_number);
                }
            }
            Arity::Two => {
                let Some(fields) = split_operand_list(operand_text, Some(2), line_number, self.reporter) else {
                    return;
                };
                if fields.len() < 2 {
                    self.reporter.report(Some(line_number), Kind::MissingOperand);
                    return;
                }
                let src = match operand::classify(fields[0]) {
                    Ok(o) => o,
                    Err(kind) => {
                        self.reporter.report(Some(line_number), kind);
                        return;
                    }
                };
                let dest = match operand::classify(fields[1]) {
                    Ok(o) => o,
                    Err(kind) => {
                        self.reporter.report(Some(line_number), kind);
                        return;
                    }
                };
                if src.mode_mask() & opcode.src_legal_modes() == 0 {
                    self.reporter
                        .report(Some(line_number), Kind::IllegalOperand { operand: fields[0].to_string() });
                    return;
                }
                if dest.mode_mask() & opcode.dest_legal_modes() == 0 {
                    self.reporter
                        .report(Some(line_number), Kind::IllegalOperand { operand: fields[1].to_string() });
                    return;
                }
                self.define_label(label, instruction_address, SymbolKind::Code, line_number);
                self.push_code(
                    Word::instruction(opcode.code(), src.mode_mask(), dest.mode_mask()),
                    None,
                    line_number,
                );
                for slot in plan_extensions(Some(&src), &dest) {
                    self.push_extension_slot(slot, line_number);
                }
            }
        }
    }

    fn push_extension_slot(&mut self, slot: ExtensionSlot, line_number: usize) {
        match slot {
            ExtensionSlot::Immediate(value) => self.push_code(Word::immediate(value), None, line_number),
            ExtensionSlot::RegisterPair { dest, src } => {
                self.push_code(Word::register_pair(dest, src), None, line_number)
            }
            ExtensionSlot::PendingDirect(name) => {
                self.push_code(Word::pending_reference(), Some(name), line_number)
            }
        }
    }
}

/// Run the first pass over `source` (already macro-expanded). `macros` is
/// the table the pre-processor built over the same source, kept around so a
/// label, `.entry` or `.extern` name can be checked against it (§4.2: labels
/// and macro names share one rule set, but the macro table itself doesn't
/// survive the pre-processor otherwise). Diagnostics are reported through
/// `reporter`; the caller checks [`Reporter::had_error`] before proceeding to
/// pass two.
pub fn run(source: &str, macros: &MacroTable, reporter: &mut dyn Reporter) -> FirstPassOutput {
    let mut ctx = Context {
        symbols: SymbolTable::new(),
        code: Vec::new(),
        data: Vec::new(),
        pending: Vec::new(),
        macros,
        reporter,
    };

    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;
        if line.is_empty() {
            continue;
        }

        let (label, rest) = split_label(line);

        if let Some(name) = rest.strip_prefix(".entry") {
            ctx.handle_entry(name, line_number);
            continue;
        }
        if let Some(name) = rest.strip_prefix(".extern") {
            ctx.handle_extern(name, line_number);
            continue;
        }
        if let Some(values) = rest.strip_prefix(".data") {
            ctx.handle_data(label, values, line_number);
            continue;
        }
        if let Some(text) = rest.strip_prefix(".string") {
            ctx.handle_string(label, text, line_number);
            continue;
        }
        if rest.is_empty() {
            continue;
        }

        match match_opcode(rest) {
            Some((opcode, operand_text)) => ctx.handle_instruction(label, opcode, operand_text, line_number),
            None => ctx.reporter.report(Some(line_number), Kind::UndefinedInstruction { text: rest.to_string() }),
        }
    }

    let ic_end = CODE_BASE_ADDRESS + ctx.code.len() as u16;
    for (name, definition) in ctx.symbols.definitions().map(|(n, d)| (n.clone(), d.clone())).collect::<Vec<_>>() {
        if definition.kind == SymbolKind::Data {
            ctx.symbols.rebase_data_address(&name, ic_end + definition.address);
        }
    }

    FirstPassOutput {
        symbols: ctx.symbols,
        code: ctx.code,
        data: ctx.data,
        pending: ctx.pending,
    }
}
