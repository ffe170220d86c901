//! Identifier validator (C2)
//!
//! One rule set shared by label names and macro names, plus the
//! reserved-word check both layers need. [`validate`] implements the rule;
//! [`validate_label`] and [`validate_macro_name`] map its outcome onto the
//! fine-grained label-layer/macro-layer diagnostics.

use crate::diagnostic::Kind;

/// Maximum identifier length: the rule is "length < 32", i.e. at most 31
/// characters.
pub const MAX_NAME_LEN: usize = 31;

/// Opcodes, register names and directive/macro keywords: none of these may
/// be used as a label or macro name.
pub const RESERVED_WORDS: &[&str] = &[
    "mov", "cmp", "add", "sub", "lea", "clr", "not", "inc", "dec", "jmp", "bne", "red", "prn",
    "jsr", "rts", "stop", "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", ".data", ".string",
    ".entry", ".extern", "macr", "endmacr",
];

fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Why a candidate identifier was rejected by the shared rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Empty,
    DoesNotStartWithLetter,
    InvalidCharacters,
    TooLong,
    Reserved,
}

/// The shared identifier rule (C2): non-empty, starts with an ASCII
/// letter, consists of letters and digits (`allow_underscore` additionally
/// permits `_`, for macro names), shorter than [`MAX_NAME_LEN`] + 1
/// characters, and not a reserved word.
pub fn validate(name: &str, allow_underscore: bool) -> Result<(), Violation> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(Violation::Empty);
    };
    if !first.is_ascii_alphabetic() {
        return Err(Violation::DoesNotStartWithLetter);
    }
    for c in name.chars() {
        let ok = c.is_ascii_alphanumeric() || (allow_underscore && c == '_');
        if !ok {
            return Err(Violation::InvalidCharacters);
        }
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Violation::TooLong);
    }
    if is_reserved(name) {
        return Err(Violation::Reserved);
    }
    Ok(())
}

/// Validate a label name, mapping a [`Violation`] onto the label-layer
/// diagnostics. Does not check for collision with an already-defined
/// symbol or macro name — that needs the relevant table and is the
/// caller's job (C4/C3 own those tables).
pub fn validate_label(name: &str) -> Result<(), Kind> {
    validate(name, false).map_err(|violation| match violation {
        Violation::Empty => Kind::MissingLabel,
        Violation::TooLong => Kind::IllegalLabelNameLength { name: name.to_string() },
        Violation::Reserved => Kind::CannotBeReservedWord { name: name.to_string() },
        Violation::DoesNotStartWithLetter | Violation::InvalidCharacters => {
            Kind::InvalidLabel { name: name.to_string() }
        }
    })
}

/// Validate a macro name, mapping a [`Violation`] onto the macro-layer
/// diagnostics.
pub fn validate_macro_name(name: &str) -> Result<(), Kind> {
    validate(name, true).map_err(|violation| match violation {
        Violation::Empty => Kind::MissingMacroName,
        Violation::TooLong => Kind::ExceededMacroNameLength { name: name.to_string() },
        Violation::Reserved => Kind::CannotBeReservedWord { name: name.to_string() },
        Violation::DoesNotStartWithLetter | Violation::InvalidCharacters => {
            Kind::InvalidMacroName { name: name.to_string() }
        }
    })
}
