//! Symbol table (C4)
//!
//! A label carries an address, a kind (code or data) and a defined flag; a
//! name may additionally carry entry and/or extern markers, tracked
//! separately from the definition record since a marker is a promise
//! ("defined here" / "defined elsewhere") rather than a definition itself.

use std::collections::HashMap;

use crate::diagnostic::Kind as DiagnosticKind;

/// What a defined symbol denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Code,
    Data,
}

/// A local definition: a label that appeared on the left of an
/// instruction or a `.data`/`.string` directive.
#[derive(Debug, Clone)]
pub struct Definition {
    pub address: u16,
    pub kind: SymbolKind,
}

/// An `.entry` declaration: a promise that `name` is defined somewhere in
/// this file, made at `line`. The line travels with the marker so pass two
/// can still tag a diagnostic to a source line if the promise is broken
/// (§1/§7: every diagnostic carries a line number).
#[derive(Debug, Clone)]
pub struct EntryMarker {
    pub name: String,
    pub line: usize,
}

/// Labels with their address/kind, plus the `.entry`/`.extern` markers
/// declared on any name, in declaration order. Insertion order is
/// preserved (§9: arrays/ordered maps, not hand-rolled linked lists).
#[derive(Debug, Default)]
pub struct SymbolTable {
    definitions: HashMap<String, Definition>,
    entries: Vec<EntryMarker>,
    externs: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name` at `address` with the given kind. A name never
    /// carries two definitions, and a name already declared extern cannot
    /// also be defined locally.
    pub fn define(&mut self, name: &str, address: u16, kind: SymbolKind) -> Result<(), DiagnosticKind> {
        if self.definitions.contains_key(name) {
            return Err(DiagnosticKind::LabelAlreadyDefined { name: name.to_string() });
        }
        if self.externs.iter().any(|n| n == name) {
            return Err(DiagnosticKind::AlreadyDefinedAsExtern { name: name.to_string() });
        }
        self.definitions.insert(name.to_string(), Definition { address, kind });
        Ok(())
    }

    /// Rewrite a data-segment symbol's address after first pass has
    /// computed the final `IC_end + DC_offset` base (§4.6).
    pub fn rebase_data_address(&mut self, name: &str, new_address: u16) {
        if let Some(def) = self.definitions.get_mut(name) {
            if def.kind == SymbolKind::Data {
                def.address = new_address;
            }
        }
    }

    /// Declare `name` as an `.entry`: a promise it is defined somewhere in
    /// this file, declared at `line`. Conflicts with a prior `.extern`
    /// declaration of the same name.
    pub fn declare_entry(&mut self, name: &str, line: usize) -> Result<(), DiagnosticKind> {
        if self.externs.iter().any(|n| n == name) {
            return Err(DiagnosticKind::AlreadyDefinedAsExtern { name: name.to_string() });
        }
        if !self.entries.iter().any(|m| m.name == name) {
            self.entries.push(EntryMarker { name: name.to_string(), line });
        }
        Ok(())
    }

    /// Declare `name` as an `.extern`: a promise it is defined elsewhere.
    /// Conflicts with a local definition or a prior `.entry` declaration
    /// of the same name.
    pub fn declare_extern(&mut self, name: &str) -> Result<(), DiagnosticKind> {
        if self.definitions.contains_key(name) {
            return Err(DiagnosticKind::LabelAlreadyDefined { name: name.to_string() });
        }
        if self.entries.iter().any(|m| m.name == name) {
            return Err(DiagnosticKind::AlreadyDefinedAsEntry { name: name.to_string() });
        }
        if !self.externs.iter().any(|n| n == name) {
            self.externs.push(name.to_string());
        }
        Ok(())
    }

    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    pub fn is_extern(&self, name: &str) -> bool {
        self.externs.iter().any(|n| n == name)
    }

    pub fn is_entry(&self, name: &str) -> bool {
        self.entries.iter().any(|m| m.name == name)
    }

    /// `.entry` markers, in declaration order, each with the line it was
    /// declared on.
    pub fn entries(&self) -> &[EntryMarker] {
        &self.entries
    }

    /// All defined symbols, in insertion order is not preserved by
    /// `HashMap`; callers that need entry-site ordering should iterate
    /// [`Self::entries`] instead and look up each definition.
    pub fn definitions(&self) -> impl Iterator<Item = (&String, &Definition)> {
        self.definitions.iter()
    }
}
