//! Macro table & pre-processor (C3)
//!
//! A line-oriented state machine with two states: [`State::Outside`] and
//! [`State::Inside`] (accumulating a macro body). Macros are single-level —
//! a body is captured verbatim and never re-scanned for further macro
//! calls, either while it is being collected or while it is being expanded
//! at a call site.

use crate::assembler::identifier;
use crate::assembler::lexer;
use crate::diagnostic::{Kind, Reporter};

/// One collected macro: its name and the raw lines of its body, in order.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub body: Vec<String>,
}

/// The macro table built up over one pre-processor run.
#[derive(Debug, Default)]
pub struct MacroTable {
    macros: Vec<Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, name: &str) -> Option<&Macro> {
        self.macros.iter().find(|m| m.name == name)
    }

    fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

enum State {
    Outside,
    Inside { name: String, body: Vec<String> },
}

/// Run the pre-processor over `source`, returning the expanded text and the
/// macro table collected along the way. Diagnostics are reported through
/// `reporter`; the caller is responsible for discarding the expanded output
/// if [`Reporter::had_error`] is true afterwards (§7: "any diagnostic
/// recorded during the macro pre-processor causes the `.am` artifact to be
/// deleted").
pub fn expand(source: &str, reporter: &mut dyn Reporter) -> (String, MacroTable) {
    let mut table = MacroTable::new();
    let mut state = State::Outside;
    let mut output = String::new();

    for (index, raw_line) in source.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = lexer::trim_line(raw_line);

        match &mut state {
            State::Outside => {
                if let Some(rest) = trimmed.strip_prefix("macr") {
                    let name = rest.to_string();
                    match identifier::validate_macro_name(&name) {
                        Ok(()) => {
                            if table.contains(&name) {
                                reporter.report(
                                    Some(line_number),
                                    Kind::MacroNameAlreadyDefined { name: name.clone() },
                                );
                            }
                            state = State::Inside { name, body: Vec::new() };
                        }
                        Err(kind) => reporter.report(Some(line_number), kind),
                    }
                } else if trimmed == "endmacr" {
                    // endmacr outside a macro never appears in well-formed
                    // input; ignored rather than diagnosed.
                } else if let Some(found) = table.find(&trimmed) {
                    for body_line in &found.body {
                        output.push_str(body_line);
                        output.push('\n');
                    }
                } else {
                    output.push_str(&trimmed);
                    output.push('\n');
                }
            }
            State::Inside { name, body } => {
                if let Some(rest) = trimmed.strip_prefix("endmacr") {
                    if !rest.is_empty() {
                        reporter.report(Some(line_number), Kind::ExtraneousTextAfterEndmacr);
                    }
                    table.macros.push(Macro { name: name.clone(), body: std::mem::take(body) });
                    state = State::Outside;
                } else {
                    body.push(trimmed);
                }
            }
        }
    }

    (output, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::VecReporter;

    #[test]
    fn macro_free_input_passes_through_unchanged() {
        let mut reporter = VecReporter::new();
        let (out, _) = expand("MAIN: mov #3, r4\nstop\n", &mut reporter);
        assert_eq!(out, "MAIN:mov#3,r4\nstop\n");
        assert!(!reporter.had_error());
    }

    #[test]
    fn macro_call_expands_in_place() {
        let mut reporter = VecReporter::new();
        let source = "macr GREET\nprn #7\nendmacr\nGREET\nstop\n";
        let (out, table) = expand(source, &mut reporter);
        assert_eq!(out, "prn#7\nstop\n");
        assert!(table.contains("GREET"));
        assert!(!reporter.had_error());
    }

    #[test]
    fn macro_body_is_captured_verbatim_without_rescanning() {
        let mut reporter = VecReporter::new();
        let source = "macr A\nmacr B\nendmacr\nA\n";
        let (out, table) = expand(source, &mut reporter);
        // the inner "macr B" line is just a body line, not a nested declaration
        assert_eq!(table.find("A").unwrap().body, vec!["macr B".to_string()]);
        assert_eq!(out, "macrB\n");
    }

    #[test]
    fn duplicate_macro_name_is_a_diagnostic() {
        let mut reporter = VecReporter::new();
        let source = "macr A\nendmacr\nmacr A\nendmacr\n";
        expand(source, &mut reporter);
        assert!(reporter
            .records()
            .iter()
            .any(|(_, kind)| matches!(kind, Kind::MacroNameAlreadyDefined { name } if name == "A")));
    }

    #[test]
    fn text_after_endmacr_is_a_diagnostic() {
        let mut reporter = VecReporter::new();
        let source = "macr A\nendmacr extra\n";
        expand(source, &mut reporter);
        assert!(reporter
            .records()
            .iter()
            .any(|(_, kind)| matches!(kind, Kind::ExtraneousTextAfterEndmacr)));
    }

    #[test]
    fn invalid_macro_name_is_rejected() {
        let mut reporter = VecReporter::new();
        expand("macr mov\nendmacr\n", &mut reporter);
        assert!(reporter.had_error());
    }

    #[test]
    fn endmacr_outside_any_macro_is_ignored() {
        let mut reporter = VecReporter::new();
        let (out, _) = expand("endmacr\nstop\n", &mut reporter);
        assert_eq!(out, "stop\n");
        assert!(!reporter.had_error());
    }

    #[test]
    fn a_macro_name_that_merely_starts_with_endmacr_is_still_callable() {
        let mut reporter = VecReporter::new();
        let source = "macr endmacrX\nprn #1\nendmacr\nendmacrX\nstop\n";
        let (out, _) = expand(source, &mut reporter);
        assert_eq!(out, "prn#1\nstop\n");
        assert!(!reporter.had_error());
    }
}
