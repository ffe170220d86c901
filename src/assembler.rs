//! The two-pass assembler: macro-expanded source in, assembled artifacts
//! out (C3-C9 data flow, §2).
//!
//! [`assemble_file`] is the library's one public entry point: it owns a
//! translation unit end to end — reading `<basename>.as`, running the
//! pre-processor, both passes, and the emitter — while diagnostics collect
//! in the caller's [`crate::diagnostic::Reporter`] instead of aborting the
//! run. Only file-system-level failures (can't read the source, can't
//! write an artifact, a file name over the length limit) are reported as
//! an [`Error`]; everything else is a recoverable diagnostic and the pass
//! that found it keeps going (§7).

pub mod emit;
pub mod first_pass;
pub mod identifier;
pub mod lexer;
pub mod opcode;
pub mod operand;
pub mod second_pass;
pub mod symbol;
pub mod word;

use std::fmt;
use std::fs;

use crate::diagnostic::{Kind, Reporter};
use crate::preprocessor;

/// A label, macro name or source file name may not exceed this many
/// characters (§4.7: "File name ≤ 31 chars", same bound as label/macro
/// names in [`identifier`]).
pub const MAX_FILE_NAME_LEN: usize = identifier::MAX_NAME_LEN;

/// A file-level failure that aborts [`assemble_file`] for that one input.
/// Distinct from [`crate::diagnostic::Kind`]: a `Kind` accumulates in the
/// reporter while its pass keeps going, an `Error` means there was nothing
/// left to assemble. Wraps the matching `Kind` so the two taxonomies share
/// one set of messages (§9: one formatter, not two).
#[derive(Debug)]
pub struct Error(pub Kind);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for Error {}

fn fatal(reporter: &mut dyn Reporter, kind: Kind) -> Error {
    reporter.report(None, kind.clone());
    Error(kind)
}

/// Assemble one translation unit named `basename` (no extension, per
/// §6's CLI contract). Reads `<basename>.as`; on a clean pre-processor
/// pass writes `<basename>.am`; on clean first and second passes writes
/// `<basename>.ob` and any non-empty `<basename>.ent`/`<basename>.ext`
/// (§4.9, §7). Diagnostics recorded along the way are visible to the
/// caller through `reporter.had_error()` — the `Result` only distinguishes
/// "could not even attempt this file" from "attempted it, possibly with
/// diagnostics".
pub fn assemble_file(basename: &str, reporter: &mut dyn Reporter) -> Result<(), Error> {
    if basename.len() > MAX_FILE_NAME_LEN {
        return Err(fatal(reporter, Kind::FileLengthExceed { name: basename.to_string() }));
    }

    let source_path = format!("{basename}.as");
    let source = fs::read_to_string(&source_path)
        .map_err(|_| fatal(reporter, Kind::FailedToOpenFile { path: source_path.clone() }))?;

    let (expanded, macros) = preprocessor::expand(&source, reporter);
    if reporter.had_error() {
        // §7: a diagnostic during pre-processing discards the `.am`
        // artifact. A stale one from an earlier, successful run over the
        // same basename must not be left looking current.
        let am_path = format!("{basename}.am");
        if let Err(e) = fs::remove_file(&am_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                reporter.report(None, Kind::FailedToRemoveFile { path: am_path });
            }
        }
        return Ok(());
    }

    let am_path = format!("{basename}.am");
    fs::write(&am_path, &expanded)
        .map_err(|_| fatal(reporter, Kind::FailedToOpenFile { path: am_path.clone() }))?;

    let first = first_pass::run(&expanded, &macros, reporter);
    if reporter.had_error() {
        return Ok(());
    }

    let second = second_pass::run(&first, reporter);
    if reporter.had_error() {
        return Ok(());
    }

    emit::emit(basename, &second, &first.data)
        .map_err(|_| fatal(reporter, Kind::FailedToOpenFile { path: basename.to_string() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::VecReporter;
    use std::env;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    // Keeps the returned path well under `MAX_FILE_NAME_LEN`: these tests
    // pass the path straight through as `basename`, and the length check
    // applies to whatever string `assemble_file` is given.
    fn temp_basename(_tag: &str) -> String {
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut dir = env::temp_dir();
        dir.push(format!("a16t{id:x}"));
        fs::create_dir_all(&dir).unwrap();
        dir.push("p");
        dir.to_string_lossy().into_owned()
    }

    fn cleanup(basename: &str) {
        for ext in [".as", ".am", ".ob", ".ent", ".ext"] {
            fs::remove_file(format!("{basename}{ext}")).ok();
        }
    }

    #[test]
    fn scenario_s1_minimal_legal_program_emits_ob_with_no_ent_or_ext() {
        let basename = temp_basename("s1");
        fs::write(format!("{basename}.as"), "MAIN: mov #3, r4\nstop\n").unwrap();

        let mut reporter = VecReporter::new();
        assemble_file(&basename, &mut reporter).unwrap();
        assert!(!reporter.had_error());

        let ob = fs::read_to_string(format!("{basename}.ob")).unwrap();
        assert!(ob.starts_with("\t4 0\n"));
        assert!(!std::path::Path::new(&format!("{basename}.ent")).exists());
        assert!(!std::path::Path::new(&format!("{basename}.ext")).exists());

        cleanup(&basename);
    }

    #[test]
    fn scenario_s3_extern_reference_populates_ext_file() {
        let basename = temp_basename("s3");
        fs::write(format!("{basename}.as"), ".extern EXT\nmov EXT, r1\nstop\n").unwrap();

        let mut reporter = VecReporter::new();
        assemble_file(&basename, &mut reporter).unwrap();
        assert!(!reporter.had_error());

        let ext = fs::read_to_string(format!("{basename}.ext")).unwrap();
        assert_eq!(ext, "EXT\t0101\n ");

        cleanup(&basename);
    }

    #[test]
    fn a_diagnostic_in_first_pass_suppresses_all_three_artifacts() {
        let basename = temp_basename("s5");
        fs::write(format!("{basename}.as"), "lea #5, r1\n").unwrap();

        let mut reporter = VecReporter::new();
        assemble_file(&basename, &mut reporter).unwrap();
        assert!(reporter.had_error());
        assert!(!std::path::Path::new(&format!("{basename}.ob")).exists());

        cleanup(&basename);
    }

    #[test]
    fn a_label_that_collides_with_a_macro_name_is_a_diagnostic() {
        let basename = temp_basename("macro-label-collision");
        fs::write(format!("{basename}.as"), "macrGREET\nprn#7\nendmacr\nGREET:stop\n").unwrap();

        let mut reporter = VecReporter::new();
        assemble_file(&basename, &mut reporter).unwrap();
        assert!(reporter
            .records()
            .iter()
            .any(|(_, kind)| matches!(kind, Kind::MacroNameAlreadyDefined { name } if name == "GREET")));

        cleanup(&basename);
    }

    #[test]
    fn a_diagnostic_in_the_preprocessor_leaves_no_am_file() {
        let basename = temp_basename("macro-error");
        fs::write(format!("{basename}.as"), "macr mov\nendmacr\nstop\n").unwrap();

        let mut reporter = VecReporter::new();
        assemble_file(&basename, &mut reporter).unwrap();
        assert!(reporter.had_error());
        assert!(!std::path::Path::new(&format!("{basename}.am")).exists());

        cleanup(&basename);
    }

    #[test]
    fn an_unreadable_source_file_is_a_fatal_error() {
        let basename = temp_basename("missing");
        let _ = fs::remove_file(format!("{basename}.as"));

        let mut reporter = VecReporter::new();
        let result = assemble_file(&basename, &mut reporter);
        assert!(result.is_err());
        assert!(reporter
            .records()
            .iter()
            .any(|(_, kind)| matches!(kind, Kind::FailedToOpenFile { .. })));
    }

    #[test]
    fn a_file_name_over_the_length_limit_is_rejected_without_reading_anything() {
        let long_name = "a".repeat(MAX_FILE_NAME_LEN + 1);
        let mut reporter = VecReporter::new();
        let result = assemble_file(&long_name, &mut reporter);
        assert!(result.is_err());
        assert!(reporter
            .records()
            .iter()
            .any(|(_, kind)| matches!(kind, Kind::FileLengthExceed { .. })));
    }
}
