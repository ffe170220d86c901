use std::env;
use std::process::ExitCode;

use asm16::assembler;
use asm16::diagnostic::Reporter;
use asm16::logging::{self, ConsoleReporter};

/// `asm16 file1 file2 …`: each argument names a source without extension
/// (§6). Every file is assembled to completion independently — a failure
/// on one never stops the run on the rest — and the process exits 0
/// regardless of per-file diagnostics; they were already printed to
/// standard output as they were found.
fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: asm16 <file1> [file2 ...]");
        return ExitCode::SUCCESS;
    }

    for basename in &args {
        let mut reporter = ConsoleReporter::new();
        match assembler::assemble_file(basename, &mut reporter) {
            Ok(()) if !reporter.had_error() => println!("{basename}: assembled"),
            Ok(()) => {}
            Err(e) => logging::error(&e.to_string()),
        }
    }

    ExitCode::SUCCESS
}
