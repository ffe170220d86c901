//! Pretty-printing diagnostics to the console
//!
//! This is the default [`crate::diagnostic::Reporter`]; tests inject
//! [`crate::diagnostic::VecReporter`] instead so they can assert on
//! `(line, kind)` pairs without scraping formatted text.

use colored::Colorize;

use crate::diagnostic::{Kind, Reporter};

/// Pretty-print an error message to the console
pub fn error(message: &str) {
    let tag = "error:".red().bold();
    eprintln!("{tag} {message}");
}

/// Pretty-print a warning message to the console
pub fn warning(message: &str) {
    let tag = "warning:".yellow().bold();
    eprintln!("{tag} {message}");
}

/// Console-printing reporter: every diagnostic is written to standard
/// output as `line <N>: <message>`, colorized like the rest of this
/// crate's console output. Also tracks whether any diagnostic was seen,
/// since that flag gates emission of the `.am`/`.ob`/`.ent`/`.ext` artifacts.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    any_error: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for ConsoleReporter {
    fn report(&mut self, line: Option<usize>, kind: Kind) {
        self.any_error = true;
        let tag = "error:".red().bold();
        match line {
            Some(line) => println!("{tag} line {line}: {kind}"),
            None => println!("{tag} {kind}"),
        }
    }

    fn had_error(&self) -> bool {
        self.any_error
    }
}
