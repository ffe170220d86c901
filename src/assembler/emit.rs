//! Emitter (C9)
//!
//! Writes `<basename>.ob`, `<basename>.ent` and `<basename>.ext`. `.ent` and
//! `.ext` are deleted rather than left zero-length when their site list is
//! empty.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::assembler::first_pass::CODE_BASE_ADDRESS;
use crate::assembler::second_pass::{SecondPassOutput, Site};
use crate::assembler::word::Word;

/// Append `suffix` to `basename`, e.g. `suffix("prog", ".ob")` → `prog.ob`.
pub fn suffix(basename: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{basename}{suffix}"))
}

fn format_object_line(address: u16, word: Word) -> String {
    format!("0{address}\t{:05o}\n", word.raw())
}

fn format_site_line(site: &Site) -> String {
    format!("{}\t0{}\n ", site.name, site.address)
}

/// Write the `.ob` file: header line, one line per code word then one per
/// data word, each `0<addr>\t<5-digit-octal>`. Data words are written at
/// their rebased address (`CODE_BASE_ADDRESS + code.len() + offset`).
pub fn write_object_file(path: &Path, code: &[Word], data: &[Word]) -> io::Result<()> {
    let mut out = String::new();
    out.push_str(&format!("\t{} {}\n", code.len(), data.len()));
    for (offset, word) in code.iter().enumerate() {
        out.push_str(&format_object_line(CODE_BASE_ADDRESS + offset as u16, *word));
    }
    let data_base = CODE_BASE_ADDRESS + code.len() as u16;
    for (offset, word) in data.iter().enumerate() {
        out.push_str(&format_object_line(data_base + offset as u16, *word));
    }
    fs::write(path, out)
}

/// Write a `.ent`/`.ext`-shaped site list, or delete `path` if `sites` is
/// empty (§4.9, §8 invariant 6).
fn write_or_delete_sites(path: &Path, sites: &[Site]) -> io::Result<()> {
    if sites.is_empty() {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    } else {
        let mut out = String::new();
        for site in sites {
            out.push_str(&format_site_line(site));
        }
        fs::write(path, out)
    }
}

/// Write all three artifacts for `basename` from a resolved second pass.
/// Callers only invoke this once the run has no diagnostics (§4.9:
/// "artifacts are emitted only when the run has no diagnostics").
pub fn emit(basename: &str, output: &SecondPassOutput, data: &[Word]) -> io::Result<()> {
    write_object_file(&suffix(basename, ".ob"), &output.code, data)?;
    write_or_delete_sites(&suffix(basename, ".ent"), &output.entry_sites)?;
    write_or_delete_sites(&suffix(basename, ".ext"), &output.extern_sites)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::word::Word;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("asm16-emit-test-{name}-{:x}", std::ptr::addr_of!(name) as usize));
        dir
    }

    #[test]
    fn object_header_reports_code_and_data_lengths() {
        let path = temp_path("ob-header");
        write_object_file(&path, &[Word::ZERO, Word::ZERO], &[Word::ZERO]).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("\t2 1\n"));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn object_lines_mask_the_sign_bit_and_use_five_digit_octal() {
        let path = temp_path("ob-mask");
        write_object_file(&path, &[Word::from_raw(0xFFFF)], &[]).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let data_line = contents.lines().nth(1).unwrap();
        assert_eq!(data_line, "0100\t77777");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn empty_site_list_deletes_rather_than_leaves_a_zero_length_file() {
        let path = temp_path("ent-empty");
        fs::write(&path, "stale").unwrap();
        write_or_delete_sites(&path, &[]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn deleting_a_site_file_that_never_existed_is_not_an_error() {
        let path = temp_path("ent-missing");
        fs::remove_file(&path).ok();
        assert!(write_or_delete_sites(&path, &[]).is_ok());
    }

    #[test]
    fn non_empty_site_list_is_written_one_line_per_site() {
        let path = temp_path("ext-sites");
        let sites = vec![Site { name: "EXT".into(), address: 101 }];
        write_or_delete_sites(&path, &sites).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "EXT\t0101\n ");
        fs::remove_file(&path).ok();
    }
}
