//! Lexer/trimmer (C1)
//!
//! Strips comments (`;` to end of line) and collapses whitespace, except
//! between the first and last `"` of a line, where a string literal's
//! interior whitespace — and any semicolon it happens to contain — is
//! preserved verbatim. Trimming is idempotent: running it twice gives the
//! same result as running it once.

/// Trim one raw source line into its logical form: comment stripped,
/// whitespace outside string literals removed. A line that was entirely
/// comment or whitespace becomes the empty string.
pub fn trim_line(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let first_quote = chars.iter().position(|&c| c == '"');
    let last_quote = chars.iter().rposition(|&c| c == '"');
    let in_string_span = |i: usize| {
        matches!((first_quote, last_quote), (Some(f), Some(l)) if f < l && i >= f && i <= l)
    };

    let mut out = String::with_capacity(line.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == ';' && !in_string_span(i) {
            break;
        }
        if (c == ' ' || c == '\t') && !in_string_span(i) {
            continue;
        }
        out.push(c);
    }
    out
}

/// Split a trimmed line's operand text on commas that fall outside a
/// quoted span. Does not validate comma placement (leading, trailing or
/// doubled commas) — callers check that against the opcode's arity, since
/// the legal shape differs per-opcode (C7).
///
/// An empty `text` yields zero operands, not one empty operand.
pub fn split_operands(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut fields = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (i, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&text[start..]);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_comment() {
        assert_eq!(trim_line("mov r1, r2 ; copy r1 into r2"), "movr1,r2");
    }

    #[test]
    fn comment_only_line_becomes_empty() {
        assert_eq!(trim_line("   ; just a comment"), "");
    }

    #[test]
    fn whitespace_inside_string_is_preserved() {
        assert_eq!(trim_line(r#"L: .string "a b c""#), r#"L:.string"a b c""#);
    }

    #[test]
    fn semicolon_inside_string_does_not_start_a_comment() {
        assert_eq!(trim_line(r#".string "a;b""#), r#".string"a;b""#);
    }

    #[test]
    fn trimming_is_idempotent() {
        let once = trim_line("  mov   r1 , r2  ; note");
        let twice = trim_line(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn split_operands_empty_text_is_zero_operands() {
        assert_eq!(split_operands(""), Vec::<&str>::new());
    }

    #[test]
    fn split_operands_basic() {
        assert_eq!(split_operands("r1,r2"), vec!["r1", "r2"]);
    }

    #[test]
    fn split_operands_detects_doubled_comma_as_empty_field() {
        assert_eq!(split_operands("r1,,r2"), vec!["r1", "", "r2"]);
    }

    #[test]
    fn split_operands_ignores_commas_inside_quotes() {
        assert_eq!(split_operands(r#""a,b""#), vec![r#""a,b""#]);
    }
}
