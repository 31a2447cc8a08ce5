//! Escape sequence processing for string literals.
//!
//! Recognized escapes: `\n`, `\r`, `\t`, `\\`, `\"`, `\0`

use quill_ir::CompileErrorKind;

#[inline]
fn resolve_escape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        '\\' => Some('\\'),
        '"' => Some('"'),
        '0' => Some('\0'),
        _ => None,
    }
}

/// Process the escape sequences in a string literal body (quotes removed).
///
/// Unknown escapes are an error rather than being kept literally.
pub fn unescape_string(s: &str) -> Result<String, CompileErrorKind> {
    if !s.contains('\\') {
        return Ok(s.to_string());
    }

    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some(esc) => match resolve_escape(esc) {
                Some(resolved) => result.push(resolved),
                None => return Err(CompileErrorKind::InvalidEscape(esc)),
            },
            None => return Err(CompileErrorKind::UnterminatedString),
        }
    }
    Ok(result)
}
