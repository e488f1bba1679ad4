//! Client-side string escaping for SQL literals.

/// How the server interprets backslashes inside string literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeMode {
    /// Backslash starts an escape sequence (the server default)
    #[default]
    Backslash,
    /// `NO_BACKSLASH_ESCAPES` is active; only quotes can be escaped, by doubling
    NoBackslash,
}

/// Escape `text` for use inside a quoted SQL string literal
///
/// ```
/// use typed_mysql::escape::{EscapeMode, escape};
///
/// assert_eq!(escape("O'Reilly", EscapeMode::Backslash), r"O\'Reilly");
/// assert_eq!(escape("O'Reilly", EscapeMode::NoBackslash), "O''Reilly");
/// ```
pub fn escape(text: &str, mode: EscapeMode) -> String {
    // worst case every character is escaped
    let mut out = String::with_capacity(text.len() * 2);
    match mode {
        EscapeMode::Backslash => {
            for c in text.chars() {
                match c {
                    '\0' => out.push_str("\\0"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\\' => out.push_str("\\\\"),
                    '\'' => out.push_str("\\'"),
                    '"' => out.push_str("\\\""),
                    '\x1a' => out.push_str("\\Z"),
                    c => out.push(c),
                }
            }
        }
        EscapeMode::NoBackslash => {
            for c in text.chars() {
                if c == '\'' {
                    out.push('\'');
                }
                out.push(c);
            }
        }
    }
    out
}
