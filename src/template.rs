//! `?` substitution for text-protocol statements.
//!
//! Each unescaped `?` is replaced by the next argument's `Display` rendering, escaped for the
//! connection. The value is wrapped in single quotes unless the `?` already follows a quote
//! character. `\?` produces a literal `?`.

use std::fmt::Display;

use crate::error::{Error, Result};
use crate::escape::{EscapeMode, escape};

/// Substitute `args` into the placeholders of `template`
///
/// ```
/// use typed_mysql::escape::EscapeMode;
/// use typed_mysql::template::render;
///
/// let sql = render(
///     "SELECT * FROM user WHERE email = ? AND age > ?",
///     &[&"o'neil@example.com", &21],
///     EscapeMode::Backslash,
/// )
/// .unwrap();
/// assert_eq!(sql, r"SELECT * FROM user WHERE email = 'o\'neil@example.com' AND age > '21'");
/// ```
pub fn render(template: &str, args: &[&dyn Display], mode: EscapeMode) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut prev = None;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'?') => {
                out.push('?');
                chars.next();
                prev = Some('?');
                continue;
            }
            '?' => {
                let arg = args.next().ok_or_else(|| {
                    Error::Template(format!("not enough arguments for template {:?}", template))
                })?;
                let escaped = escape(&arg.to_string(), mode);
                if matches!(prev, Some('\'' | '"')) {
                    out.push_str(&escaped);
                } else {
                    out.push('\'');
                    out.push_str(&escaped);
                    out.push('\'');
                }
            }
            c => out.push(c),
        }
        prev = Some(c);
    }

    let unused = args.count();
    if unused > 0 {
        return Err(Error::Template(format!(
            "{} unused argument(s) for template {:?}",
            unused, template
        )));
    }
    Ok(out)
}
