//! Escaper
//!
//! Bidirectional escaping for characters the protocol reserves.
//!
//! ## Substitution Table
//! ```text
//! ┌───────────┬─────────┐
//! │ Character │ Escaped │
//! ├───────────┼─────────┤
//! │ \         │ \\      │
//! │ /         │ \/      │
//! │ |         │ \p      │
//! │ newline   │ \n      │
//! │ CR        │ \r      │
//! │ tab       │ \t      │
//! │ VT        │ \v      │
//! │ FF        │ \f      │
//! │ space     │ \s      │
//! └───────────┴─────────┘
//! ```
//!
//! Both directions run as a single left-to-right scan, so an inserted escape
//! sequence is never looked at again and `unescape(escape(s)) == s` for every
//! string.

/// Escape a field name or value for the wire
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for ch in input.chars() {
        match escaped_form(ch) {
            Some(code) => {
                out.push('\\');
                out.push(code);
            }
            None => out.push(ch),
        }
    }
    out
}

/// Reverse [`escape`]
///
/// Unknown escape sequences and a trailing lone backslash are copied through
/// unchanged; this never fails.
pub fn unescape(input: &str) -> String {
    if !input.contains('\\') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(code) => match unescaped_form(code) {
                Some(original) => out.push(original),
                None => {
                    out.push('\\');
                    out.push(code);
                }
            },
            None => out.push('\\'),
        }
    }
    out
}

/// Whether a string contains any character [`escape`] would rewrite
pub fn needs_escape(input: &str) -> bool {
    input.chars().any(|ch| escaped_form(ch).is_some())
}

fn escaped_form(ch: char) -> Option<char> {
    match ch {
        '\\' => Some('\\'),
        '/' => Some('/'),
        '|' => Some('p'),
        '\n' => Some('n'),
        '\r' => Some('r'),
        '\t' => Some('t'),
        '\u{0B}' => Some('v'),
        '\u{0C}' => Some('f'),
        ' ' => Some('s'),
        _ => None,
    }
}

fn unescaped_form(code: char) -> Option<char> {
    match code {
        '\\' => Some('\\'),
        '/' => Some('/'),
        'p' => Some('|'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\u{0B}'),
        'f' => Some('\u{0C}'),
        's' => Some(' '),
        _ => None,
    }
}
