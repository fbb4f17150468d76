//! Text-level helpers for the tree walk: whitespace compression, Markdown
//! escaping, and indentation of multi-line list content.

use std::borrow::Cow;

/// Collapse every run of whitespace to a single space, allocating only when
/// the input actually needs it.
pub(crate) fn compress_whitespace(text: &str) -> Cow<'_, str> {
    let needs_work = {
        let mut prev_space = false;
        let mut found = false;
        for c in text.chars() {
            if c.is_whitespace() {
                if c != ' ' || prev_space {
                    found = true;
                    break;
                }
                prev_space = true;
            } else {
                prev_space = false;
            }
        }
        found
    };
    if !needs_work {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    Cow::Owned(out)
}

/// Collapse all whitespace runs and trim; used for single-line renditions of
/// node text (table cells, fallback text, TOC labels).
pub(crate) fn single_line(text: &str) -> String {
    compress_whitespace(text).trim().to_string()
}

const BODY_ESCAPES: &[char] = &['\\', '*', '_', '`', '[', ']'];

/// Escape Markdown metacharacters in body text, plus the line-start forms
/// that would otherwise open a heading, list, blockquote, or rule.
pub(crate) fn escape_markdown(text: Cow<'_, str>) -> Cow<'_, str> {
    if text.is_empty() {
        return text;
    }

    let needs_body = text.contains(BODY_ESCAPES);
    let first = text.chars().next().unwrap_or(' ');
    let needs_line_start = matches!(first, '=' | '~' | '>' | '-' | '+' | '#' | '0'..='9');
    if !needs_body && !needs_line_start {
        return text;
    }

    let mut escaped = if needs_body {
        let mut out = String::with_capacity(text.len() + 8);
        for c in text.chars() {
            if BODY_ESCAPES.contains(&c) {
                out.push('\\');
            }
            out.push(c);
        }
        out
    } else {
        text.into_owned()
    };

    escaped = escape_line_start(escaped);
    Cow::Owned(escaped)
}

fn escape_line_start(mut text: String) -> String {
    match text.as_bytes().first() {
        Some(b'=' | b'~' | b'>') => text.insert(0, '\\'),
        Some(b'-' | b'+') => {
            if text.as_bytes().get(1) == Some(&b' ') {
                text.insert(0, '\\');
            }
        }
        Some(b'#') => {
            let hashes = text.bytes().take_while(|&b| b == b'#').count();
            if hashes <= 6 && text.as_bytes().get(hashes) == Some(&b' ') {
                text.insert(0, '\\');
            }
        }
        Some(b'0'..=b'9') => {
            let digits = text.bytes().take_while(u8::is_ascii_digit).count();
            if text.as_bytes().get(digits) == Some(&b'.')
                && text.as_bytes().get(digits + 1) == Some(&b' ')
            {
                text.replace_range(digits..=digits, "\\.");
            }
        }
        _ => {}
    }
    text
}

/// Indent every line except the first by `width` spaces; blank lines stay
/// blank. Used to hang list-item continuation content under its marker.
pub(crate) fn indent_except_first(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    let mut lines = text.lines();
    let mut out = lines.next().unwrap_or("").to_string();
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(&pad);
            out.push_str(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compress_is_zero_copy_when_clean() {
        assert!(matches!(
            compress_whitespace("already clean"),
            Cow::Borrowed(_)
        ));
        assert_eq!(compress_whitespace("a\n\t b"), "a b");
    }

    #[test]
    fn escapes_body_metacharacters() {
        assert_eq!(
            escape_markdown(Cow::Borrowed("a *b* _c_ [d]")),
            "a \\*b\\* \\_c\\_ \\[d\\]"
        );
    }

    #[test]
    fn escapes_accidental_list_and_heading_starts() {
        assert_eq!(escape_markdown(Cow::Borrowed("- not a list")), "\\- not a list");
        assert_eq!(escape_markdown(Cow::Borrowed("# not a heading")), "\\# not a heading");
        assert_eq!(escape_markdown(Cow::Borrowed("1. not ordered")), "1\\. not ordered");
        assert_eq!(escape_markdown(Cow::Borrowed("-dash word")), "-dash word");
        assert_eq!(escape_markdown(Cow::Borrowed("4.5 stars")), "4.5 stars");
    }

    #[test]
    fn indents_continuation_lines_only() {
        assert_eq!(indent_except_first("a\nb\n\nc", 2), "a\n  b\n\n  c");
    }
}
