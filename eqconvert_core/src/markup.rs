//! Heuristic pretty-printer for the XML-shaped conversion outputs.
//!
//! This is an approximate, substring-based indenter, not a parser: it keys
//! off the presence of `<`, `</` and `/>` per line, which is enough for the
//! output shapes the backend produces.

const INDENT_UNIT: &str = "&nbsp;&nbsp;&nbsp;&nbsp;";
const LINE_BREAK: &str = "<br/>";

// Lines that start a document render unindented and reset the depth.
const PROLOG_PREFIXES: [&str; 3] = ["<?xml", "<!DOCTYPE", "<Preset>"];

/// Escape the five XML-significant characters to entity form.
///
/// Escaping is idempotent: an `&` that already begins a recognised entity
/// (named or numeric) is left alone, so already-escaped text survives a
/// second pass unchanged.
pub fn escape_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, ch) in s.char_indices() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '&' if !starts_entity(&s[i..]) => out.push_str("&amp;"),
            other => out.push(other),
        }
    }
    out
}

fn starts_entity(rest: &str) -> bool {
    for named in ["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"] {
        if rest.starts_with(named) {
            return true;
        }
    }
    // Numeric references: &#38; or &#x26;
    let Some(body) = rest.strip_prefix("&#") else {
        return false;
    };
    let digits = body.strip_prefix(['x', 'X']).unwrap_or(body);
    let end = digits.find(';');
    match end {
        Some(n) if n > 0 => digits[..n].chars().all(|c| c.is_ascii_hexdigit()),
        _ => false,
    }
}

/// Turn raw markup text into an indented, escaped HTML fragment.
///
/// Depth starts at 0 on every call: a line whose first `<` is not a closer
/// indents one level deeper before rendering, a `</` or `/>` anywhere on the
/// line un-indents (floored at 0), and prolog lines render flush left.
pub fn to_html(text: &str) -> String {
    let mut depth: usize = 0;
    let mut lines: Vec<String> = Vec::new();
    for line in text.split('\n') {
        if let Some(pos) = line.find('<') {
            if pos + 1 < line.len() && !line[pos + 1..].starts_with('/') {
                depth += 1;
            }
        }
        if line.contains("</") || line.contains("/>") {
            depth = depth.saturating_sub(1);
        }
        let mut indent = depth;
        if PROLOG_PREFIXES.iter().any(|p| line.starts_with(p)) {
            indent = 0;
            depth = 0;
        }
        let mut rendered = INDENT_UNIT.repeat(indent);
        rendered.push_str(&escape_markup(line));
        lines.push(rendered);
    }
    lines.join(LINE_BREAK)
}
