//! `${expr}` interpolation shorthand.
//!
//! Templates may write `${name}` instead of `{{ name }}`. The rewrite is
//! brace-depth aware so `${ {"a": 1} | length }` survives intact.
//! `{% raw %}` blocks are copied through untouched, and `$${` yields a
//! literal `${` in the output.

use std::sync::OnceLock;

use regex::Regex;

/// `{% raw %} ... {% endraw %}`, whitespace-control dashes included.
pub(crate) fn raw_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\{%-?\s*raw\s*-?%\}.*?\{%-?\s*endraw\s*-?%\}")
            .expect("raw block pattern is valid")
    })
}

/// Rewrite every `${expr}` outside raw blocks to `{{ expr }}`.
///
/// Returns the 1-based line of an unterminated `${` on failure.
pub fn expand(text: &str) -> Result<String, usize> {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for raw in raw_block_re().find_iter(text) {
        expand_segment(text, cursor, raw.start(), &mut out)?;
        out.push_str(raw.as_str());
        cursor = raw.end();
    }
    expand_segment(text, cursor, text.len(), &mut out)?;
    Ok(out)
}

fn expand_segment(text: &str, from: usize, to: usize, out: &mut String) -> Result<(), usize> {
    let mut pos = from;
    while let Some(found) = text[pos..to].find("${") {
        let start = pos + found;
        if start > pos && text.as_bytes()[start - 1] == b'$' {
            // `$${` escape: drop one `$`, keep the rest literal.
            out.push_str(&text[pos..start - 1]);
            out.push_str("${");
            pos = start + 2;
            continue;
        }
        out.push_str(&text[pos..start]);
        let inner_start = start + 2;
        let end = closing_brace(&text[inner_start..to])
            .ok_or_else(|| text[..start].matches('\n').count() + 1)?;
        out.push_str("{{ ");
        out.push_str(text[inner_start..inner_start + end].trim());
        out.push_str(" }}");
        pos = inner_start + end + 1;
    }
    out.push_str(&text[pos..to]);
    Ok(())
}

fn closing_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(i),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}
