//! Header directive parsing.
//!
//! A directive line reads `<marker> <filename> <k1>=<v1>;<k2>=<v2>;...`.
//! Only the header is scanned; see [`TemplateSource::new`] for where it ends.

use std::collections::HashSet;
use std::path::{Component, Path};

use crate::error::StructuralError;
use crate::types::{Directive, TemplateSource, BLOCK_COMMENT_OPENER};

/// Parse every directive in the header of `source`, in source order.
///
/// Fails with `MalformedDirective` on the first marker line that does not
/// carry both an output filename and a variable list, and with
/// `NoDirectives` when the header declares none.
pub fn parse_directives(source: &TemplateSource) -> Result<Vec<Directive>, StructuralError> {
    let marker = source.marker();
    let mut directives = Vec::new();
    let mut seen = HashSet::new();

    for (line_no, line) in source.header_lines() {
        let trimmed = line.trim();
        if trimmed.starts_with(BLOCK_COMMENT_OPENER) {
            continue;
        }
        let rest = trimmed
            .strip_prefix(marker.as_str())
            .unwrap_or(trimmed)
            .trim_start();
        let (filename, vars) = split_fields(rest)
            .ok_or_else(|| {
                StructuralError::directive(
                    line_no,
                    trimmed,
                    "expected `<marker> <filename> <variable-list>`",
                )
            })?;
        check_filename(line_no, trimmed, filename)?;

        if !seen.insert(filename.to_string()) {
            tracing::warn!(
                "line {line_no}: `{filename}` already declared; the later directive overwrites it"
            );
        }
        directives.push(Directive {
            filename: filename.to_string(),
            vars: vars.to_string(),
            index: directives.len(),
            line: line_no,
        });
    }

    if directives.is_empty() {
        return Err(StructuralError::NoDirectives {
            path: source.path.clone(),
        });
    }
    tracing::debug!(
        "{}: {} directive(s) in header",
        source.path.display(),
        directives.len()
    );
    Ok(directives)
}

/// Split on the first whitespace run: the remainder, spaces included, is
/// the variable list. Both fields must be non-empty.
fn split_fields(rest: &str) -> Option<(&str, &str)> {
    let (filename, vars) = rest.split_once(char::is_whitespace)?;
    let vars = vars.trim();
    if filename.is_empty() || vars.is_empty() {
        return None;
    }
    Some((filename, vars))
}

fn check_filename(line_no: usize, content: &str, filename: &str) -> Result<(), StructuralError> {
    let escapes = Path::new(filename).components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(StructuralError::directive(
            line_no,
            content,
            format!("output filename `{filename}` must stay inside the output directory"),
        ));
    }
    Ok(())
}
