//! Output name and staging path derivation for single-output mode.

use std::path::{Path, PathBuf};

use crate::error::StructuralError;

/// Derive the output file name by removing every occurrence of `suffix`
/// from the template's file name (`proxies.mako.hpp` → `proxies.hpp`).
///
/// Fails when nothing was removed or nothing is left, since writing there
/// would clobber the template or produce a nameless file.
pub fn derive_output_name(template: &Path, suffix: &str) -> Result<String, StructuralError> {
    let file_name = template
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = file_name.replace(suffix, "");
    if name == file_name || name.is_empty() {
        return Err(StructuralError::OutputNameCollision {
            name,
            template: template.to_path_buf(),
        });
    }
    Ok(name)
}

/// `<dir>/<prefix><file>` for a final path `<dir>/<file>`.
pub fn staging_path(final_path: &Path, prefix: &str) -> PathBuf {
    let file_name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    final_path.with_file_name(format!("{prefix}{file_name}"))
}
