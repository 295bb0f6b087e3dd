//! Output writer.
//!
//! ## Multi-output
//!
//! `<dir>/<filename>` is written directly and overwritten unconditionally.
//! Missing directories are created; existing ones are fine.
//!
//! ## Single-output — staging protocol
//!
//! 1. Write the rendered text to the staging path `<dir>/<prefix><name>`.
//! 2. Run the formatter on it, capturing stdout in `<staging>.formatted`.
//! 3. On success rename `<staging>.formatted` onto the final path,
//!    otherwise rename the unformatted staging file there instead.
//! 4. Remove whatever staging file is left.
//!
//! The final path therefore only ever appears fully written.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use stencil_core::{naming, FormatStatus};

use crate::error::{io_err, WriteError};
use crate::formatter::Formatter;

fn ensure_parent(path: &Path) -> Result<(), WriteError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }
    Ok(())
}

fn remove_if_present(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("could not remove {}: {e}", path.display()),
    }
}

/// Write `content` to `<output_dir>/<filename>`, creating directories as
/// needed. Returns the written path.
pub fn write_target(output_dir: &Path, filename: &str, content: &str) -> Result<PathBuf, WriteError> {
    let path = output_dir.join(filename);
    ensure_parent(&path)?;
    std::fs::write(&path, content).map_err(|e| io_err(&path, e))?;
    tracing::info!("wrote: {}", path.display());
    Ok(path)
}

/// Write `content` to `final_path` through a formatted staging file.
pub fn write_staged(
    final_path: &Path,
    content: &str,
    staging_prefix: &str,
    formatter: &Formatter,
) -> Result<FormatStatus, WriteError> {
    let staging = naming::staging_path(final_path, staging_prefix);
    let mut formatted = staging.clone().into_os_string();
    formatted.push(".formatted");
    write_staged_with(final_path, content, &staging, Path::new(&formatted), formatter)
}

fn write_staged_with(
    final_path: &Path,
    content: &str,
    staging: &Path,
    formatted: &Path,
    formatter: &Formatter,
) -> Result<FormatStatus, WriteError> {
    ensure_parent(final_path)?;
    std::fs::write(staging, content).map_err(|e| io_err(staging, e))?;

    let status = formatter.format_to(staging, formatted);
    let (promote, leftover) = if status.is_formatted() {
        (formatted, staging)
    } else {
        (staging, formatted)
    };

    if let Err(e) = std::fs::rename(promote, final_path) {
        remove_if_present(staging);
        remove_if_present(formatted);
        return Err(io_err(final_path, e));
    }
    remove_if_present(leftover);

    tracing::info!("wrote: {} ({status})", final_path.display());
    Ok(status)
}
