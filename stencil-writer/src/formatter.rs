//! External formatter invocation.
//!
//! Formatting is best-effort: a missing executable, a non-zero exit, a
//! timeout, or any other failure yields [`FormatStatus::FormatSkipped`] and
//! never an error.

use std::ffi::OsString;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

use stencil_core::{FormatStatus, FormatterConfig};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const STDERR_EXCERPT: usize = 200;

/// Runs the configured formatter program on written files.
#[derive(Debug, Clone)]
pub struct Formatter {
    config: FormatterConfig,
}

impl Formatter {
    pub fn new(config: FormatterConfig) -> Self {
        Formatter { config }
    }

    pub fn program(&self) -> &str {
        &self.config.program
    }

    /// Rewrite `path` in place: `<program> <in_place_flag> <args...> <path>`.
    pub fn format_in_place(&self, path: &Path) -> FormatStatus {
        if !self.config.enabled {
            return FormatStatus::skipped("formatting disabled");
        }
        let mut args: Vec<OsString> = Vec::new();
        if !self.config.in_place_flag.is_empty() {
            args.push(self.config.in_place_flag.clone().into());
        }
        args.extend(self.config.args.iter().map(OsString::from));
        args.push(path.into());
        match self.invoke(&args, Stdio::null()) {
            Ok(()) => FormatStatus::Formatted,
            Err(reason) => FormatStatus::skipped(reason),
        }
    }

    /// Format `input`, capturing the formatter's stdout into `output`:
    /// `<program> <args...> <input> > <output>`.
    ///
    /// `output` may be left behind, partially written, on failure.
    pub fn format_to(&self, input: &Path, output: &Path) -> FormatStatus {
        if !self.config.enabled {
            return FormatStatus::skipped("formatting disabled");
        }
        let sink = match File::create(output) {
            Ok(f) => f,
            Err(e) => {
                return FormatStatus::skipped(format!("cannot create {}: {e}", output.display()))
            }
        };
        let mut args: Vec<OsString> = self.config.args.iter().map(OsString::from).collect();
        args.push(input.into());
        if let Err(reason) = self.invoke(&args, Stdio::from(sink)) {
            return FormatStatus::skipped(reason);
        }

        let len = |p: &Path| std::fs::metadata(p).map(|m| m.len()).unwrap_or(0);
        if len(output) == 0 && len(input) > 0 {
            return FormatStatus::skipped(format!("`{}` produced no output", self.config.program));
        }
        FormatStatus::Formatted
    }

    /// Spawn the formatter and wait for it, bounded by the configured
    /// timeout. Returns the skip reason on any failure.
    fn invoke(&self, args: &[OsString], stdout: Stdio) -> Result<(), String> {
        let program = &self.config.program;
        let mut stderr = tempfile::tempfile()
            .map_err(|e| format!("cannot capture stderr of `{program}`: {e}"))?;
        let stderr_sink = stderr
            .try_clone()
            .map_err(|e| format!("cannot capture stderr of `{program}`: {e}"))?;

        tracing::debug!("running `{program}` with {} argument(s)", args.len());
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::from(stderr_sink))
            .spawn()
            .map_err(|e| format!("could not start `{program}`: {e}"))?;

        let timeout = self.config.timeout();
        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(format!(
                        "`{program}` timed out after {}s",
                        timeout.as_secs()
                    ));
                }
                Ok(None) => sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(format!("waiting on `{program}` failed: {e}"));
                }
            }
        };

        if status.success() {
            return Ok(());
        }
        let mut message = String::new();
        let _ = stderr.seek(SeekFrom::Start(0));
        let _ = stderr.read_to_string(&mut message);
        let excerpt: String = message.trim().chars().take(STDERR_EXCERPT).collect();
        if excerpt.is_empty() {
            Err(format!("`{program}` exited with {status}"))
        } else {
            Err(format!("`{program}` exited with {status}: {excerpt}"))
        }
    }
}
