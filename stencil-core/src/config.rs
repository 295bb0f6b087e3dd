//! The explicit configuration record.
//!
//! Every recognised key is a field here. Unknown keys are rejected when the
//! file is parsed, so a typo never silently falls back to a default.
//!
//! ```yaml
//! marker: "##"
//! template_suffix: ".mako"
//! staging_prefix: "."
//! include_dirs: [partials]
//! known_keys: [ARR, IsConst]
//! formatter:
//!   program: clang-format
//!   args: ["-style=file"]
//!   in_place_flag: "-i"
//!   timeout_secs: 30
//!   enabled: true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::binding::BindingResolver;
use crate::error::StructuralError;
use crate::types::Marker;

/// File looked up next to the template when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "stencil.yaml";

/// Tool configuration. All fields default; see the module docs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StencilConfig {
    /// Two-character directive marker.
    pub marker: String,
    /// Token removed from the template name to derive the single output name.
    pub template_suffix: String,
    /// Prefix that turns a final file name into its staging name.
    pub staging_prefix: String,
    /// Extra include roots, searched after the template's own directory.
    pub include_dirs: Vec<PathBuf>,
    /// When set, bindings may only use these keys.
    pub known_keys: Option<Vec<String>>,
    pub formatter: FormatterConfig,
}

/// How the external formatter is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatterConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Flag that makes the formatter rewrite its input file.
    pub in_place_flag: String,
    pub timeout_secs: u64,
    pub enabled: bool,
}

impl Default for StencilConfig {
    fn default() -> Self {
        StencilConfig {
            marker: "##".to_string(),
            template_suffix: ".mako".to_string(),
            staging_prefix: ".".to_string(),
            include_dirs: Vec::new(),
            known_keys: None,
            formatter: FormatterConfig::default(),
        }
    }
}

impl Default for FormatterConfig {
    fn default() -> Self {
        FormatterConfig {
            program: "clang-format".to_string(),
            args: vec!["-style=file".to_string()],
            in_place_flag: "-i".to_string(),
            timeout_secs: 30,
            enabled: true,
        }
    }
}

impl FormatterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl StencilConfig {
    /// Load and validate the YAML file at `path`.
    ///
    /// Relative `include_dirs` are resolved against the file's directory.
    pub fn load_at(path: &Path) -> Result<Self, StructuralError> {
        let contents = std::fs::read_to_string(path).map_err(|source| {
            StructuralError::ConfigRead {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let mut config = if contents.trim().is_empty() {
            StencilConfig::default()
        } else {
            serde_yaml::from_str::<StencilConfig>(&contents).map_err(|source| {
                StructuralError::ConfigParse {
                    path: path.to_path_buf(),
                    source,
                }
            })?
        };
        config.validate(path)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for dir in &mut config.include_dirs {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve the configuration for `template`: the explicit file when
    /// given, else `stencil.yaml` beside the template, else defaults.
    pub fn discover(explicit: Option<&Path>, template: &Path) -> Result<Self, StructuralError> {
        if let Some(path) = explicit {
            return Self::load_at(path);
        }
        let beside = template
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(CONFIG_FILE_NAME);
        if beside.is_file() {
            return Self::load_at(&beside);
        }
        Ok(StencilConfig::default())
    }

    /// Check value ranges. `origin` names the file in error messages.
    pub fn validate(&self, origin: &Path) -> Result<(), StructuralError> {
        let invalid = |reason: String| StructuralError::Config {
            path: origin.to_path_buf(),
            reason,
        };
        if Marker::new(&self.marker).is_none() {
            return Err(invalid(format!(
                "marker `{}` must be exactly two non-whitespace characters",
                self.marker
            )));
        }
        if self.template_suffix.is_empty() {
            return Err(invalid("template_suffix must not be empty".to_string()));
        }
        if self.staging_prefix.is_empty() || self.staging_prefix.contains(['/', '\\']) {
            return Err(invalid(format!(
                "staging_prefix `{}` must be a non-empty file name prefix",
                self.staging_prefix
            )));
        }
        if self.formatter.enabled && self.formatter.program.trim().is_empty() {
            return Err(invalid("formatter.program must not be empty".to_string()));
        }
        if self.formatter.timeout_secs == 0 {
            return Err(invalid("formatter.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// The validated marker; falls back to `##` if never validated.
    pub fn marker(&self) -> Marker {
        Marker::new(&self.marker).unwrap_or_default()
    }

    pub fn binding_resolver(&self) -> BindingResolver {
        match &self.known_keys {
            Some(keys) => BindingResolver::with_known_keys(keys.iter().cloned()),
            None => BindingResolver::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn defaults_match_reference_tool() {
        let c = StencilConfig::default();
        assert_eq!(c.marker, "##");
        assert_eq!(c.template_suffix, ".mako");
        assert_eq!(c.formatter.program, "clang-format");
        assert_eq!(c.formatter.args, vec!["-style=file"]);
        assert!(c.validate(Path::new("x")).is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "formatter:\n  timeout_secs: 5\n");
        let c = StencilConfig::load_at(&path).unwrap();
        assert_eq!(c.formatter.timeout_secs, 5);
        assert_eq!(c.formatter.program, "clang-format");
        assert_eq!(c.marker, "##");
    }

    #[test]
    fn empty_file_is_default() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "\n");
        assert_eq!(StencilConfig::load_at(&path).unwrap(), StencilConfig::default());
    }

    #[test]
    fn unknown_key_is_structural_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "marker: '##'\nclang_format_path: /usr/bin/x\n");
        let err = StencilConfig::load_at(&path).unwrap_err();
        assert!(matches!(err, StructuralError::ConfigParse { .. }), "got: {err}");
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }

    #[test]
    fn unknown_nested_key_is_structural_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "formatter:\n  style: llvm\n");
        assert!(StencilConfig::load_at(&path).is_err());
    }

    #[test]
    fn bad_marker_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "marker: '#'\n");
        let err = StencilConfig::load_at(&path).unwrap_err();
        assert!(matches!(err, StructuralError::Config { .. }), "got: {err}");
    }

    #[test]
    fn include_dirs_resolve_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "include_dirs: [partials, /abs]\n");
        let c = StencilConfig::load_at(&path).unwrap();
        assert_eq!(c.include_dirs[0], dir.path().join("partials"));
        assert_eq!(c.include_dirs[1], PathBuf::from("/abs"));
    }

    #[test]
    fn discover_prefers_file_beside_template() {
        let dir = TempDir::new().unwrap();
        write(&dir, "template_suffix: .tpl\n");
        let c = StencilConfig::discover(None, &dir.path().join("x.tpl.hpp")).unwrap();
        assert_eq!(c.template_suffix, ".tpl");
    }

    #[test]
    fn discover_without_file_is_default() {
        let dir = TempDir::new().unwrap();
        let c = StencilConfig::discover(None, &dir.path().join("x.mako.hpp")).unwrap();
        assert_eq!(c, StencilConfig::default());
    }

    #[test]
    fn missing_explicit_file_is_read_error() {
        let err = StencilConfig::load_at(Path::new("/nonexistent/stencil.yaml")).unwrap_err();
        assert!(matches!(err, StructuralError::ConfigRead { .. }));
    }
}
