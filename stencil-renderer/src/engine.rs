//! Tera rendering engine with an explicit include search path.
//!
//! A template is compiled once per run and rendered once per target.
//! Templates it pulls in through `include`, `import` or `extends` are looked
//! up in the search path, in order, and registered under the name they
//! were referenced by. Nothing is resolved against the working directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tera::Tera;

use stencil_core::{Binding, TemplateSource};

use crate::error::{describe, RenderError};
use crate::shorthand;

// ---------------------------------------------------------------------------
// Reference scanning
// ---------------------------------------------------------------------------

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{%-?\s*(?:include|import|extends)\s+["']([^"']+)["']([^%]*)-?%\}"#)
            .expect("reference pattern is valid")
    })
}

struct Reference {
    name: String,
    optional: bool,
}

/// Comments and raw blocks, whichever opens first.
fn inert_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\{#.*?#\}|\{%-?\s*raw\s*-?%\}.*?\{%-?\s*endraw\s*-?%\}")
            .expect("inert region pattern is valid")
    })
}

/// Templates named by `include` / `import` / `extends` tags, ignoring any
/// that sit inside a comment or a raw block.
fn references(content: &str) -> Vec<Reference> {
    let live = inert_re().replace_all(content, "");
    reference_re()
        .captures_iter(&live)
        .map(|caps| Reference {
            name: caps[1].to_string(),
            optional: caps[2].contains("ignore missing"),
        })
        .collect()
}

fn expand(template: &str, text: &str) -> Result<String, RenderError> {
    shorthand::expand(text).map_err(|line| RenderError::Syntax {
        template: template.to_string(),
        message: format!("unterminated `${{` on line {line}"),
    })
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Compiles templates against a fixed include search path.
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    search_path: Vec<PathBuf>,
}

impl TemplateEngine {
    pub fn new<I, P>(search_path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        TemplateEngine {
            search_path: search_path.into_iter().map(Into::into).collect(),
        }
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Compile the body of `source` under its file name.
    pub fn compile_source(&self, source: &TemplateSource) -> Result<CompiledTemplate, RenderError> {
        let name = source
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "template".to_string());
        self.compile(&name, &source.body())
    }

    /// Compile `text` as template `name`, loading everything it references.
    pub fn compile(&self, name: &str, text: &str) -> Result<CompiledTemplate, RenderError> {
        let main = expand(name, text)?;
        let mut loaded: HashSet<String> = HashSet::from([name.to_string()]);
        let mut pending = references(&main);
        let mut templates: Vec<(String, String)> = Vec::new();

        while let Some(reference) = pending.pop() {
            if !loaded.insert(reference.name.clone()) {
                continue;
            }
            let Some(path) = self.locate(&reference.name) else {
                if reference.optional {
                    continue;
                }
                return Err(RenderError::Syntax {
                    template: name.to_string(),
                    message: format!(
                        "referenced template `{}` not found in search path [{}]",
                        reference.name,
                        self.display_search_path()
                    ),
                });
            };
            tracing::debug!("loading `{}` from {}", reference.name, path.display());
            let raw = std::fs::read_to_string(&path)
                .map_err(|source| RenderError::Io { path: path.clone(), source })?;
            let content = expand(&reference.name, &raw)?;
            pending.extend(references(&content));
            templates.push((reference.name, content));
        }
        templates.push((name.to_string(), main));

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(templates)
            .map_err(|e| RenderError::Syntax {
                template: name.to_string(),
                message: describe(&e),
            })?;
        Ok(CompiledTemplate {
            tera,
            name: name.to_string(),
        })
    }

    fn locate(&self, name: &str) -> Option<PathBuf> {
        self.search_path
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    fn display_search_path(&self) -> String {
        self.search_path
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// CompiledTemplate
// ---------------------------------------------------------------------------

/// A parsed template ready to render against any number of bindings.
pub struct CompiledTemplate {
    tera: Tera,
    name: String,
}

impl CompiledTemplate {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render with `binding` exposed as string variables. Leading and
    /// trailing whitespace is stripped from the result.
    pub fn render(&self, binding: &Binding) -> Result<String, RenderError> {
        let mut ctx = tera::Context::new();
        for (key, value) in binding.iter() {
            ctx.insert(key, value);
        }
        let rendered = self
            .tera
            .render(&self.name, &ctx)
            .map_err(|e| RenderError::Runtime {
                template: self.name.clone(),
                message: describe(&e),
            })?;
        Ok(rendered.trim().to_string())
    }
}

/// One-shot render of `text` with `binding`, resolving includes in
/// `search_path`.
pub fn render(text: &str, binding: &Binding, search_path: &[&Path]) -> Result<String, RenderError> {
    TemplateEngine::new(search_path.iter().copied())
        .compile("template", text)?
        .render(binding)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bind(pairs: &[(&str, &str)]) -> Binding {
        pairs.iter().copied().collect()
    }

    #[test]
    fn shorthand_round_trip() {
        let out = render("${x}", &bind(&[("x", "A")]), &[]).unwrap();
        assert_eq!(out, "A");
    }

    #[test]
    fn conditionals_and_loops() {
        let text = "{% if IsConst == \"True\" %}const_{% endif %}\
                    {% for a in ARR | split(pat=\",\") %}[{{ a }}]{% endfor %}";
        let out = render(text, &bind(&[("ARR", "x,y"), ("IsConst", "True")]), &[]).unwrap();
        assert_eq!(out, "const_[x][y]");
    }

    #[test]
    fn output_is_trimmed() {
        let out = render("\n\n  body  \n\n", &Binding::new(), &[]).unwrap();
        assert_eq!(out, "body");
    }

    #[test]
    fn no_html_escaping() {
        let out = render("${v}", &bind(&[("v", "a < b && c")]), &[]).unwrap();
        assert_eq!(out, "a < b && c");
    }

    #[test]
    fn undefined_variable_is_runtime_error() {
        let err = render("${missing}", &Binding::new(), &[]).unwrap_err();
        assert!(err.is_runtime(), "got: {err}");
        assert!(err.to_string().contains("missing"), "got: {err}");
    }

    #[test]
    fn bad_syntax_is_syntax_error() {
        let err = render("{% if x %}unclosed", &Binding::new(), &[]).unwrap_err();
        assert!(err.is_syntax(), "got: {err}");
        let err = render("${x", &Binding::new(), &[]).unwrap_err();
        assert!(err.is_syntax(), "got: {err}");
    }

    #[test]
    fn includes_resolve_through_search_path() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(second.path().join("part.tpl"), "[${x}]").unwrap();
        let engine = TemplateEngine::new([first.path(), second.path()]);
        let compiled = engine.compile("main", "{% include \"part.tpl\" %}!").unwrap();
        assert_eq!(compiled.render(&bind(&[("x", "1")])).unwrap(), "[1]!");
    }

    #[test]
    fn first_search_root_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(first.path().join("p"), "first").unwrap();
        std::fs::write(second.path().join("p"), "second").unwrap();
        let engine = TemplateEngine::new([first.path(), second.path()]);
        let out = engine.compile("m", "{% include 'p' %}").unwrap().render(&Binding::new());
        assert_eq!(out.unwrap(), "first");
    }

    #[test]
    fn nested_includes_are_loaded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("outer"), "<{% include \"inner\" %}>").unwrap();
        std::fs::write(dir.path().join("inner"), "in").unwrap();
        let engine = TemplateEngine::new([dir.path()]);
        let out = engine.compile("m", "{% include \"outer\" %}").unwrap().render(&Binding::new());
        assert_eq!(out.unwrap(), "<in>");
    }

    #[test]
    fn missing_include_is_syntax_error() {
        let dir = TempDir::new().unwrap();
        let engine = TemplateEngine::new([dir.path()]);
        let err = engine.compile("m", "{% include \"nope\" %}").err().unwrap();
        assert!(err.is_syntax());
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn commented_include_is_not_loaded() {
        let out = render("{# {% include \"old.inc\" %} #}ok", &Binding::new(), &[]);
        assert_eq!(out.unwrap(), "ok");
    }

    #[test]
    fn include_inside_raw_block_is_not_loaded() {
        let text = "{% raw %}{% include \"old.inc\" %}{% endraw %}";
        let out = render(text, &Binding::new(), &[]).unwrap();
        assert_eq!(out, "{% include \"old.inc\" %}");
    }

    #[test]
    fn include_after_comment_is_still_loaded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("live.inc"), "live").unwrap();
        let engine = TemplateEngine::new([dir.path()]);
        let compiled = engine
            .compile("m", "{# note #}{% include \"live.inc\" %}")
            .unwrap();
        assert_eq!(compiled.render(&Binding::new()).unwrap(), "live");
    }

    #[test]
    fn raw_block_keeps_literal_shorthand() {
        let text = "{% raw %}set(X ${CMAKE_DIR}){% endraw %}";
        assert_eq!(render(text, &Binding::new(), &[]).unwrap(), "set(X ${CMAKE_DIR})");
    }

    #[test]
    fn double_dollar_renders_literal_shorthand() {
        let out = render("export P=$${HOME}/${dir}", &bind(&[("dir", "bin")]), &[]);
        assert_eq!(out.unwrap(), "export P=${HOME}/bin");
    }

    #[test]
    fn optional_include_may_be_missing() {
        let engine = TemplateEngine::new(Vec::<PathBuf>::new());
        let compiled = engine.compile("m", "a{% include \"nope\" ignore missing %}b").unwrap();
        assert_eq!(compiled.render(&Binding::new()).unwrap(), "ab");
    }

    #[test]
    fn compiled_template_renders_many_bindings() {
        let compiled = TemplateEngine::default().compile("m", "${n}").unwrap();
        assert_eq!(compiled.render(&bind(&[("n", "1")])).unwrap(), "1");
        assert_eq!(compiled.render(&bind(&[("n", "2")])).unwrap(), "2");
    }
}
