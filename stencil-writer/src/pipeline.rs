//! Run orchestration shared by both output modes.
//!
//! Per target: parse → resolve → render → write → format. Targets run
//! strictly in directive order, each one finished before the next starts.
//! Any failure before formatting aborts the run; formatting only ever
//! degrades to [`FormatStatus::FormatSkipped`].

use std::path::{Path, PathBuf};

use serde::Serialize;

use stencil_core::{
    naming, parse_directives, FormatStatus, RenderJob, RenderedOutput, StencilConfig,
    StructuralError, TemplateSource,
};
use stencil_renderer::{CompiledTemplate, TemplateEngine};

use crate::error::{io_err, WriteError};
use crate::formatter::Formatter;
use crate::writer;

/// Which outputs a run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// One file per header directive under `output_dir`.
    Multi { output_dir: PathBuf },
    /// Exactly one file. `output_name` defaults to the template name with
    /// the configured suffix removed. Without `output_dir`, a derived name
    /// lands beside the template and an explicit one is taken relative to
    /// the current directory.
    Single {
        output_name: Option<String>,
        output_dir: Option<PathBuf>,
    },
}

/// Everything one invocation needs.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub template: PathBuf,
    pub mode: OutputMode,
    pub config: StencilConfig,
    /// Include roots searched after the template directory and the
    /// configured `include_dirs`.
    pub include_dirs: Vec<PathBuf>,
}

/// What a run produced, one entry per target in directive order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub template: PathBuf,
    pub mode: &'static str,
    pub outputs: Vec<RenderedOutput>,
}

impl RunReport {
    pub fn formatted(&self) -> usize {
        self.outputs.iter().filter(|o| o.format.is_formatted()).count()
    }
}

/// Run the pipeline for `request`.
pub fn run(request: &RunRequest) -> Result<RunReport, WriteError> {
    let config = &request.config;
    let text = std::fs::read_to_string(&request.template)
        .map_err(|e| io_err(&request.template, e))?;
    let source = TemplateSource::new(&request.template, text, &config.marker());

    let mut search_path = vec![source.dir().to_path_buf()];
    search_path.extend(config.include_dirs.iter().cloned());
    search_path.extend(request.include_dirs.iter().cloned());
    let engine = TemplateEngine::new(search_path);
    let formatter = Formatter::new(config.formatter.clone());

    let (mode, outputs) = match &request.mode {
        OutputMode::Multi { output_dir } => (
            "multi",
            run_multi(&source, config, &engine, &formatter, output_dir)?,
        ),
        OutputMode::Single {
            output_name,
            output_dir,
        } => {
            let name = match output_name {
                Some(name) => name.clone(),
                None => naming::derive_output_name(&request.template, &config.template_suffix)?,
            };
            let final_path = match (output_dir, output_name) {
                (Some(dir), _) => dir.join(&name),
                (None, Some(_)) => PathBuf::from(&name),
                (None, None) => request.template.with_file_name(&name),
            };
            let output = run_single(&source, &engine, &formatter, config, name, &final_path)?;
            ("single", vec![output])
        }
    };

    Ok(RunReport {
        template: request.template.clone(),
        mode,
        outputs,
    })
}

fn run_multi(
    source: &TemplateSource,
    config: &StencilConfig,
    engine: &TemplateEngine,
    formatter: &Formatter,
    output_dir: &Path,
) -> Result<Vec<RenderedOutput>, WriteError> {
    let directives = parse_directives(source)?;
    let resolver = config.binding_resolver();
    let compiled = engine.compile_source(source)?;

    let mut outputs = Vec::with_capacity(directives.len());
    for directive in directives {
        let binding = resolver.resolve(&directive.vars)?;
        let job = RenderJob {
            source,
            directive,
            binding,
        };
        outputs.push(render_to_dir(&job, &compiled, formatter, output_dir)?);
    }
    Ok(outputs)
}

fn render_to_dir(
    job: &RenderJob<'_>,
    compiled: &CompiledTemplate,
    formatter: &Formatter,
    output_dir: &Path,
) -> Result<RenderedOutput, WriteError> {
    tracing::debug!(
        "rendering `{}` (directive {}, {} binding(s))",
        job.directive.filename,
        job.directive.index,
        job.binding.len()
    );
    let text = compiled.render(&job.binding)?;
    let path = writer::write_target(output_dir, &job.directive.filename, &text)?;
    let format = formatter.format_in_place(&path);
    if let FormatStatus::FormatSkipped { reason } = &format {
        tracing::warn!("{}: {reason}", path.display());
    }
    finish(path, text, format)
}

fn run_single(
    source: &TemplateSource,
    engine: &TemplateEngine,
    formatter: &Formatter,
    config: &StencilConfig,
    name: String,
    final_path: &Path,
) -> Result<RenderedOutput, WriteError> {
    match parse_directives(source) {
        Ok(directives) => tracing::warn!(
            "{}: ignoring {} directive(s) in single-output mode; pass an output directory to use them",
            source.path.display(),
            directives.len()
        ),
        Err(StructuralError::NoDirectives { .. }) => {}
        Err(e) => return Err(e.into()),
    }

    let job = RenderJob::implicit(source, name);
    let compiled = engine.compile_source(source)?;
    let text = compiled.render(&job.binding)?;
    let format = writer::write_staged(final_path, &text, &config.staging_prefix, formatter)?;
    if let FormatStatus::FormatSkipped { reason } = &format {
        tracing::warn!("{}: {reason}", final_path.display());
    }
    finish(final_path.to_path_buf(), text, format)
}

/// Records the output with its on-disk size, which an in-place formatter
/// may have changed.
fn finish(path: PathBuf, text: String, format: FormatStatus) -> Result<RenderedOutput, WriteError> {
    let bytes = std::fs::metadata(&path).map_err(|e| io_err(&path, e))?.len();
    Ok(RenderedOutput::new(path, text, bytes, format))
}
