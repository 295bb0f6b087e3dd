//! Stencil — render source files from one template and its header directives.
//!
//! # Usage
//!
//! ```text
//! stencil <template> [--outputname NAME] [--output-dir DIR]   # single output
//! stencil <template> <output-directory>                       # one file per directive
//! ```
//!
//! A directive is a header line of the form
//! `## <filename> <key1>=<value1>;<key2>=<value2>;`.

mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use stencil_core::StencilConfig;
use stencil_writer::{OutputMode, RunRequest};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stencil",
    version,
    about = "Render source files from a template and the directives in its header",
    long_about = None,
)]
struct Cli {
    /// Template file to render.
    template: PathBuf,

    /// Render every header directive into this directory.
    /// Without it, the template is rendered to a single file.
    output_dir: Option<PathBuf>,

    /// Single-output file name [default: template name without its suffix].
    #[arg(long, short = 'o', value_name = "NAME", conflicts_with = "output_dir")]
    outputname: Option<String>,

    /// Directory for the single output file [default: beside the template,
    /// or the current directory when --outputname is given].
    #[arg(long = "output-dir", value_name = "DIR", conflicts_with = "output_dir")]
    single_dir: Option<PathBuf>,

    /// Extra include directory, searched after the template's own directory.
    #[arg(long = "include", short = 'I', value_name = "DIR")]
    include: Vec<PathBuf>,

    /// Configuration file [default: stencil.yaml beside the template].
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Do not run the formatter.
    #[arg(long)]
    no_format: bool,

    /// Print the run report as JSON.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn mode(&self) -> OutputMode {
        match &self.output_dir {
            Some(dir) => OutputMode::Multi {
                output_dir: dir.clone(),
            },
            None => OutputMode::Single {
                output_name: self.outputname.clone(),
                output_dir: self.single_dir.clone(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = StencilConfig::discover(cli.config.as_deref(), &cli.template)
        .context("failed to load configuration")?;
    if cli.no_format {
        config.formatter.enabled = false;
    }
    tracing::debug!("configuration: {config:?}");

    let request = RunRequest {
        template: cli.template.clone(),
        mode: cli.mode(),
        config,
        include_dirs: cli.include.clone(),
    };
    let report = stencil_writer::run(&request)
        .with_context(|| format!("failed to render {}", cli.template.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print(&report);
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
