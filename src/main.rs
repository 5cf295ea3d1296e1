// pyviz: step tracer and timeline viewer for a Python subset

mod cli;

use std::fs;
use std::io;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use pyviz::tracer::trace_with;
use pyviz::ui::TerminalViewer;
use pyviz::viewer::html::HtmlExport;
use pyviz::viewer::{Frontend, Session};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "pyviz=debug" } else { "pyviz=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.parse()?))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    // Read source code
    let source = match &cli.file {
        Some(path) => {
            debug!(path = %path.display(), "reading source file");
            fs::read_to_string(path).map_err(|err| format!("{}: {}", path.display(), err))?
        }
        None => {
            println!("{}", cli::PROMPT);
            cli::read_until_sentinel(io::stdin().lock())?
        }
    };

    if source.trim().is_empty() {
        println!("No code provided.");
        return Ok(());
    }

    let trace = trace_with(&source, &cli.trace_config());
    info!(steps = trace.len(), outcome = ?trace.outcome, "traced program");

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&trace)?);
        return Ok(());
    }

    let mut session = Session::new(trace, source);
    match &cli.html {
        Some(path) => {
            HtmlExport::new(path).present(&mut session)?;
            println!("Wrote {}", path.display());
        }
        None => TerminalViewer.present(&mut session)?,
    }

    Ok(())
}
