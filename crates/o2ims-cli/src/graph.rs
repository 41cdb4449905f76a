//! # Graph Subcommand
//!
//! Renders the transition diagram, either as raw Graphviz or wrapped in the
//! markdown page kept under the developer docs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

/// Output format for the diagram.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GraphFormat {
    #[default]
    Dot,
    Markdown,
}

/// Arguments for `o2ims graph`.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Output format.
    #[arg(long, value_enum, default_value_t = GraphFormat::Dot)]
    pub format: GraphFormat,

    /// Write to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Execute the graph subcommand.
pub fn run_graph(args: &GraphArgs) -> Result<u8> {
    let rendered = render(args.format);
    match &args.output {
        Some(path) => write_output(path, &rendered)?,
        None => print!("{rendered}"),
    }
    Ok(0)
}

fn render(format: GraphFormat) -> String {
    match format {
        GraphFormat::Dot => o2ims_configfsm::to_dot(),
        GraphFormat::Markdown => o2ims_configfsm::to_markdown(),
    }
}

fn write_output(path: &Path, rendered: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
    println!("OK: wrote {}", path.display());
    Ok(())
}
