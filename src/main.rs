//! proggraph CLI - build program graphs from Python and Java sources

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "proggraph")]
#[command(version)]
#[command(about = "Program graph builder - syntax, control-flow and data-flow edges for Python and Java")]
#[command(long_about = r#"
proggraph parses a source file and connects its syntax tree with
control-flow and data-flow edges:
  • Child / Sibling / NextToken
  • NextControlFlow / GuardedBy / ReturnFrom
  • LastWrite / LastRead / ComputedFrom

Example usage:
  proggraph build app.py --output app.dot
  proggraph stats Main.java
  proggraph batch --path ./src --out-dir ./graphs
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./proggraph.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Construction flags shared by every command that builds graphs
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Source language (python, java); inferred from the extension otherwise
    #[arg(short, long)]
    pub language: Option<String>,

    /// What to do with malformed input (raise, ignore)
    #[arg(long)]
    pub on_error: Option<String>,

    /// Analyses to run, comma separated (ast, cfg, dataflow)
    #[arg(short, long, value_delimiter = ',')]
    pub analyses: Option<Vec<String>>,

    /// Add Sibling edges between adjacent children
    #[arg(long)]
    pub sibling_edges: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph of one file and export it
    Build {
        /// Source file
        file: PathBuf,

        #[command(flatten)]
        build: BuildArgs,

        /// Output format (dot, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep only token nodes
        #[arg(long)]
        tokens_only: bool,
    },

    /// Show node and edge counts for one file
    Stats {
        /// Source file
        file: PathBuf,

        #[command(flatten)]
        build: BuildArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Build graphs for every Python and Java file under a directory
    Batch {
        /// Directory to scan
        #[arg(short, long)]
        path: PathBuf,

        /// Directory receiving one graph file per source file
        #[arg(short = 'O', long)]
        out_dir: PathBuf,

        #[command(flatten)]
        build: BuildArgs,

        /// Output format (dot, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Number of worker threads
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Write a default proggraph.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = proggraph::config::load_config(cli.config.as_deref())?.unwrap_or_default();

    match cli.command {
        Commands::Build {
            file,
            build,
            format,
            output,
            tokens_only,
        } => commands::run_build(
            &config,
            &file,
            &build,
            format.as_deref(),
            output.as_deref(),
            tokens_only,
        )?,

        Commands::Stats { file, build, json } => commands::run_stats(&config, &file, &build, json)?,

        Commands::Batch {
            path,
            out_dir,
            build,
            format,
            jobs,
        } => commands::run_batch(&config, &path, &out_dir, &build, format.as_deref(), jobs)?,

        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(proggraph::config::default_config_path);
            commands::run_init(&path, force)?
        }
    }

    Ok(())
}
