//! Workload Preprocessor Command Line Interface
//!
//! Resolves workload YAML files into their fully expanded form.
//!
//! # Usage
//!
//! ```bash
//! # Resolve a workload file, external phase configs relative to ./src
//! workload_cli evaluate --file workloads/Insert.yml --root src
//!
//! # Resolve from stdin into the smoke-test form
//! cat workloads/Insert.yml | workload_cli evaluate --smoke-test
//!
//! # List the templates a workload declares
//! workload_cli templates --file workloads/Insert.yml
//! ```

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use workload_preprocessor::{Node, PreprocessConfig, TemplateRegistry, WorkloadParser};

#[derive(Parser)]
#[command(name = "workload_cli")]
#[command(version = "0.1.0")]
#[command(about = "Resolve parameterised workload YAML into plain workload documents")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: yaml (default) or json
    #[arg(long, short = 'o', global = true, default_value = "yaml", value_enum)]
    format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a workload and print the result
    Evaluate {
        /// Input file (reads stdin if not provided)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Directory ExternalPhaseConfig paths are relative to
        #[arg(long, env = "WORKLOAD_PHASE_CONFIG_DIR")]
        root: Option<PathBuf>,

        /// Convert phases into their smoke-test form
        #[arg(long)]
        smoke_test: bool,
    },

    /// List the actor templates a workload declares
    Templates {
        /// Input file (reads stdin if not provided)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            file,
            root,
            smoke_test,
        } => cmd_evaluate(file, root, smoke_test, cli.format, cli.quiet),
        Commands::Templates { file } => cmd_templates(file, cli.format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_evaluate(
    file: Option<PathBuf>,
    root: Option<PathBuf>,
    smoke_test: bool,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let (source, origin) = read_input(file)?;

    let mut config = PreprocessConfig::from_env();
    if let Some(root) = root {
        config = config.with_root(root);
    }
    if smoke_test {
        config = config.with_smoke_test(true);
    }

    let document = Node::from_yaml_str(&source, &origin)?;
    let resolved = WorkloadParser::new(config)
        .resolve(document)
        .with_context(|| format!("Failed to resolve {}", origin))?;

    print_node(&resolved, format)?;
    if !quiet && format == OutputFormat::Yaml {
        eprintln!("{} Resolved {}", "OK".green(), origin);
    }
    Ok(())
}

fn cmd_templates(file: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let (source, origin) = read_input(file)?;
    let document = Node::from_yaml_str(&source, &origin)?;
    let Some(mapping) = document.as_mapping() else {
        bail!("{} is not a workload mapping", origin);
    };
    let registry = TemplateRegistry::from_document(mapping)?;
    let names: Vec<&str> = registry.names().collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
        OutputFormat::Yaml => {
            for name in names {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

fn print_node(node: &Node, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => print!(
            "{}",
            node.to_yaml_string().context("YAML serialization failed")?
        ),
        OutputFormat::Json => println!(
            "{}",
            node.to_json_string().context("JSON serialization failed")?
        ),
    }
    Ok(())
}

/// Returns the text and a label for it
fn read_input(file: Option<PathBuf>) -> Result<(String, String)> {
    match file {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            Ok((text, path.display().to_string()))
        }
        None => {
            // Check if stdin has data
            if atty::is(atty::Stream::Stdin) {
                bail!("No input provided. Use --file or pipe input via stdin.");
            }
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok((buffer, "<stdin>".to_string()))
        }
    }
}
