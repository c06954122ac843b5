use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cj_ast::{ModuleSyntax, Node};
use cj_parser::parse_module;
use cj_rewrite::{RewriteOptions, Rewriter};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cjsify", about = "cjsify - rewrite ES module declarations into require/exports")]
struct Cli {
    /// JSON config file with `rewrite` and `syntax` sections.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite module declarations and emit the result.
    Transform {
        /// Input .js/.ts file.
        input: PathBuf,
        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Use a tree produced by an external parser (JSON) instead of
        /// parsing the input.
        #[arg(long)]
        tree: Option<PathBuf>,
        /// Object exported bindings are assigned onto.
        #[arg(long)]
        exports_object: Option<String>,
        /// Function used to load modules.
        #[arg(long)]
        loader: Option<String>,
    },
    /// Parse the file and report whether it can be rewritten.
    Check { input: PathBuf },
    /// Parse and dump the declaration tree as JSON.
    Parse {
        input: PathBuf,
        /// Dump the raw swc AST instead.
        #[arg(long)]
        swc: bool,
    },
}

/// Contents of the `--config` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    rewrite: RewriteOptions,
    syntax: ModuleSyntax,
}

impl Config {
    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        debug!(config = ?config, "loaded config");
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Transform {
            input,
            output,
            tree,
            exports_object,
            loader,
        } => {
            let source = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let filename = input.display().to_string();

            let mut options = config.rewrite;
            if let Some(exports_object) = exports_object {
                options.exports_object = exports_object;
            }
            if let Some(loader) = loader {
                options.loader = loader;
            }

            let program = match &tree {
                Some(path) => load_tree(path)?,
                None => parse_module(&source, &filename, &config.syntax)?.program,
            };

            let rewritten = Rewriter::new(options)
                .rewrite(&source, &program)
                .with_context(|| format!("cannot rewrite {filename}"))?;

            match &output {
                Some(path) => {
                    std::fs::write(path, &rewritten)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(input = %filename, output = %path.display(), "rewrote module");
                }
                None => print!("{rewritten}"),
            }
        }
        Commands::Check { input } => {
            let source = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let filename = input.display().to_string();

            let parsed = parse_module(&source, &filename, &config.syntax)?;
            Rewriter::new(config.rewrite)
                .rewrite(&parsed.source, &parsed.program)
                .with_context(|| format!("cannot rewrite {filename}"))?;
            eprintln!("OK: {filename}");
        }
        Commands::Parse { input, swc } => {
            let source = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let filename = input.display().to_string();

            let parsed = parse_module(&source, &filename, &config.syntax)?;

            let json = if swc {
                serde_json::to_string_pretty(&parsed.module)?
            } else {
                serde_json::to_string_pretty(&parsed.program)?
            };
            println!("{json}");
        }
    }

    Ok(())
}

fn load_tree(path: &Path) -> Result<Node> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read tree {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid tree {}", path.display()))
}
