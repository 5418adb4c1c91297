mod desk;
mod render;
mod serve;
mod shell;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use delve_core::{DelveConfig, UploadedFile};
use delve_engine::ResearchEngine;
use delve_storage::InMemoryStorage;

use crate::desk::{ResearchDesk, Submission};

/// Environment variable holding the tracing filter directive.
const LOG_ENV: &str = "DELVE_LOG";

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Deep research runs from the terminal, an interactive shell, or a browser.
#[derive(Parser)]
#[command(name = "delve", version, about = "Deep research runs with continuation and document context")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one research query and print the resulting record
    Run {
        /// The research question
        query: String,
        /// A .txt or .pdf file to use as context
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Start an interactive research session
    Shell,

    /// Start the HTTP server (research page + JSON API)
    Serve {
        /// Address to bind (defaults to server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (defaults to server.port)
        #[arg(long)]
        port: Option<u16>,
        /// Path to TLS certificate PEM file (requires --tls-key)
        #[arg(long)]
        tls_cert: Option<PathBuf>,
        /// Path to TLS private key PEM file (requires --tls-cert)
        #[arg(long)]
        tls_key: Option<PathBuf>,
    },

    /// Print the resolved configuration with secrets redacted
    Config,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.quiet, cli.verbose) {
        eprintln!("warning: {e}");
    }

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = DelveConfig::load_with_dotenv().context("failed to load configuration")?;
    tracing::debug!(mode = ?config.agent.mode, "configuration loaded");

    match cli.command {
        Commands::Config => print_config(&config, cli.output),
        Commands::Run { query, file } => {
            let upload = file
                .map(|path| {
                    UploadedFile::from_path(&path)
                        .with_context(|| format!("failed to read {}", path.display()))
                })
                .transpose()?;
            let desk = build_desk(&config)?;
            let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
            let submission = Submission {
                query,
                parent_id: None,
                upload,
            };
            let record = runtime.block_on(async {
                match desk.submit(submission).await {
                    Ok(id) => desk.get(&id).await,
                    Err(e) => Err(e),
                }
            })?;
            let record = record.context("research record missing after run")?;
            render::print_record(&record, cli.output)
        }
        Commands::Shell => {
            let desk = build_desk(&config)?;
            let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
            let stdin = std::io::stdin();
            shell::run_shell(&desk, &runtime, stdin.lock(), cli.output, cli.quiet);
            Ok(())
        }
        Commands::Serve {
            host,
            port,
            tls_cert,
            tls_key,
        } => {
            if tls_cert.is_some() != tls_key.is_some() {
                anyhow::bail!("--tls-cert and --tls-key must both be provided");
            }
            let desk = build_desk(&config)?;
            let options = serve::ServeOptions {
                host: host.unwrap_or_else(|| config.server.host.clone()),
                port: port.unwrap_or(config.server.port),
                api_key: Some(config.server.api_key.clone()),
                tls_cert,
                tls_key,
            };
            let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
            runtime.block_on(serve::start_server(desk, options))
        }
    }
}

/// A desk over a fresh in-memory store, with the agent chosen by config.
fn build_desk(config: &DelveConfig) -> anyhow::Result<ResearchDesk> {
    let engine = ResearchEngine::from_settings(
        Arc::new(InMemoryStorage::new()),
        config.agent.clone(),
    )
    .context("failed to set up research agent")?;
    tracing::debug!(agent = engine.agent_name(), "research engine ready");
    Ok(ResearchDesk::new(engine))
}

fn print_config(config: &DelveConfig, output: OutputFormat) -> anyhow::Result<()> {
    let value = serde_json::to_value(config.redacted())?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Text => {
            let mut lines = Vec::new();
            flatten_config("", &value, &mut lines);
            for line in lines {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// `section.key = value` lines for every leaf of a JSON object.
fn flatten_config(prefix: &str, value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_config(&path, child, out);
            }
        }
        leaf => out.push(format!("{prefix} = {leaf}")),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flatten_config_uses_dotted_keys() {
        let value = serde_json::json!({"server": {"port": 8080, "host": "127.0.0.1"}});
        let mut lines = Vec::new();
        flatten_config("", &value, &mut lines);
        assert!(lines.contains(&"server.port = 8080".to_string()));
        assert!(lines.contains(&"server.host = \"127.0.0.1\"".to_string()));
    }
}
