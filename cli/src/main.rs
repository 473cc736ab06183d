use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use docchat_ai::session::DocChat;
use docchat_core::config::DocChatConfig;
use tracing::info;

mod logging;
mod repl;

/// Chat with a set of PDF and text documents.
#[derive(Debug, Parser)]
#[command(name = "docchat", version, about)]
struct Cli {
    /// Files or directories to load (.pdf, .txt)
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Config file (defaults to ./docchat.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API key for the model provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Number of excerpts retrieved per question
    #[arg(long)]
    top_k: Option<usize>,

    /// Rewrite follow-up questions into standalone ones before retrieval
    #[arg(long)]
    condense: bool,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let mut cfg = DocChatConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(key) = cli.api_key.filter(|k| !k.trim().is_empty()) {
        cfg.api_key = Some(key);
    }
    if let Some(k) = cli.top_k {
        cfg.top_k = k;
    }
    if cli.condense {
        cfg.condense_follow_ups = true;
    }
    cfg.validate().context("validating configuration")?;
    info!(
        base_url = %cfg.api_base_url,
        chat_model = %cfg.chat_model,
        embedding_model = %cfg.embedding_model,
        "starting docchat"
    );

    let docchat = DocChat::with_openai(&cfg)?;
    let session = docchat
        .create_session(&cli.paths)
        .context("building the document index")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    repl::print_summary(&mut out, session.load_summary(), session.chunk_count())?;
    repl::run(&docchat, io::stdin().lock(), &mut out)?;
    Ok(())
}
