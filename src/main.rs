use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use notemark::Config;
use notemark::note::{append_note, append_requests};

#[derive(Parser)]
#[command(name = "notemark", version)]
#[command(about = "Convert Markdown to document API blocks")]
struct Cli {
    /// Input Markdown file (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Output JSON file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,

    /// Wrap the blocks in a timestamped note section with this title
    #[arg(long)]
    title: Option<String>,

    /// Emit append request bodies of at most 100 blocks instead of one array
    #[arg(long)]
    requests: bool,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config);

    let markdown = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Error reading {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Error reading stdin")?;
            buffer
        }
    };

    let mut blocks = notemark::convert_with_config(&markdown, &config)?;
    if let Some(title) = &cli.title {
        let now = chrono::Local::now().naive_local();
        blocks = append_note(title, now, blocks, &config.note);
    }

    let value = if cli.requests {
        Value::Array(append_requests(&blocks))
    } else {
        notemark::blocks_to_json(&blocks)
    };
    let json = if cli.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, json + "\n")
                .with_context(|| format!("Error writing {}", path.display()))?;
            eprintln!("Wrote {} blocks to {}", blocks.len(), path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
