//! Decode command implementation.

use clap::Parser;
use std::path::PathBuf;

/// Decode command arguments.
#[derive(Parser)]
pub struct DecodeCommand {
    /// Directory holding tokenizer.json
    #[arg(short, long)]
    pub tokenizer: PathBuf,

    /// Token IDs separated by spaces or commas, or "-" to read stdin
    #[arg(long)]
    pub ids: String,
}

use anyhow::{Context, Result as AnyhowResult};
use bytebpe_tokenizer::Tokenizer;
use std::io::{self, Read, Write};

pub fn run(cmd: DecodeCommand) -> AnyhowResult<()> {
    let tokenizer = Tokenizer::load(&cmd.tokenizer)
        .with_context(|| format!("loading tokenizer from {}", cmd.tokenizer.display()))?;

    let raw = if cmd.ids == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("reading stdin")?;
        buffer
    } else {
        cmd.ids
    };

    let ids = parse_ids(&raw)?;
    let text = tokenizer.decode(&ids)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;

    Ok(())
}

fn parse_ids(raw: &str) -> AnyhowResult<Vec<u32>> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .with_context(|| format!("invalid token ID {:?}", s))
        })
        .collect()
}
