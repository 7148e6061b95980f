//! Train command implementation.

use clap::Parser;
use std::path::PathBuf;

/// Train command arguments.
#[derive(Parser)]
pub struct TrainCommand {
    /// Path to the training corpus
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory for the trained model
    #[arg(short, long)]
    pub output: PathBuf,

    /// Target vocabulary size, special tokens and the 256 bytes included
    #[arg(long, default_value_t = 10_000)]
    pub vocab_size: usize,

    /// Special token, in ID order (repeatable; default <|endoftext|>)
    #[arg(short, long = "special-token")]
    pub special_tokens: Vec<String>,

    /// Train without any special token
    #[arg(long, conflicts_with = "special_tokens")]
    pub no_special_tokens: bool,

    /// Pre-tokenization workers (default: all cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Keep CRLF and CR line endings instead of rewriting them to LF
    #[arg(long)]
    pub keep_line_endings: bool,
}

use anyhow::{Context, Result as AnyhowResult};
use bytebpe_tokenizer::Tokenizer;
use bytebpe_training::{BpeTrainer, TrainedModel, TrainingConfig, DEFAULT_SPECIAL_TOKEN};
use log::info;
use std::time::Instant;

pub fn run(cmd: TrainCommand) -> AnyhowResult<()> {
    let special_tokens = if cmd.no_special_tokens {
        Vec::new()
    } else if cmd.special_tokens.is_empty() {
        vec![DEFAULT_SPECIAL_TOKEN.to_string()]
    } else {
        cmd.special_tokens.clone()
    };

    let mut builder = TrainingConfig::builder()
        .vocab_size(cmd.vocab_size)
        .special_tokens(special_tokens)
        .normalize_line_endings(!cmd.keep_line_endings);
    if let Some(workers) = cmd.workers {
        builder = builder.num_workers(workers);
    }
    let config = builder.build().context("invalid training configuration")?;

    info!(
        "Training on {} (vocab size {}, {} workers)",
        cmd.input.display(),
        config.vocab_size,
        config.num_workers
    );

    let start = Instant::now();
    let trainer = BpeTrainer::new(config)?;
    let model = trainer
        .train_from_file(&cmd.input)
        .with_context(|| format!("training on {} failed", cmd.input.display()))?;
    let elapsed = start.elapsed();

    print_summary(&model);
    println!("Training completed in {:.2}s", elapsed.as_secs_f64());

    let tokenizer = Tokenizer::from_trained(model)?;
    let path = tokenizer
        .save(&cmd.output)
        .with_context(|| format!("saving tokenizer to {}", cmd.output.display()))?;
    println!("Model saved to {}", path.display());

    Ok(())
}

fn print_summary(model: &TrainedModel) {
    println!("Final vocab size: {}", model.vocab.len());
    println!("Merges learned: {}", model.merges.len());
    match model.longest_token() {
        Some(bytes) => println!(
            "Longest token: {:?} ({} bytes)",
            String::from_utf8_lossy(bytes),
            bytes.len()
        ),
        None => println!("Longest token: none (no merges)"),
    }
}
