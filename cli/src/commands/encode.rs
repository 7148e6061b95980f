//! Encode command implementation.

use clap::Parser;
use std::path::PathBuf;

/// Encode command arguments.
#[derive(Parser)]
pub struct EncodeCommand {
    /// Directory holding tokenizer.json
    #[arg(short, long)]
    pub tokenizer: PathBuf,

    /// Text to encode, or "-" to stream stdin line by line
    #[arg(short, long)]
    pub input: String,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

use anyhow::{Context, Result as AnyhowResult};
use bytebpe_tokenizer::Tokenizer;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};

pub fn run(cmd: EncodeCommand) -> AnyhowResult<()> {
    let tokenizer = Tokenizer::load(&cmd.tokenizer)
        .with_context(|| format!("loading tokenizer from {}", cmd.tokenizer.display()))?;

    let mut out: Box<dyn Write> = match &cmd.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let count = if cmd.input == "-" {
        encode_stdin(&tokenizer, &mut out)?
    } else {
        let ids = tokenizer.encode(&cmd.input)?;
        write_ids(ids.into_iter().map(Ok), &mut out)?
    };
    out.flush().context("flushing output")?;
    drop(out);

    if let Some(path) = &cmd.output {
        println!("Encoded {} tokens to {}", count, path.display());
    }

    Ok(())
}

/// Encode stdin one line at a time, keeping line terminators.
///
/// IDs are written as each line is encoded.
fn encode_stdin(tokenizer: &Tokenizer, out: &mut impl Write) -> AnyhowResult<usize> {
    let mut reader = io::stdin().lock();
    let mut read_error = None;

    let lines = std::iter::from_fn(|| {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                read_error = Some(e);
                None
            }
        }
    });

    let count = write_ids(tokenizer.encode_stream(lines), out)?;

    if let Some(e) = read_error {
        return Err(e).context("reading stdin");
    }
    Ok(count)
}

/// Write space-separated IDs as they are pulled, then a newline.
///
/// Returns the number of IDs written. Stops at the first encode error.
pub(crate) fn write_ids<I>(ids: I, out: &mut impl Write) -> AnyhowResult<usize>
where
    I: IntoIterator<Item = bytebpe_tokenizer::Result<u32>>,
{
    let mut count = 0;
    for id in ids {
        let id = id?;
        if count > 0 {
            out.write_all(b" ")?;
        }
        write!(out, "{id}")?;
        count += 1;
    }
    writeln!(out)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytebpe_tokenizer::TokenizerError;

    #[test]
    fn test_write_ids() {
        let mut out: Vec<u8> = Vec::new();
        let count = write_ids([1, 22, 333].map(Ok), &mut out).unwrap();
        assert_eq!(count, 3);
        assert_eq!(out, b"1 22 333\n");

        let mut out: Vec<u8> = Vec::new();
        let empty: Vec<bytebpe_tokenizer::Result<u32>> = Vec::new();
        assert_eq!(write_ids(empty, &mut out).unwrap(), 0);
        assert_eq!(out, b"\n");
    }

    #[test]
    fn test_write_ids_is_incremental() {
        let ids = vec![Ok(7), Ok(8), Err(TokenizerError::UnknownTokenId(9)), Ok(10)];
        let mut out: Vec<u8> = Vec::new();

        assert!(write_ids(ids, &mut out).is_err());
        assert_eq!(out, b"7 8");
    }
}
