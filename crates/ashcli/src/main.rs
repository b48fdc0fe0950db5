//! Transpose ABC notation files from the command line.
//!
//! Reads from a file or stdin, writes to stdout or a file:
//!
//! ```text
//! ashcli -n 2 tune.abc
//! cat tune.abc | ashcli -n -1 --prefer sharp > out.abc
//! ```

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use abcshift::{transpose, Mode, Options, Prefer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum ModeArg {
    Chromatic,
    Tonal,
    #[default]
    Auto,
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Mode {
        match value {
            ModeArg::Chromatic => Mode::Chromatic,
            ModeArg::Tonal => Mode::Tonal,
            ModeArg::Auto => Mode::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum PreferArg {
    #[default]
    Flat,
    Sharp,
}

impl From<PreferArg> for Prefer {
    fn from(value: PreferArg) -> Prefer {
        match value {
            PreferArg::Flat => Prefer::Flat,
            PreferArg::Sharp => Prefer::Sharp,
        }
    }
}

/// Transpose ABC notation by a number of semitone steps.
#[derive(Debug, Parser)]
#[command(name = "ashcli", version, about)]
struct Args {
    /// Signed number of steps to transpose by.
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    steps: i32,

    /// Respelling mode.
    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    mode: ModeArg,

    /// Enharmonic side to lean toward.
    #[arg(long, value_enum, default_value_t = PreferArg::Flat, env = "ASHCLI_PREFER")]
    prefer: PreferArg,

    /// Leave chord symbols in quoted strings untouched.
    #[arg(long)]
    no_chords: bool,

    /// Reject transpositions larger than this many steps.
    #[arg(long)]
    max_delta: Option<u32>,

    /// Write the result here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Input file; stdin when omitted.
    input: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let text = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    debug!(bytes = text.len(), steps = args.steps, "input loaded");

    let options = Options {
        mode: args.mode.into(),
        prefer: args.prefer.into(),
        chords: !args.no_chords,
        max_abs_delta: args.max_delta,
    };
    let result = transpose(&text, args.steps, &options)?;

    match &args.output {
        Some(path) => fs::write(path, result)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => io::stdout()
            .write_all(result.as_bytes())
            .context("failed to write stdout")?,
    }
    Ok(())
}
