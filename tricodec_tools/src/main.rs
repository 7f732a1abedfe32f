mod utils;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use tricodec::{file_size, AudioCodec, CodecKind};
use utils::{exists_decision, format_size, Assume};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Subcommands,

    /// Overwrite output files
    #[arg(short = 'y', long = "overwrite", conflicts_with = "assumeno")]
    assumeyes: bool,

    /// Do not overwrite output files
    #[arg(short = 'n', long = "preserve", conflicts_with = "assumeyes")]
    assumeno: bool,
}

#[derive(Debug, Subcommand)]
enum Subcommands {
    /// Compress a text (.txt), image (.png, .bmp, ...) or audio (.wav) file
    Compress(CompressArgs),

    /// Restore a .bin, .rle or .qpcm artifact
    Decompress(DecompressArgs),

    /// Print the size of a file
    Size(SizeArgs),
}

#[derive(Debug, Args)]
struct CompressArgs {
    /// Input file, its extension selects the codec
    input: PathBuf,

    /// Audio quantization factor, a higher value = smaller range of values.
    ///
    /// Ignored for text and images.
    #[arg(default_value_t = tricodec::audio::DEFAULT_FACTOR, short, long, value_parser = clap::value_parser!(u32).range(1..))]
    factor: u32,
}

#[derive(Debug, Args)]
struct DecompressArgs {
    /// Artifact written by `compress`
    input: PathBuf,
}

#[derive(Debug, Args)]
struct SizeArgs {
    /// Any file
    input: PathBuf,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let assume = if args.assumeyes {
        Some(Assume::Yes)
    } else if args.assumeno {
        Some(Assume::No)
    } else {
        None
    };

    match args.command {
        Subcommands::Compress(a) => compress(a, assume),
        Subcommands::Decompress(a) => decompress(a, assume),
        Subcommands::Size(a) => {
            println!("{}", format_size(file_size(&a.input)?));
            Ok(())
        }
    }
}

fn compress(args: CompressArgs, assume: Option<Assume>) -> Result<()> {
    if !args.input.try_exists()? {
        bail!("Input file {:?} does not exist", args.input);
    }

    let kind = CodecKind::for_input(&args.input)?;
    let outputs = kind.compressed_outputs(&args.input);
    if !may_write(&outputs, assume)? {
        return Ok(())
    }

    let codec = kind.codec(AudioCodec::with_factor(args.factor)?);
    let output = codec.compress(&args.input)?;

    report(&args.input, &output, &outputs)
}

fn decompress(args: DecompressArgs, assume: Option<Assume>) -> Result<()> {
    if !args.input.try_exists()? {
        bail!("Input file {:?} does not exist", args.input);
    }

    let kind = CodecKind::for_artifact(&args.input)?;
    let outputs = [kind.decompressed_output(&args.input)];
    if !may_write(&outputs, assume)? {
        return Ok(())
    }

    let output = kind.codec(AudioCodec::default()).decompress(&args.input)?;

    report(&args.input, &output, &outputs)
}

/// Ask before replacing any existing output
fn may_write(outputs: &[PathBuf], assume: Option<Assume>) -> Result<bool> {
    for output in outputs {
        if output.try_exists()? && !exists_decision("Output", "Overwrite", output, assume) {
            return Ok(false)
        }
    }

    Ok(true)
}

/// Print where the result went and how the sizes compare. Text artifacts come
/// in pairs, so every written file counts.
fn report(input: &Path, output: &Path, written: &[PathBuf]) -> Result<()> {
    let before = file_size(input)?;
    let mut after = 0;
    for path in written {
        after += file_size(path)?;
    }

    println!("{}", output.display());
    println!("  {} -> {}", format_size(before), format_size(after));
    if before > 0 {
        println!("  ratio {:.2}%", after as f64 / before as f64 * 100.0);
    }

    Ok(())
}
