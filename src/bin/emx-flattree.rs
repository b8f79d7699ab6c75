//! emx-flattree CLI
//!
//! Flatten a tree into one text archive and extract it again (similar to tar command).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use emx_flattree::archive::DEFAULT_IGNORE_FILE;
use emx_flattree::{ArchiveOptions, Decoder, Encoder, ExtractOptions, RecordBody};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "emx-flattree")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Flatten a directory tree into a single text archive")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an archive from files/directories
    Create {
        /// Files and directories to archive
        #[arg(short = 'i', long = "input", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Output archive file
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Top directory; record paths are relative to it
        #[arg(short = 't', long)]
        top: PathBuf,

        /// Write binary files as placeholder records instead of skipping them
        #[arg(long)]
        include_binary: bool,

        /// Name of the per-directory ignore file
        #[arg(long, default_value = DEFAULT_IGNORE_FILE)]
        ignore_file: String,

        /// Verbose output (-v for skipped items, -vv for every file)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
    },

    /// Extract an archive
    #[command(name = "x")]
    Extract {
        /// Archive file to extract
        #[arg(short = 'i', long)]
        input: PathBuf,

        /// Directory to extract to
        #[arg(short = 'C', long)]
        directory: PathBuf,

        /// Verbose output (-v for skipped records, -vv for every file)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
    },

    /// List contents of an archive
    #[command(name = "t")]
    List {
        /// Archive file to list
        #[arg(short = 'i', long)]
        input: PathBuf,

        /// Show record kind and size
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Create { inputs, output, top, include_binary, ignore_file, verbose } => {
            setup_logging(verbose);
            let options = ArchiveOptions::new()
                .with_include_binary(include_binary)
                .with_ignore_file_name(ignore_file)
                .with_verbose(verbose > 0);
            create_archive(&inputs, output, top, options)?;
        }
        Commands::Extract { input, directory, verbose } => {
            setup_logging(verbose);
            extract_archive(input, directory, ExtractOptions::new().with_verbose(verbose > 0))?;
        }
        Commands::List { input, verbose } => {
            setup_logging(0);
            list_archive(input, verbose)?;
        }
    }

    Ok(())
}

fn setup_logging(verbose: u8) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => tracing_subscriber::EnvFilter::new("warn"),
        1 => tracing_subscriber::EnvFilter::new("info,globset=warn"),
        _ => tracing_subscriber::EnvFilter::new("debug,globset=warn"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn create_archive(inputs: &[PathBuf], output: PathBuf, top: PathBuf, options: ArchiveOptions) -> Result<()> {
    let report = Encoder::with_options(options)
        .encode_to_file(inputs, &output, &top)
        .with_context(|| format!("Failed to create archive from {} input(s)", inputs.len()))?;

    tracing::info!(
        "Created: {} ({} files, {} skipped)",
        output.display(),
        report.archived().len(),
        report.skipped().len()
    );

    Ok(())
}

fn extract_archive(input: PathBuf, directory: PathBuf, options: ExtractOptions) -> Result<()> {
    let report = Decoder::with_options(options)
        .extract_to_dir(&input, &directory)
        .with_context(|| format!("Failed to extract into: {}", directory.display()))?;

    tracing::info!(
        "Extracted: {} ({} files, {} skipped)",
        input.display(),
        report.written().len(),
        report.skipped().len()
    );

    Ok(())
}

fn list_archive(input: PathBuf, verbose: bool) -> Result<()> {
    let file = File::open(&input).with_context(|| format!("Failed to read: {}", input.display()))?;
    let records = Decoder::new()
        .decode(BufReader::new(file))
        .with_context(|| format!("Failed to read: {}", input.display()))?;

    for record in &records {
        if verbose {
            let kind = match record.body {
                RecordBody::Text(_) => "text",
                RecordBody::Binary => "binary",
            };
            println!("{}  {}  {}", record.path, kind, record.len());
        } else {
            println!("{}", record.path);
        }
    }

    Ok(())
}
