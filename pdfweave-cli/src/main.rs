//! pdfweave - Merge PDF files into a single document with combined
//! bookmarks.

mod cli;

use clap::Parser;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use pdfweave::error::PdfWeaveError;
use pdfweave::io::{DocumentWriter, SourceReader, WriteOptions};
use pdfweave::merge::{merge_sources, resolve_outline, serialize_document};
use pdfweave::outline::write_outline;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("pdfweave={default_level}"))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic.
async fn run(cli: Cli) -> Result<(), PdfWeaveError> {
    let inputs = cli.expanded_inputs()?;
    debug!(count = inputs.len(), "resolved input paths");

    let reader = SourceReader::new();
    let sources = reader.read_all(&inputs).await?;

    let mut merged = merge_sources(&sources)?;
    let outline = resolve_outline(&merged, &sources, !cli.no_source_roots);
    info!(
        sources = sources.len(),
        pages = merged.total_pages,
        "merged documents"
    );

    if cli.print_outline {
        let json = serde_json::to_string_pretty(&outline)
            .map_err(|e| PdfWeaveError::merge_failed(format!("failed to encode outline: {e}")))?;
        println!("{json}");
    }

    let Some(output) = cli.output else {
        return Ok(());
    };

    write_outline(&mut merged.document, &outline)?;
    let bytes = serialize_document(&mut merged.document)?;

    let writer = DocumentWriter::with_options(WriteOptions {
        atomic: true,
        overwrite: cli.force && !cli.no_clobber,
    });
    let written = writer.save(bytes, &output).await?;

    info!(path = %written.display(), pages = merged.total_pages, "created merged document");
    Ok(())
}
