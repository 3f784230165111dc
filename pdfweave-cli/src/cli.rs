//! CLI argument parsing for pdfweave.
//!
//! Defines the command-line interface with `clap` and expands glob
//! patterns into concrete input paths.

use clap::Parser;
use std::path::PathBuf;

use pdfweave::error::{PdfWeaveError, Result};

/// Merge PDF files into a single document with combined bookmarks.
///
/// pdfweave merges multiple PDF files in order, carries each source's
/// outline across with corrected page numbers, and groups every source
/// under a bold bookmark named after its file.
#[derive(Parser, Debug)]
#[command(name = "pdfweave")]
#[command(version)]
#[command(about = "Merge PDF files into a single document with combined bookmarks", long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input PDF files to merge (in order)
    ///
    /// Specify multiple files or use glob patterns.
    /// Files are merged in the order provided; glob matches are sorted.
    ///
    /// Examples:
    ///   pdfweave file1.pdf file2.pdf -o output.pdf
    ///   pdfweave 'chapter*.pdf' -o book.pdf
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output PDF file path
    ///
    /// Required unless --print-outline is the only thing you want.
    #[arg(short, long, value_name = "FILE", required_unless_present = "print_outline")]
    pub output: Option<PathBuf>,

    /// Overwrite an existing output file
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite an existing output file (the default; kept as an
    /// explicit flag for scripts)
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose output with per-stage details
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the combined outline tree as JSON to stdout
    #[arg(long)]
    pub print_outline: bool,

    /// Merge outlines without synthetic per-source root bookmarks
    #[arg(long)]
    pub no_source_roots: bool,
}

impl Cli {
    /// Expand the raw input arguments into concrete paths.
    ///
    /// Arguments containing glob metacharacters are expanded (matches
    /// sorted by the glob crate's iteration order); plain paths pass
    /// through untouched so a missing file fails at read time with a
    /// useful message rather than vanishing silently here.
    pub fn expanded_inputs(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();

        for input in &self.inputs {
            if input.contains(['*', '?', '[']) {
                let matches = glob::glob(input).map_err(|e| {
                    PdfWeaveError::parse(input.clone(), format!("invalid glob pattern: {e}"))
                })?;
                let mut matched = false;
                for entry in matches {
                    let path = entry.map_err(|e| {
                        PdfWeaveError::parse(input.clone(), format!("glob error: {e}"))
                    })?;
                    paths.push(path);
                    matched = true;
                }
                if !matched {
                    return Err(PdfWeaveError::parse(
                        input.clone(),
                        "glob pattern matched no files",
                    ));
                }
            } else {
                paths.push(PathBuf::from(input));
            }
        }

        if paths.is_empty() {
            return Err(PdfWeaveError::NoSourcesSelected);
        }

        Ok(paths)
    }
}
