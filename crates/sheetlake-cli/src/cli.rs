//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use sheetlake::ConfigOverrides;
use std::path::PathBuf;

/// Sheetlake: header detection and schema classification for spreadsheet lakes
#[derive(Parser)]
#[command(name = "sheetlake")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (default: config/settings.yaml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the lake root to scan
    #[arg(long, global = true, value_name = "DIR")]
    pub input_root: Option<PathBuf>,

    /// Override the output root (staging, classified, quarantine, processed)
    #[arg(long, global = true, value_name = "DIR")]
    pub output_root: Option<PathBuf>,

    /// Rows previewed per file when looking for the header
    #[arg(long, global = true, value_name = "N")]
    pub header_search_rows: Option<usize>,

    /// Minimum header confidence in [0, 1]
    #[arg(long, global = true, value_name = "SCORE")]
    pub min_confidence: Option<f64>,
}

impl Cli {
    /// Flag overrides to apply on top of the settings file.
    pub fn overrides(&self) -> ConfigOverrides {
        let (overwrite, dry_run) = match &self.command {
            Commands::Classify {
                overwrite, dry_run, ..
            } => (*overwrite, *dry_run),
            _ => (false, false),
        };
        ConfigOverrides {
            input_root: self.input_root.clone(),
            output_root: self.output_root.clone(),
            header_search_rows: self.header_search_rows,
            min_header_confidence: self.min_confidence,
            overwrite,
            dry_run,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the lake, classify every file and refresh the snapshot
    Classify {
        /// Replace files that already exist at their destination
        #[arg(long)]
        overwrite: bool,

        /// Classify and write the run tables without copying files
        #[arg(long)]
        dry_run: bool,

        /// Output the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Consolidate each labeled schema into processed/
    Process {
        /// Output the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show header detection and schema identity for one file
    Inspect {
        /// Path to a workbook or delimited file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
