use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "oncohub")]
#[command(about = "Clinical report retrieval and mutation evidence normalisation", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in to the clinical records system and export a patient's diagnostic reports
    LoginAndFetch {
        /// Clinician username for the password grant
        #[arg(short, long)]
        username: String,
        /// FHIR patient id
        #[arg(short, long)]
        patient_id: String,
        /// CSV destination (overwritten); defaults to export.default_path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Normalise an analysis result (JSON) into canonical evidence
    Normalize {
        /// Analysis result file with drivers / resistance / therapies
        analysis: PathBuf,
        /// Emit the canonical evidence set as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration with secrets redacted
    Config,
}
