use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI for decoding captured reader pages during source development
#[derive(Parser)]
#[command(name = "descramble")]
#[command(about = "Decode obfuscated reader payloads from media sources", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a base64 reader blob to plaintext
    Decode {
        /// File holding the blob; reads stdin when omitted
        input: Option<PathBuf>,
        /// Parse the plaintext and print one page path per line
        #[arg(short, long)]
        pages: bool,
    },
    /// Extract and decode the page list from a saved reader page
    Pages {
        /// Saved HTML (or inline script text) of the reader page
        input: PathBuf,
    },
}
