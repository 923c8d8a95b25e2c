mod cli;

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use descramble::reader;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Decode { input, pages } => {
            let blob = read_input(input.as_deref()).context("failed to read blob")?;
            let blob = blob.trim();
            if pages {
                for page in reader::decode_pages(blob)? {
                    println!("{page}");
                }
            } else {
                println!("{}", descramble::decode(blob)?);
            }
        }
        Commands::Pages { input } => {
            let html = fs::read_to_string(&input)
                .with_context(|| format!("failed to read page: {}", input.display()))?;
            let blob = reader::extract_reader_blob(&html)
                .ok_or_else(|| anyhow!("no initReader call found in {}", input.display()))?;
            for page in reader::decode_pages(blob)? {
                println!("{page}");
            }
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}
