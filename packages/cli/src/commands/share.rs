use crate::commands::link_for;
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pagecraft_editor::{encode, Document, PlacedComponent};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ShareArgs {
    /// JSON file holding an array of placed components
    pub input: PathBuf,

    /// Print a full link under this URL instead of the bare code
    #[arg(short, long)]
    pub base_url: Option<String>,
}

pub fn share(args: ShareArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;

    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("Cannot read {}", args.input.display()))?;
    let components: Vec<PlacedComponent> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a component list", args.input.display()))?;

    // Refuse to share something the editor could not open
    let document = Document::from_components("cli", components)?;
    let code = encode(&document.to_components())?;

    eprintln!(
        "{} {} components ({} chars)",
        "✓".green(),
        document.len(),
        code.len()
    );

    match args.base_url.or(config.base_url) {
        Some(base_url) => println!("{}", link_for(&base_url, &code)),
        None => println!("{}", code),
    }

    Ok(())
}
