use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagecraft_editor::EditorConfig;
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Base URL printed in front of share codes
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Undo levels kept per session
    #[arg(long)]
    pub history_depth: Option<usize>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = Config::path(cwd);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!(
        "{}",
        "📝 Initializing Pagecraft project...".bright_blue().bold()
    );

    let mut editor = EditorConfig::default();
    if let Some(depth) = args.history_depth {
        editor.history_depth = depth;
    }

    let config = Config {
        editor,
        base_url: args.base_url,
    };

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Export a page as JSON from the editor");
    println!("  2. Run: pagecraft share page.json");
    println!("  3. Open the link with: pagecraft inspect <link>");

    Ok(())
}
