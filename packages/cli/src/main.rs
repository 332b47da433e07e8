mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    init, inspect, open, replay, share, InitArgs, InspectArgs, OpenArgs, ReplayArgs, ShareArgs,
};

/// Pagecraft CLI - share links and scripted edits for Pagecraft documents
#[derive(Parser, Debug)]
#[command(name = "pagecraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log editor activity (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default pagecraft.config.json
    Init(InitArgs),

    /// Encode a JSON component list as a share link
    Share(ShareArgs),

    /// Decode a share link and print its components as JSON
    Open(OpenArgs),

    /// Print the component tree of a share link
    Inspect(InspectArgs),

    /// Run a script of mutations through an editor session
    Replay(ReplayArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "pagecraft_editor=debug,pagecraft=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Share(args) => share(args, &cwd),
            Command::Open(args) => open(args),
            Command::Inspect(args) => inspect(args),
            Command::Replay(args) => replay(args, &cwd),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
