use crate::commands::extract_code;
use anyhow::{anyhow, Result};
use clap::Args;
use pagecraft_editor::decode;

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Share link or bare share code
    pub link: String,
}

pub fn open(args: OpenArgs) -> Result<()> {
    let code = extract_code(&args.link);
    let components =
        decode(&code).ok_or_else(|| anyhow!("Could not decode share link: {}", args.link))?;

    println!("{}", serde_json::to_string_pretty(&components)?);
    Ok(())
}
