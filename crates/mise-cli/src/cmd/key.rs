use super::{dispatch, Invocation};
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use mise_server::protocol::Command;
use std::io::BufRead;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand definition
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum KeySubcommand {
    /// Store the OpenAI API key
    Set {
        /// The key (read from stdin when omitted)
        key: Option<String>,
    },
    /// Show whether a key is stored (masked)
    Status,
    /// Remove the stored key
    Clear,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: KeySubcommand, json: bool) -> Result<()> {
    let how = Invocation {
        json,
        ..Invocation::default()
    };
    let command = match subcmd {
        KeySubcommand::Set { key } => {
            let api_key = match key {
                Some(k) => k,
                None => read_key_from_stdin()?,
            };
            Command::SaveApiKey { api_key }
        }
        KeySubcommand::Status => Command::GetApiKey,
        KeySubcommand::Clear => Command::ClearApiKey,
    };
    dispatch(root, command, how)?;
    Ok(())
}

fn read_key_from_stdin() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read API key from stdin")?;
    let key = line.trim().to_string();
    if key.is_empty() {
        bail!("no API key given on the command line or stdin");
    }
    Ok(key)
}
