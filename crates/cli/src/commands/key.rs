//! Keypair management command.

use super::store;
use anyhow::Result;
use authseal_core::Keypair;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct KeyArgs {
    #[command(subcommand)]
    command: KeyCommand,
}

#[derive(Subcommand)]
enum KeyCommand {
    /// Generate a new secp256k1 keypair
    New {
        /// Directory to store keys and configuration
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Name for the keypair file
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List all keypairs
    List {
        /// Directory to store keys and configuration
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

pub fn run(args: KeyArgs) -> Result<()> {
    match args.command {
        KeyCommand::New { data_dir, name } => new_keypair(data_dir, name),
        KeyCommand::List { data_dir } => list_keypairs(data_dir),
    }
}

fn new_keypair(data_dir: PathBuf, name: Option<String>) -> Result<()> {
    let keypair = Keypair::generate();
    let address = keypair.address();

    println!("{}", "Generated new keypair:".bold().cyan());
    println!();
    println!("  Address:     {}", address.to_hex().bright_yellow());
    println!(
        "  Public Key:  {}",
        hex::encode(keypair.public_key.to_bytes()).bright_black()
    );

    let name = name.unwrap_or_else(|| format!("key_{}", &address.to_hex()[2..10]));
    let key_file = store::save_keypair(&data_dir, &name, &keypair)?;

    println!();
    println!(
        "{}  Saved to: {}",
        "✓".green().bold(),
        key_file.display().to_string().bright_black()
    );
    println!();
    println!("{}", "Keep your private key safe!".yellow().bold());

    Ok(())
}

fn list_keypairs(data_dir: PathBuf) -> Result<()> {
    let keys_dir = store::keys_dir(&data_dir);

    if !keys_dir.exists() {
        println!("{}", "No keypairs found.".yellow());
        println!(
            "Use {} to create a new keypair.",
            "authseal key new".bright_cyan()
        );
        return Ok(());
    }

    println!("{}", "Saved Keypairs:".bold().cyan());
    println!();

    let mut count = 0;
    for entry in fs::read_dir(&keys_dir)? {
        let path = entry?.path();

        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        let contents = fs::read_to_string(&path)?;
        let json: serde_json::Value = serde_json::from_str(&contents)?;

        if let Some(address) = json.get("address").and_then(|v| v.as_str()) {
            count += 1;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!(
                "  {} {}",
                format!("{}:", name).bright_black(),
                address.bright_yellow()
            );
        }
    }

    if count == 0 {
        println!("  {}", "No keypairs found.".yellow());
    }

    println!();
    Ok(())
}
