//! Initialize data directory command.

use super::store::{self, ChainConfig};
use anyhow::{bail, Context, Result};
use authseal_consensus::BlockProposer;
use authseal_core::{Hash, Keypair};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct InitArgs {
    /// Directory to store keys and configuration
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Number of authorities to generate
    #[arg(short, long, default_value = "1")]
    authorities: usize,

    /// Block time in seconds
    #[arg(short, long, default_value = "5")]
    block_time: u64,
}

pub fn run(args: InitArgs) -> Result<()> {
    if args.authorities == 0 {
        bail!("At least one authority is required");
    }

    println!("{}", "Initializing authseal...".bold().cyan());
    println!();

    fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", args.data_dir))?;
    println!("{}  Created data directory", "✓".green().bold());

    println!();
    println!("{}", "Generating authorities...".bold());

    let keypairs: Vec<Keypair> = (0..args.authorities).map(|_| Keypair::generate()).collect();
    for (i, keypair) in keypairs.iter().enumerate() {
        println!(
            "  Authority {}: {}",
            i + 1,
            keypair.address().to_hex().bright_yellow()
        );
    }

    for (i, keypair) in keypairs.iter().enumerate() {
        let key_file = store::save_keypair(&args.data_dir, &format!("authority_{}", i), keypair)?;
        println!(
            "{}  Saved authority {} keypair to: {}",
            "✓".green().bold(),
            i + 1,
            key_file.display().to_string().bright_black()
        );
    }

    let config = ChainConfig::new(
        keypairs.iter().map(|kp| kp.public_key.clone()).collect(),
        args.block_time,
    );
    let config_file = store::save_config(&args.data_dir, &config)?;
    println!(
        "{}  Saved config to: {}",
        "✓".green().bold(),
        config_file.display().to_string().bright_black()
    );

    // The first authority owns height 0.
    let mut keypairs = keypairs.into_iter();
    let genesis_authority = keypairs.next().context("No authorities generated")?;
    let proposer = BlockProposer::new(genesis_authority, config.consensus.clone());
    let genesis = proposer
        .propose_header(0, Hash::ZERO, Hash::ZERO, Hash::ZERO)
        .context("Failed to sign genesis header")?;

    let genesis_file = args.data_dir.join("genesis.json");
    store::write_header(&genesis_file, &genesis)?;

    println!();
    println!("{}  Signed genesis header", "✓".green().bold());
    println!("    Hash: {}", genesis.hash().to_hex().bright_yellow());
    println!(
        "    File: {}",
        genesis_file.display().to_string().bright_black()
    );

    println!();
    println!("{}", "Initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  • Use {} to check the genesis signature",
        "authseal header verify data/genesis.json".bright_cyan()
    );
    println!(
        "  • Use {} to propose the next header",
        "authseal header new".bright_cyan()
    );

    Ok(())
}
