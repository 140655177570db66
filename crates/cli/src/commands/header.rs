//! Header operations command.

use super::store;
use anyhow::{bail, Context, Result};
use authseal_consensus::{BlockProposer, HeaderSignatureValidator};
use authseal_core::{BlockHeader, Hash, PublicKey};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct HeaderArgs {
    #[command(subcommand)]
    command: HeaderCommand,
}

#[derive(Subcommand)]
enum HeaderCommand {
    /// Propose and sign a new header (authority only, on its turn)
    New {
        /// Directory to store keys and configuration
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Authority name (keypair file without .json extension)
        #[arg(short, long)]
        authority: String,

        /// Block height
        #[arg(long)]
        height: u64,

        /// Previous block hash (hex), zero if omitted
        #[arg(long)]
        prev_hash: Option<String>,

        /// Payload root (hex), zero if omitted
        #[arg(long)]
        payload_root: Option<String>,

        /// State root (hex), zero if omitted
        #[arg(long)]
        state_root: Option<String>,

        /// Output file for the signed header
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Sign an existing header file in place
    Sign {
        /// Directory to store keys and configuration
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Keypair name (without .json extension)
        #[arg(short, long)]
        key: String,

        /// Header file (JSON)
        file: PathBuf,
    },
    /// Verify the signature attached to a header file
    Verify {
        /// Directory to store keys and configuration
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Verify against this public key (hex) instead of the configured author key
        #[arg(short, long)]
        public_key: Option<String>,

        /// Header file (JSON)
        file: PathBuf,
    },
    /// Show header fields and signing hash
    Show {
        /// Header file (JSON)
        file: PathBuf,
    },
}

pub fn run(args: HeaderArgs) -> Result<()> {
    match args.command {
        HeaderCommand::New {
            data_dir,
            authority,
            height,
            prev_hash,
            payload_root,
            state_root,
            out,
        } => new_header(
            &data_dir,
            &authority,
            height,
            [
                parse_hash(prev_hash)?,
                parse_hash(payload_root)?,
                parse_hash(state_root)?,
            ],
            &out,
        ),
        HeaderCommand::Sign {
            data_dir,
            key,
            file,
        } => sign_header(&data_dir, &key, &file),
        HeaderCommand::Verify {
            data_dir,
            public_key,
            file,
        } => verify_header(&data_dir, public_key.as_deref(), &file),
        HeaderCommand::Show { file } => show_header(&file),
    }
}

fn parse_hash(value: Option<String>) -> Result<Hash> {
    match value {
        Some(hex) => Hash::from_hex(&hex).with_context(|| format!("Invalid hash: {}", hex)),
        None => Ok(Hash::ZERO),
    }
}

/// `[prev_hash, payload_root, state_root]`
type HeaderLinks = [Hash; 3];

fn new_header(
    data_dir: &Path,
    authority_name: &str,
    height: u64,
    links: HeaderLinks,
    out: &Path,
) -> Result<()> {
    let keypair = store::load_keypair(data_dir, authority_name)?;
    let config = store::load_config(data_dir)?;
    let author = keypair.address();

    let proposer = BlockProposer::new(keypair, config.consensus);
    let [prev_hash, payload_root, state_root] = links;
    let header = proposer
        .propose_header(height, prev_hash, payload_root, state_root)
        .with_context(|| format!("Authority {} cannot propose height {}", author, height))?;

    store::write_header(out, &header)?;

    println!("{}  Header signed", "✓".green().bold());
    println!("    Hash:   {}", header.hash().to_hex().bright_yellow());
    println!("    Height: {}", height.to_string().bright_cyan());
    println!("    File:   {}", out.display().to_string().bright_black());

    Ok(())
}

fn sign_header(data_dir: &Path, key_name: &str, file: &Path) -> Result<()> {
    let keypair = store::load_keypair(data_dir, key_name)?;
    let mut header = store::read_header(file)?;

    if header.author != keypair.address() {
        bail!(
            "Key {} does not match header author {}",
            keypair.address(),
            header.author
        );
    }

    HeaderSignatureValidator::new().sign(&keypair, &mut header)?;
    store::write_header(file, &header)?;

    println!("{}  Header signed", "✓".green().bold());
    println!("    Hash: {}", header.hash().to_hex().bright_yellow());

    Ok(())
}

fn verify_header(data_dir: &Path, public_key: Option<&str>, file: &Path) -> Result<()> {
    let header = store::read_header(file)?;
    let public_key = resolve_public_key(data_dir, public_key, &header)?;

    let validator = HeaderSignatureValidator::new();
    match validator.check_signature(&public_key, &header) {
        Ok(()) => {
            println!("{}  Signature valid", "✓".green().bold());
            println!("    Hash:   {}", header.hash().to_hex().bright_yellow());
            println!("    Author: {}", header.author.to_hex().bright_yellow());
            Ok(())
        }
        Err(reason) => {
            println!("{}  Signature rejected [{}]", "✗".red().bold(), reason.tag());
            bail!("{}", reason)
        }
    }
}

/// Use the explicit key if given, otherwise the registered key of the
/// authority whose turn it is at the header's height.
fn resolve_public_key(
    data_dir: &Path,
    explicit: Option<&str>,
    header: &BlockHeader,
) -> Result<PublicKey> {
    if let Some(hex) = explicit {
        return PublicKey::from_hex(hex).context("Invalid public key");
    }

    let authority = store::load_config(data_dir)?.authority();
    authority
        .verify_header_authority(header)
        .context("Header author is not the scheduled authority")?;

    authority
        .get_public_key(&header.author)
        .cloned()
        .with_context(|| format!("No public key registered for {}", header.author))
}

fn show_header(file: &Path) -> Result<()> {
    let header = store::read_header(file)?;

    println!();
    println!("{}", "Header Information:".bold().cyan());
    println!();
    println!("  Height:       {}", header.height.to_string().bright_cyan());
    println!("  Hash:         {}", header.hash().to_hex().bright_yellow());
    println!("  Timestamp:    {}", header.timestamp);
    println!("  Prev Hash:    {}", header.prev_hash.to_hex().bright_black());
    println!("  Payload Root: {}", header.payload_root.to_hex().bright_black());
    println!("  State Root:   {}", header.state_root.to_hex().bright_black());
    println!("  Author:       {}", header.author.to_hex().bright_yellow());
    match &header.signature {
        Some(sig) if !sig.is_empty() => {
            println!("  Signature:    {}", sig.to_hex().bright_black())
        }
        _ => println!("  Signature:    {}", "none".yellow()),
    }
    println!();

    Ok(())
}
