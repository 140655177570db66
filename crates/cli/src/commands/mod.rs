//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;

mod header;
mod init;
mod key;
mod store;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a data directory with a set of authorities
    Init(init::InitArgs),
    /// Keypair management
    Key(key::KeyArgs),
    /// Create, sign and verify block headers
    Header(header::HeaderArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init(args) => init::run(args),
        Commands::Key(args) => key::run(args),
        Commands::Header(args) => header::run(args),
    }
}
