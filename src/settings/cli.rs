use super::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Hash a secret with the configured default driver.
    Hash { secret: String },
    /// Check a secret against a stored hash with the default driver.
    Check { secret: String, hash: String },
    /// List registered hash drivers.
    Drivers,
}
