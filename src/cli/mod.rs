//! Command line interface
//!
//! - `serve`: run the HTTP API
//! - `generate-key`: print a fresh API key secret with its prefix and hash
//! - `issue-token`: mint a session token for local use

pub mod keys;
pub mod serve;

use clap::{Parser, Subcommand};

/// Registry access service
#[derive(Parser)]
#[command(name = "registry-access")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve,

    /// Print a freshly generated API key secret
    GenerateKey(keys::GenerateKeyArgs),

    /// Mint a session JWT for a user
    IssueToken(keys::IssueTokenArgs),
}
