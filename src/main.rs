use clap::Parser;
use registry_access::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::GenerateKey(args) => cli::keys::generate_key(args),
        Command::IssueToken(args) => cli::keys::issue_token(args),
    }
}
