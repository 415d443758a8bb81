//! Offline credential helpers

use clap::Args;

use crate::config::AppConfig;
use crate::infrastructure::api_key::KeyCredentialFactory;
use crate::infrastructure::auth::{JwtConfig, JwtGenerator, JwtService};

#[derive(Debug, Args)]
pub struct GenerateKeyArgs {
    /// Label the secret starts with; defaults to the configured prefix
    #[arg(long)]
    pub label: Option<String>,
}

#[derive(Debug, Args)]
pub struct IssueTokenArgs {
    /// User id to put in `sub`
    #[arg(long)]
    pub user: String,

    /// Comma separated scopes
    #[arg(long, value_delimiter = ',')]
    pub scopes: Vec<String>,
}

/// Print a fresh secret with the prefix and hash that would be stored for it
pub fn generate_key(args: GenerateKeyArgs) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let label = args.label.unwrap_or(config.auth.api_key_prefix);

    let credential = KeyCredentialFactory::default().generate(&label)?;

    println!("secret:  {}", credential.secret);
    println!("prefix:  {}", credential.display_prefix);
    println!("hash:    {}", credential.hash);
    Ok(())
}

/// Mint a session token signed with the configured secret
pub fn issue_token(args: IssueTokenArgs) -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let secret = config
        .auth
        .jwt_secret
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("JWT_SECRET").ok())
        .ok_or_else(|| anyhow::anyhow!("No JWT secret configured (auth.jwt_secret or JWT_SECRET)"))?;

    let service = JwtService::new(JwtConfig::new(secret, config.auth.jwt_expiration_hours))?;
    crate::domain::scope::validate_all(&args.scopes)?;

    println!("{}", service.generate(&args.user, &args.scopes)?);
    Ok(())
}
