//! Bearer token minting for operators and test clients.

use clap::Args;

use watchtime_auth::{JwtEncoder, Role};
use watchtime_core::AppError;
use watchtime_core::config::AppConfig;
use watchtime_core::types::UserId;

/// Arguments for the token command
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// User id the token identifies
    pub user: u64,
    /// Issue an admin token
    #[arg(long)]
    pub admin: bool,
}

/// Print a signed token for the user.
pub fn execute(args: &TokenArgs, config: &AppConfig) -> Result<(), AppError> {
    let user =
        UserId::new(args.user).ok_or_else(|| AppError::validation("User id must be positive"))?;
    let role = if args.admin { Role::Admin } else { Role::Viewer };

    let token = JwtEncoder::new(&config.auth).issue(user, role)?;
    println!("{token}");
    Ok(())
}
