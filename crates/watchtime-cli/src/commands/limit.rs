//! Limit management commands.

use clap::{Args, Subcommand};

use watchtime_core::AppError;
use watchtime_core::types::{PostId, UserId};

use super::Session;
use super::quota::print_status;
use crate::output::{self, OutputFormat};

/// Arguments for limit commands
#[derive(Debug, Args)]
pub struct LimitArgs {
    /// Limit subcommand
    #[command(subcommand)]
    pub command: LimitCommand,
}

/// Limit subcommands
#[derive(Debug, Subcommand)]
pub enum LimitCommand {
    /// Set the default limit in minutes (0 = unlimited)
    Default {
        /// Minutes
        #[arg(allow_negative_numbers = true)]
        minutes: i64,
    },
    /// Set or clear a per-user limit
    User {
        /// User id
        id: u64,
        /// Seconds; omit or 0 to clear
        seconds: Option<u64>,
    },
    /// Set or clear a per-content limit
    Content {
        /// Post id
        post: u64,
        /// Minutes; omit or 0 to clear
        minutes: Option<u32>,
    },
}

/// Execute limit commands
pub async fn execute(
    args: &LimitArgs,
    session: &Session,
    format: OutputFormat,
) -> Result<(), AppError> {
    let admin = &session.state.admin_service;

    match &args.command {
        LimitCommand::Default { minutes } => {
            let updated = admin.set_default_limit(&session.operator, *minutes).await?;
            match format {
                OutputFormat::Table => output::print_success(&format!(
                    "{} ({} minutes)",
                    updated.message, updated.minutes
                )),
                OutputFormat::Json => output::print_json(&updated),
            }
        }
        LimitCommand::User { id, seconds } => {
            let user =
                UserId::new(*id).ok_or_else(|| AppError::validation("User id must be positive"))?;
            let status = admin
                .set_user_limit(&session.operator, user, *seconds)
                .await?;
            print_status(&status, format);
        }
        LimitCommand::Content { post, minutes } => {
            let post =
                PostId::new(*post).ok_or_else(|| AppError::validation("Post id must be positive"))?;
            let limit = admin
                .set_content_limit(&session.operator, post, *minutes)
                .await?;
            match format {
                OutputFormat::Table => output::print_success(&format!(
                    "Post {} limit set to {} minutes",
                    limit.post_id, limit.minutes
                )),
                OutputFormat::Json => output::print_json(&limit),
            }
        }
    }

    Ok(())
}
