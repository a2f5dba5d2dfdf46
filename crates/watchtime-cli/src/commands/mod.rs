//! CLI command definitions and dispatch.

pub mod limit;
pub mod migrate;
pub mod quota;
pub mod token;

use clap::{Parser, Subcommand};

use watchtime_api::{AppState, Backends};
use watchtime_auth::Role;
use watchtime_core::AppError;
use watchtime_core::config::AppConfig;
use watchtime_core::types::UserId;
use watchtime_service::RequestContext;

use crate::output::{self, OutputFormat};

/// Watchtime: playback quota administration
#[derive(Debug, Parser)]
#[command(name = "watchtime", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// User id recorded as the acting admin in logs
    #[arg(long, default_value_t = 1)]
    pub operator: u64,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply catalog database migrations
    Migrate,
    /// Show a user's global watch time
    Status(quota::IdentifierArgs),
    /// Reset a user's watch time
    Reset(quota::IdentifierArgs),
    /// Reset watch time for a course
    ResetCourse(quota::ResetCourseArgs),
    /// List per-content watch records
    Records(quota::RecordsArgs),
    /// List courses
    Courses,
    /// Manage watch limits
    Limit(limit::LimitArgs),
    /// Mint a bearer token
    Token(token::TokenArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load_from(&self.config)?;

        match &self.command {
            Commands::Migrate => migrate::execute(&config).await,
            Commands::Token(args) => token::execute(args, &config),
            Commands::Status(args) => quota::status(args, &self.session(config).await?, self.format).await,
            Commands::Reset(args) => quota::reset(args, &self.session(config).await?, self.format).await,
            Commands::ResetCourse(args) => {
                quota::reset_course(args, &self.session(config).await?, self.format).await
            }
            Commands::Records(args) => {
                quota::records(args, &self.session(config).await?, self.format).await
            }
            Commands::Courses => quota::courses(&self.session(config).await?, self.format).await,
            Commands::Limit(args) => limit::execute(args, &self.session(config).await?, self.format).await,
        }
    }

    async fn session(&self, config: AppConfig) -> Result<Session, AppError> {
        if config.store.provider == "memory" {
            output::print_warning(
                "Quota store provider is 'memory'; this process sees an empty store.",
            );
        }
        let operator = UserId::new(self.operator)
            .ok_or_else(|| AppError::validation("Operator id must be positive"))?;

        let backends = Backends::connect(&config).await?;
        Ok(Session {
            state: AppState::from_backends(config, backends),
            operator: RequestContext::new(operator, Role::Admin),
        })
    }
}

/// Connected services plus the acting admin.
pub struct Session {
    /// Services wired over the configured backends.
    pub state: AppState,
    /// Admin context used for every call.
    pub operator: RequestContext,
}
