//! Watch time lookup, reset, and report commands.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use watchtime_core::AppError;
use watchtime_core::types::{CourseId, UserId};
use watchtime_service::admin::AdminUserStatus;

use super::Session;
use crate::output::{self, OutputFormat};

/// A user identified by id, login, or email
#[derive(Debug, Args)]
pub struct IdentifierArgs {
    /// User id, login, or email
    pub identifier: String,
}

/// Arguments for the reset-course command
#[derive(Debug, Args)]
pub struct ResetCourseArgs {
    /// Course id
    pub course: u64,
    /// Comma-separated user ids (default: every enrolled user)
    #[arg(long, value_delimiter = ',')]
    pub users: Vec<u64>,
    /// Skip confirmation prompt
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the records command
#[derive(Debug, Args)]
pub struct RecordsArgs {
    /// Restrict to a course
    #[arg(long)]
    pub course: Option<u64>,
    /// Restrict to a user id
    #[arg(long)]
    pub user: Option<u64>,
}

/// Record display row for table output
#[derive(Debug, Serialize, Tabled)]
struct RecordRow {
    user: String,
    email: String,
    course: String,
    lesson: String,
    consumed: String,
}

/// Course display row for table output
#[derive(Debug, Serialize, Tabled)]
struct CourseRow {
    id: u64,
    title: String,
}

/// Show a user's global snapshot.
pub async fn status(
    args: &IdentifierArgs,
    session: &Session,
    format: OutputFormat,
) -> Result<(), AppError> {
    let status = session
        .state
        .admin_service
        .user_status(&session.operator, &args.identifier)
        .await?;
    print_status(&status, format);
    Ok(())
}

/// Reset a user's ledgers.
pub async fn reset(
    args: &IdentifierArgs,
    session: &Session,
    format: OutputFormat,
) -> Result<(), AppError> {
    let status = session
        .state
        .admin_service
        .reset_user(&session.operator, &args.identifier)
        .await?;
    output::print_success(&format!("Watch time reset for '{}'", status.user.user_login));
    print_status(&status, format);
    Ok(())
}

/// Reset a course after confirmation.
pub async fn reset_course(
    args: &ResetCourseArgs,
    session: &Session,
    format: OutputFormat,
) -> Result<(), AppError> {
    if !args.force {
        let scope = if args.users.is_empty() {
            "every enrolled user".to_string()
        } else {
            format!("{} user(s)", args.users.len())
        };
        let confirm = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Reset course {} watch time for {scope}?",
                args.course
            ))
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let result = session
        .state
        .admin_service
        .reset_course(&session.operator, args.course, &args.users)
        .await?;

    match format {
        OutputFormat::Table => output::print_success(&result.message),
        OutputFormat::Json => output::print_json(&result),
    }
    Ok(())
}

/// List per-content watch records.
pub async fn records(
    args: &RecordsArgs,
    session: &Session,
    format: OutputFormat,
) -> Result<(), AppError> {
    let records = session
        .state
        .admin_service
        .records(
            &session.operator,
            args.user.and_then(UserId::new),
            args.course.and_then(CourseId::new),
        )
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&records),
        OutputFormat::Table => {
            let rows: Vec<RecordRow> = records
                .into_iter()
                .map(|r| RecordRow {
                    user: r.user_name,
                    email: r.user_email,
                    course: r.course_title,
                    lesson: r.lesson_title,
                    consumed: r.visualized,
                })
                .collect();
            output::print_list(&rows, format);
        }
    }
    Ok(())
}

/// List courses.
pub async fn courses(session: &Session, format: OutputFormat) -> Result<(), AppError> {
    let rows: Vec<CourseRow> = session
        .state
        .admin_service
        .list_courses(&session.operator)
        .await?
        .into_iter()
        .map(|c| CourseRow {
            id: c.id.get(),
            title: c.title,
        })
        .collect();
    output::print_list(&rows, format);
    Ok(())
}

pub(crate) fn print_status(status: &AdminUserStatus, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(status),
        OutputFormat::Table => {
            let watch = &status.watch;
            output::print_kv("User", &format!("{} ({})", status.user.display_name, status.user.id));
            output::print_kv("Login", &status.user.user_login);
            output::print_kv("Email", &status.user.user_email);
            output::print_kv("Enforced", &watch.enforced.to_string());
            output::print_kv("Limit (s)", &watch.limit_seconds.to_string());
            output::print_kv("Consumed (s)", &watch.consumed_seconds.to_string());
            output::print_kv("Remaining (s)", &watch.remaining_seconds.to_string());
        }
    }
}
