//! Request and response data transfer objects.

pub mod request;
pub mod response;

use validator::Validate;

use watchtime_core::AppError;

/// Runs `validator` rules on a request body.
pub fn validate<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}
