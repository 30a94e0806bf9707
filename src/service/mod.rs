//! Business rules over the data-access session.
//!
//! Services own input validation and translate store constraint failures
//! (foreign key, unique, check) into client-facing errors.

pub mod managers;
pub mod requests;

pub use managers::{ManagerRegistration, ManagerService, ManagerUpdate};
pub use requests::{ManagerRequestQuery, RequestQuery, RequestService, RequestSubmission};

use sqlx::error::ErrorKind;

use crate::error::TimeOffError;

/// The constraint a store error tripped, if it was a constraint violation.
fn violated_constraint(err: &TimeOffError) -> Option<ErrorKind> {
    match err {
        TimeOffError::StoreUnavailable(sqlx::Error::Database(db_err)) => Some(db_err.kind()),
        _ => None,
    }
}

/// Trimmed, non-empty text or an `InvalidInput` naming `field`.
fn required_text(field: &str, value: Option<&str>) -> Result<String, TimeOffError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(TimeOffError::invalid_input(format!("{field} is required"))),
    }
}
