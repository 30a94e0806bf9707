//! Development sample rows, inserted on boot when `SEED_SAMPLE_DATA` is set.

use chrono::NaiveDate;
use tracing::info;

use crate::db::models::{NewManager, NewTimeOffRequest};
use crate::db::sqlite::Database;
use crate::error::TimeOffError;

/// bcrypt hash of `admin123`, shared by the sample managers.
pub const SAMPLE_PASSWORD_HASH: &str =
    "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewdBPWfQKRE8TIaG";

fn date(raw: &str) -> Result<NaiveDate, TimeOffError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| TimeOffError::Config(format!("sample date {raw}: {e}")))
}

fn manager(name: &str, email: &str) -> NewManager {
    NewManager {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: SAMPLE_PASSWORD_HASH.to_string(),
    }
}

fn request(
    employee: &str,
    start: &str,
    end: &str,
    reason: &str,
) -> Result<NewTimeOffRequest, TimeOffError> {
    Ok(NewTimeOffRequest {
        employee_name: employee.to_string(),
        start_date: date(start)?,
        end_date: date(end)?,
        reason: Some(reason.to_string()),
        // replaced with the owner's id on insert
        manager_id: 0,
    })
}

pub fn sample_data() -> Result<Vec<(NewManager, Vec<NewTimeOffRequest>)>, TimeOffError> {
    Ok(vec![
        (
            manager("John Manager", "john.manager@company.com"),
            vec![
                request("Alice Smith", "2025-09-25", "2025-09-27", "Vacation")?,
                request("Carol Davis", "2025-10-15", "2025-10-15", "Medical appointment")?,
            ],
        ),
        (
            manager("Sarah Supervisor", "sarah.supervisor@company.com"),
            vec![request("Bob Johnson", "2025-10-01", "2025-10-03", "Personal time")?],
        ),
    ])
}

/// Insert [`sample_data`] unless a manager already exists. Returns whether rows were written.
pub async fn seed_if_empty(db: &Database) -> Result<bool, TimeOffError> {
    let mut session = db.session().await?;
    if session.count_managers().await? > 0 {
        info!("store already populated; skipping sample data");
        return Ok(false);
    }
    let (managers, requests) = session.insert_batch(&sample_data()?).await?;
    info!(managers, requests, "inserted sample data");
    Ok(true)
}
