use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

/// Lifecycle state of a time-off request. Only `Pending` may transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Denied => "denied",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, ThisError)]
#[error("unknown request status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for RequestStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "denied" => Ok(RequestStatus::Denied),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A manager's verdict on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Denied,
}

impl From<Decision> for RequestStatus {
    fn from(d: Decision) -> Self {
        match d {
            Decision::Approved => RequestStatus::Approved,
            Decision::Denied => RequestStatus::Denied,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manager {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeOffRequest {
    pub id: i64,
    pub employee_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub manager_id: i64,
    pub status: RequestStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A request as returned by reads: the row plus its manager's display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeOffRequestView {
    #[serde(flatten)]
    pub request: TimeOffRequest,
    pub manager_name: String,
}

/// Validated fields for a manager insert.
#[derive(Debug, Clone)]
pub struct NewManager {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial manager update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ManagerChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl ManagerChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password_hash.is_none()
    }
}

/// Validated fields for a request insert. Status is not settable here.
#[derive(Debug, Clone)]
pub struct NewTimeOffRequest {
    pub employee_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub manager_id: i64,
}

/// Optional filters for listing requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFilter {
    pub manager_id: Option<i64>,
    pub status: Option<RequestStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("approved".parse::<RequestStatus>().unwrap(), RequestStatus::Approved);
        assert!("Approved".parse::<RequestStatus>().is_err());
        assert!("cancelled".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn view_serializes_flat_without_password() {
        let ts = NaiveDate::from_ymd_opt(2025, 9, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let view = TimeOffRequestView {
            request: TimeOffRequest {
                id: 1,
                employee_name: "Alice Smith".into(),
                start_date: NaiveDate::from_ymd_opt(2025, 9, 25).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 9, 27).unwrap(),
                reason: Some("Vacation".into()),
                manager_id: 1,
                status: RequestStatus::Pending,
                created_at: ts,
                updated_at: ts,
            },
            manager_name: "John Manager".into(),
        };
        let v = serde_json::to_value(&view).unwrap();
        assert_eq!(v["status"], "pending");
        assert_eq!(v["start_date"], "2025-09-25");
        assert_eq!(v["manager_name"], "John Manager");

        let manager = Manager {
            id: 1,
            name: "John Manager".into(),
            email: "john.manager@company.com".into(),
            password_hash: "secret".into(),
            created_at: ts,
            updated_at: ts,
        };
        let v = serde_json::to_value(&manager).unwrap();
        assert!(v.get("password_hash").is_none());
    }
}
