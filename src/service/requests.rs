use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::error::ErrorKind;
use tracing::info;

use super::{required_text, violated_constraint};
use crate::db::{
    Database, Decision, NewTimeOffRequest, RequestFilter, RequestStatus, StatusUpdate,
    TimeOffRequest, TimeOffRequestView,
};
use crate::error::TimeOffError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inbound submission. Fields are optional so missing values surface as
/// `InvalidInput` instead of a deserialization failure; any `status` the
/// caller sends is not read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestSubmission {
    pub employee_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub reason: Option<String>,
    pub manager_id: Option<i64>,
}

impl RequestSubmission {
    fn validate(&self) -> Result<NewTimeOffRequest, TimeOffError> {
        let employee_name = required_text("employee_name", self.employee_name.as_deref())?;
        let start_date = parse_date("start_date", self.start_date.as_deref())?;
        let end_date = parse_date("end_date", self.end_date.as_deref())?;
        if end_date < start_date {
            return Err(TimeOffError::invalid_input(
                "end_date must not be before start_date",
            ));
        }
        let manager_id = self
            .manager_id
            .ok_or_else(|| TimeOffError::invalid_input("manager_id is required"))?;
        let reason = self
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(NewTimeOffRequest {
            employee_name,
            start_date,
            end_date,
            reason,
            manager_id,
        })
    }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<NaiveDate, TimeOffError> {
    let raw = required_text(field, value)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|_| TimeOffError::invalid_input(format!("{field} must be a YYYY-MM-DD date")))
}

/// Query-string filters for listing requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestQuery {
    pub manager_id: Option<i64>,
    pub status: Option<String>,
}

impl TryFrom<RequestQuery> for RequestFilter {
    type Error = TimeOffError;

    fn try_from(q: RequestQuery) -> Result<Self, Self::Error> {
        Ok(RequestFilter {
            manager_id: q.manager_id,
            status: parse_status_filter(q.status.as_deref())?,
        })
    }
}

/// Query-string filter for one manager's requests. The manager comes from
/// the path, so any other parameter is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManagerRequestQuery {
    pub status: Option<String>,
}

impl ManagerRequestQuery {
    pub fn status(&self) -> Result<Option<RequestStatus>, TimeOffError> {
        parse_status_filter(self.status.as_deref())
    }
}

fn parse_status_filter(value: Option<&str>) -> Result<Option<RequestStatus>, TimeOffError> {
    value
        .map(str::parse::<RequestStatus>)
        .transpose()
        .map_err(|e| TimeOffError::invalid_input(e.to_string()))
}

/// Request lifecycle: submission, the one-way status decision, reads and deletion.
#[derive(Clone)]
pub struct RequestService {
    db: Database,
}

impl RequestService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a request. The stored status is always `pending`.
    pub async fn submit_request(
        &self,
        submission: &RequestSubmission,
    ) -> Result<TimeOffRequest, TimeOffError> {
        let new = submission.validate()?;
        let mut session = self.db.session().await?;
        let created = session
            .insert_request(&new)
            .await
            .map_err(|e| match violated_constraint(&e) {
                Some(ErrorKind::ForeignKeyViolation) => TimeOffError::manager_not_found(new.manager_id),
                Some(ErrorKind::CheckViolation) | Some(ErrorKind::NotNullViolation) => {
                    TimeOffError::invalid_input("request violates a storage constraint")
                }
                _ => e,
            })?;
        info!(
            request_id = created.id,
            manager_id = created.manager_id,
            "time-off request submitted"
        );
        Ok(created)
    }

    /// Approve or deny a pending request. Fails with `InvalidState` once decided.
    pub async fn decide_request(
        &self,
        request_id: i64,
        decision: Decision,
    ) -> Result<TimeOffRequest, TimeOffError> {
        let status = RequestStatus::from(decision);
        let mut session = self.db.session().await?;
        match session.decide_request(request_id, status).await? {
            StatusUpdate::Updated(request) => {
                info!(request_id, status = %request.status, "time-off request decided");
                Ok(request)
            }
            StatusUpdate::AlreadyDecided(current) => Err(TimeOffError::InvalidState(format!(
                "request {request_id} is already {current}"
            ))),
            StatusUpdate::Missing => Err(TimeOffError::request_not_found(request_id)),
        }
    }

    /// All matching requests ordered by `start_date`, ties broken by `id`.
    pub async fn list_requests(
        &self,
        filter: RequestFilter,
    ) -> Result<Vec<TimeOffRequestView>, TimeOffError> {
        let mut session = self.db.session().await?;
        session.list_requests(filter).await
    }

    /// Requests owned by one manager; `NotFound` if the manager does not exist.
    pub async fn list_manager_requests(
        &self,
        manager_id: i64,
        status: Option<RequestStatus>,
    ) -> Result<Vec<TimeOffRequestView>, TimeOffError> {
        let mut session = self.db.session().await?;
        if session.manager_by_id(manager_id).await?.is_none() {
            return Err(TimeOffError::manager_not_found(manager_id));
        }
        session
            .list_requests(RequestFilter {
                manager_id: Some(manager_id),
                status,
            })
            .await
    }

    pub async fn get_request(&self, request_id: i64) -> Result<TimeOffRequestView, TimeOffError> {
        let mut session = self.db.session().await?;
        session
            .request_by_id(request_id)
            .await?
            .ok_or_else(|| TimeOffError::request_not_found(request_id))
    }

    pub async fn delete_request(&self, request_id: i64) -> Result<(), TimeOffError> {
        let mut session = self.db.session().await?;
        if !session.delete_request(request_id).await? {
            return Err(TimeOffError::request_not_found(request_id));
        }
        info!(request_id, "time-off request deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{new_manager, test_db};

    fn submission(employee: &str, start: &str, end: &str, manager_id: i64) -> RequestSubmission {
        RequestSubmission {
            employee_name: Some(employee.to_string()),
            start_date: Some(start.to_string()),
            end_date: Some(end.to_string()),
            reason: Some("Vacation".to_string()),
            manager_id: Some(manager_id),
        }
    }

    async fn service_with_manager() -> (tempfile::TempDir, RequestService, i64) {
        let (dir, db) = test_db().await;
        let mut s = db.session().await.unwrap();
        let m = s
            .insert_manager(&new_manager("John Manager", "john@company.com"))
            .await
            .unwrap();
        (dir, RequestService::new(db), m.id)
    }

    #[tokio::test]
    async fn submit_then_decide_exactly_once() {
        let (_dir, svc, manager_id) = service_with_manager().await;
        let created = svc
            .submit_request(&submission("Alice Smith", "2025-09-25", "2025-09-27", manager_id))
            .await
            .unwrap();
        assert_eq!(created.status, RequestStatus::Pending);

        let decided = svc
            .decide_request(created.id, Decision::Approved)
            .await
            .unwrap();
        assert_eq!(decided.status, RequestStatus::Approved);
        assert_eq!(decided.id, created.id);

        for decision in [Decision::Approved, Decision::Denied] {
            let err = svc.decide_request(created.id, decision).await.unwrap_err();
            assert!(matches!(err, TimeOffError::InvalidState(_)), "{err:?}");
        }
        let stored = svc.get_request(created.id).await.unwrap();
        assert_eq!(stored.request.status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn unknown_manager_is_not_found_and_writes_nothing() {
        let (_dir, svc, _) = service_with_manager().await;
        let err = svc
            .submit_request(&submission("Alice Smith", "2025-09-25", "2025-09-27", 999))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TimeOffError::NotFound { resource: "manager", id: 999 }
        ));
        assert!(svc.list_requests(RequestFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn end_before_start_is_invalid_input() {
        let (_dir, svc, manager_id) = service_with_manager().await;
        let err = svc
            .submit_request(&submission("Alice Smith", "2025-09-25", "2025-09-20", manager_id))
            .await
            .unwrap_err();
        assert!(matches!(err, TimeOffError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn missing_or_malformed_fields_are_invalid_input() {
        let (_dir, svc, manager_id) = service_with_manager().await;
        let cases = [
            RequestSubmission {
                employee_name: Some("   ".into()),
                ..submission("", "2025-09-25", "2025-09-27", manager_id)
            },
            RequestSubmission {
                start_date: None,
                ..submission("Alice Smith", "", "2025-09-27", manager_id)
            },
            submission("Alice Smith", "25/09/2025", "2025-09-27", manager_id),
            submission("Alice Smith", "2025-09-25", "2025-02-30", manager_id),
            RequestSubmission {
                manager_id: None,
                ..submission("Alice Smith", "2025-09-25", "2025-09-27", manager_id)
            },
        ];
        for case in cases {
            let err = svc.submit_request(&case).await.unwrap_err();
            assert!(matches!(err, TimeOffError::InvalidInput(_)), "{case:?} -> {err:?}");
        }
    }

    #[tokio::test]
    async fn single_day_request_and_blank_reason() {
        let (_dir, svc, manager_id) = service_with_manager().await;
        let created = svc
            .submit_request(&RequestSubmission {
                reason: Some("  ".into()),
                ..submission("Carol Davis", "2025-10-15", "2025-10-15", manager_id)
            })
            .await
            .unwrap();
        assert_eq!(created.start_date, created.end_date);
        assert_eq!(created.reason, None);
    }

    #[tokio::test]
    async fn deciding_unknown_request_is_not_found() {
        let (_dir, svc, _) = service_with_manager().await;
        let err = svc.decide_request(77, Decision::Denied).await.unwrap_err();
        assert!(matches!(err, TimeOffError::NotFound { id: 77, .. }));
    }

    #[tokio::test]
    async fn manager_listing_requires_existing_manager() {
        let (_dir, svc, manager_id) = service_with_manager().await;
        let a = svc
            .submit_request(&submission("Alice Smith", "2025-09-25", "2025-09-27", manager_id))
            .await
            .unwrap();
        svc.submit_request(&submission("Carol Davis", "2025-10-15", "2025-10-15", manager_id))
            .await
            .unwrap();
        svc.decide_request(a.id, Decision::Denied).await.unwrap();

        let pending = svc
            .list_manager_requests(manager_id, Some(RequestStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].request.employee_name, "Carol Davis");

        let err = svc.list_manager_requests(999, None).await.unwrap_err();
        assert!(matches!(err, TimeOffError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_request_removes_row_once() {
        let (_dir, svc, manager_id) = service_with_manager().await;
        let a = svc
            .submit_request(&submission("Alice Smith", "2025-09-25", "2025-09-27", manager_id))
            .await
            .unwrap();
        svc.delete_request(a.id).await.unwrap();
        assert!(matches!(
            svc.get_request(a.id).await.unwrap_err(),
            TimeOffError::NotFound { .. }
        ));
        assert!(matches!(
            svc.delete_request(a.id).await.unwrap_err(),
            TimeOffError::NotFound { .. }
        ));
    }

    #[test]
    fn query_rejects_unknown_status() {
        let q = RequestQuery {
            manager_id: Some(1),
            status: Some("archived".into()),
        };
        assert!(matches!(
            RequestFilter::try_from(q),
            Err(TimeOffError::InvalidInput(_))
        ));
        let ok = RequestFilter::try_from(RequestQuery {
            manager_id: None,
            status: Some("denied".into()),
        })
        .unwrap();
        assert_eq!(ok.status, Some(RequestStatus::Denied));
    }

    #[test]
    fn manager_query_accepts_only_status() {
        let q = ManagerRequestQuery {
            status: Some("approved".into()),
        };
        assert_eq!(q.status().unwrap(), Some(RequestStatus::Approved));
        assert_eq!(ManagerRequestQuery::default().status().unwrap(), None);
        assert!(matches!(
            ManagerRequestQuery {
                status: Some("archived".into())
            }
            .status(),
            Err(TimeOffError::InvalidInput(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_decisions_have_one_winner() {
        let (_dir, svc, manager_id) = service_with_manager().await;
        let created = svc
            .submit_request(&submission("Alice Smith", "2025-09-25", "2025-09-27", manager_id))
            .await
            .unwrap();
        let id = created.id;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let svc = svc.clone();
                let decision = if i % 2 == 0 {
                    Decision::Approved
                } else {
                    Decision::Denied
                };
                tokio::spawn(async move { svc.decide_request(id, decision).await })
            })
            .collect();

        let mut winners = Vec::new();
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(request) => winners.push(request),
                Err(TimeOffError::InvalidState(_)) => rejected += 1,
                Err(other) => panic!("unexpected decide error: {other:?}"),
            }
        }
        assert_eq!(winners.len(), 1);
        assert_eq!(rejected, 7);

        let stored = svc.get_request(id).await.unwrap();
        assert_eq!(stored.request.status, winners[0].status);
        assert_ne!(stored.request.status, RequestStatus::Pending);
    }
}
