use crate::db::models::{
    Manager, ManagerChanges, NewManager, NewTimeOffRequest, RequestFilter, RequestStatus,
    TimeOffRequest, TimeOffRequestView,
};
use crate::db::schema;
use crate::error::TimeOffError;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Connection, Pool, Row, Sqlite, SqliteConnection};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

pub type SqlitePool = Pool<Sqlite>;

const MANAGER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

const REQUEST_COLUMNS: &str =
    "id, employee_name, start_date, end_date, reason, manager_id, status, created_at, updated_at";

const REQUEST_VIEW_SELECT: &str = r#"
    SELECT r.id, r.employee_name, r.start_date, r.end_date, r.reason, r.manager_id,
           r.status, r.created_at, r.updated_at, m.name AS manager_name
    FROM time_off_requests r
    JOIN managers m ON m.id = r.manager_id
"#;

/// Connection settings handed to [`Database::init`].
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

/// Outcome of a conditional `pending -> decided` update.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    Updated(TimeOffRequest),
    AlreadyDecided(RequestStatus),
    Missing,
}

/// Owner of the connection pool. Cloning shares the pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the pool and create the schema if absent.
    pub async fn init(cfg: &DatabaseConfig) -> Result<Self, TimeOffError> {
        let connect_opts = SqliteConnectOptions::from_str(&cfg.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            // writers queue on the file lock instead of failing with SQLITE_BUSY
            .busy_timeout(cfg.acquire_timeout);
        let pool = SqlitePoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(cfg.acquire_timeout)
            .connect_with(connect_opts)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        info!(url = %cfg.url, "database schema ready");
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Execute the bundled DDL in one transaction. Safe to call repeatedly.
    pub async fn init_schema(&self) -> Result<(), TimeOffError> {
        let mut session = self.session().await?;
        let mut tx = session.conn.begin().await?;
        for stmt in schema::statements() {
            sqlx::query(stmt).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Close every pooled connection. Later sessions fail with `PoolClosed`.
    pub async fn shutdown(&self) {
        self.pool.close().await;
        info!("database pool closed");
    }

    /// Check out a connection for the caller's scope; it returns to the pool on drop.
    pub async fn session(&self) -> Result<Session, TimeOffError> {
        let conn = self.pool.acquire().await?;
        Ok(Session { conn })
    }

    /// Connectivity probe: `SELECT 1`, with any failure logged and reported as `false`.
    pub async fn ping(&self) -> bool {
        match self.probe().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "database connectivity probe failed");
                false
            }
        }
    }

    async fn probe(&self) -> Result<(), TimeOffError> {
        let mut session = self.session().await?;
        let (one,): (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(&mut *session.conn)
            .await?;
        debug!(result = one, "database probe ok");
        Ok(())
    }
}

/// A scoped handle on one pooled connection.
///
/// Every write runs inside its own transaction: it commits on success and the
/// dropped `Transaction` rolls back on any early return.
pub struct Session {
    conn: PoolConnection<Sqlite>,
}

impl Session {
    pub async fn insert_manager(&mut self, new: &NewManager) -> Result<Manager, TimeOffError> {
        let mut tx = self.conn.begin().await?;
        let manager = insert_manager_in(&mut tx, new).await?;
        tx.commit().await?;
        Ok(manager)
    }

    pub async fn manager_by_id(&mut self, id: i64) -> Result<Option<Manager>, TimeOffError> {
        let row = sqlx::query(&format!(
            "SELECT {MANAGER_COLUMNS} FROM managers WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row.as_ref().map(manager_from_row).transpose()?)
    }

    pub async fn list_managers(&mut self) -> Result<Vec<Manager>, TimeOffError> {
        let rows = sqlx::query(&format!(
            "SELECT {MANAGER_COLUMNS} FROM managers ORDER BY id"
        ))
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows
            .iter()
            .map(manager_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn count_managers(&mut self) -> Result<i64, TimeOffError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM managers")
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }

    /// Apply `changes` and refresh `updated_at`. `None` if the manager does not exist.
    pub async fn update_manager(
        &mut self,
        id: i64,
        changes: &ManagerChanges,
    ) -> Result<Option<Manager>, TimeOffError> {
        let mut tx = self.conn.begin().await?;
        let row = sqlx::query(&format!(
            r#"UPDATE managers SET
                name = COALESCE(?, name),
                email = COALESCE(?, email),
                password_hash = COALESCE(?, password_hash),
                updated_at = CURRENT_TIMESTAMP
              WHERE id = ?
              RETURNING {MANAGER_COLUMNS}"#
        ))
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.password_hash.as_deref())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let manager = row.as_ref().map(manager_from_row).transpose()?;
        tx.commit().await?;
        Ok(manager)
    }

    /// Delete a manager; owned requests go with it via `ON DELETE CASCADE`.
    pub async fn delete_manager(&mut self, id: i64) -> Result<bool, TimeOffError> {
        let mut tx = self.conn.begin().await?;
        let result = sqlx::query("DELETE FROM managers WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert a request. Status is left to the column default (`pending`).
    pub async fn insert_request(
        &mut self,
        new: &NewTimeOffRequest,
    ) -> Result<TimeOffRequest, TimeOffError> {
        let mut tx = self.conn.begin().await?;
        let request = insert_request_in(&mut tx, new).await?;
        tx.commit().await?;
        Ok(request)
    }

    pub async fn request_by_id(
        &mut self,
        id: i64,
    ) -> Result<Option<TimeOffRequestView>, TimeOffError> {
        let row = sqlx::query(&format!("{REQUEST_VIEW_SELECT} WHERE r.id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row.as_ref().map(view_from_row).transpose()?)
    }

    /// List requests joined with their manager's name, ordered by `start_date`, then `id`.
    pub async fn list_requests(
        &mut self,
        filter: RequestFilter,
    ) -> Result<Vec<TimeOffRequestView>, TimeOffError> {
        let rows = sqlx::query(&format!(
            r#"{REQUEST_VIEW_SELECT}
              WHERE (?1 IS NULL OR r.manager_id = ?1)
                AND (?2 IS NULL OR r.status = ?2)
              ORDER BY r.start_date ASC, r.id ASC"#
        ))
        .bind(filter.manager_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows
            .iter()
            .map(view_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Move a request from `pending` to `status` in a single conditional update.
    ///
    /// The `status = 'pending'` guard lets the store serialize racing
    /// decisions: the loser sees zero affected rows.
    pub async fn decide_request(
        &mut self,
        id: i64,
        status: RequestStatus,
    ) -> Result<StatusUpdate, TimeOffError> {
        let mut tx = self.conn.begin().await?;
        let updated = sqlx::query(&format!(
            r#"UPDATE time_off_requests
               SET status = ?, updated_at = CURRENT_TIMESTAMP
               WHERE id = ? AND status = 'pending'
               RETURNING {REQUEST_COLUMNS}"#
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match updated {
            Some(row) => StatusUpdate::Updated(request_from_row(&row)?),
            None => {
                let current: Option<(String,)> =
                    sqlx::query_as("SELECT status FROM time_off_requests WHERE id = ?")
                        .bind(id)
                        .fetch_optional(&mut *tx)
                        .await?;
                match current {
                    Some((s,)) => StatusUpdate::AlreadyDecided(parse_status(&s)?),
                    None => StatusUpdate::Missing,
                }
            }
        };
        tx.commit().await?;
        Ok(outcome)
    }

    pub async fn delete_request(&mut self, id: i64) -> Result<bool, TimeOffError> {
        let mut tx = self.conn.begin().await?;
        let result = sqlx::query("DELETE FROM time_off_requests WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert managers together with their requests in one transaction.
    /// Each request's `manager_id` is replaced by its owner's generated id.
    pub async fn insert_batch(
        &mut self,
        batch: &[(NewManager, Vec<NewTimeOffRequest>)],
    ) -> Result<(usize, usize), TimeOffError> {
        let mut tx = self.conn.begin().await?;
        let mut requests = 0;
        for (new_manager, owned) in batch {
            let manager = insert_manager_in(&mut tx, new_manager).await?;
            for new_request in owned {
                let new_request = NewTimeOffRequest {
                    manager_id: manager.id,
                    ..new_request.clone()
                };
                insert_request_in(&mut tx, &new_request).await?;
                requests += 1;
            }
        }
        tx.commit().await?;
        Ok((batch.len(), requests))
    }
}

async fn insert_manager_in(
    conn: &mut SqliteConnection,
    new: &NewManager,
) -> Result<Manager, sqlx::Error> {
    let row = sqlx::query(&format!(
        "INSERT INTO managers (name, email, password_hash) VALUES (?, ?, ?) RETURNING {MANAGER_COLUMNS}"
    ))
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.password_hash)
    .fetch_one(&mut *conn)
    .await?;
    manager_from_row(&row)
}

async fn insert_request_in(
    conn: &mut SqliteConnection,
    new: &NewTimeOffRequest,
) -> Result<TimeOffRequest, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"INSERT INTO time_off_requests (employee_name, start_date, end_date, reason, manager_id)
           VALUES (?, ?, ?, ?, ?)
           RETURNING {REQUEST_COLUMNS}"#
    ))
    .bind(&new.employee_name)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.reason.as_deref())
    .bind(new.manager_id)
    .fetch_one(&mut *conn)
    .await?;
    request_from_row(&row)
}

fn parse_status(s: &str) -> Result<RequestStatus, sqlx::Error> {
    s.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn manager_from_row(row: &SqliteRow) -> Result<Manager, sqlx::Error> {
    Ok(Manager {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn request_from_row(row: &SqliteRow) -> Result<TimeOffRequest, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(TimeOffRequest {
        id: row.try_get("id")?,
        employee_name: row.try_get("employee_name")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        reason: row.try_get("reason")?,
        manager_id: row.try_get("manager_id")?,
        status: parse_status(&status)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn view_from_row(row: &SqliteRow) -> Result<TimeOffRequestView, sqlx::Error> {
    Ok(TimeOffRequestView {
        request: request_from_row(row)?,
        manager_name: row.try_get("manager_name")?,
    })
}
