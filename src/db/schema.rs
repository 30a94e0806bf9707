//! SQL DDL for the time-off store.
//! SQLite-first; every statement is create-if-not-exists so boot can rerun it.

/// SQLite schema with:
/// - `managers`: `email` UNIQUE, timestamps defaulted by the store
/// - `time_off_requests`: `manager_id` FK with `ON DELETE CASCADE`,
///   `status` restricted to `pending|approved|denied` (default `pending`)
/// - indexes on `manager_id`, `(start_date, end_date)` and `managers.email`
///
/// `end_date >= start_date` is left to the service layer.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS managers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS time_off_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_name TEXT NOT NULL,
    start_date DATE NOT NULL, -- YYYY-MM-DD
    end_date DATE NOT NULL, -- YYYY-MM-DD
    reason TEXT NULL,
    manager_id INTEGER NOT NULL REFERENCES managers(id) ON DELETE CASCADE,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'approved', 'denied')),
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_time_off_manager_id ON time_off_requests(manager_id);
CREATE INDEX IF NOT EXISTS idx_time_off_dates ON time_off_requests(start_date, end_date);
CREATE INDEX IF NOT EXISTS idx_managers_email ON managers(email);
"#;

/// Split [`SQLITE_INIT`] into individual statements; `sqlx::query` runs one at a time.
pub fn statements() -> impl Iterator<Item = &'static str> {
    SQLITE_INIT
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_statement_is_idempotent() {
        let stmts: Vec<_> = statements().collect();
        assert_eq!(stmts.len(), 5);
        assert!(stmts.iter().all(|s| s.contains("IF NOT EXISTS")));
    }
}
