use serde::Deserialize;
use sqlx::error::ErrorKind;
use tracing::info;

use super::{required_text, violated_constraint};
use crate::db::{Database, Manager, ManagerChanges, NewManager};
use crate::error::TimeOffError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManagerRegistration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManagerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

fn validate_email(value: Option<&str>) -> Result<String, TimeOffError> {
    let email = required_text("email", value)?;
    if !email.contains('@') {
        return Err(TimeOffError::invalid_input("email must contain '@'"));
    }
    Ok(email)
}

fn validate_password(value: Option<&str>) -> Result<String, TimeOffError> {
    match value {
        Some(p) if !p.is_empty() => Ok(p.to_string()),
        _ => Err(TimeOffError::invalid_input("password is required")),
    }
}

/// Maps a unique-email violation to `Conflict`; everything else passes through.
fn email_conflict(email: Option<&str>) -> impl FnOnce(TimeOffError) -> TimeOffError + '_ {
    move |e| match violated_constraint(&e) {
        Some(ErrorKind::UniqueViolation) => TimeOffError::Conflict(format!(
            "email {} is already registered",
            email.unwrap_or_default()
        )),
        _ => e,
    }
}

/// Manager administration. Passwords are stored as bcrypt hashes only.
#[derive(Clone)]
pub struct ManagerService {
    db: Database,
    bcrypt_cost: u32,
}

impl ManagerService {
    pub fn new(db: Database, bcrypt_cost: u32) -> Self {
        Self { db, bcrypt_cost }
    }

    async fn hash_password(&self, password: String) -> Result<String, TimeOffError> {
        let cost = self.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hash)
    }

    pub async fn create_manager(&self, reg: &ManagerRegistration) -> Result<Manager, TimeOffError> {
        let name = required_text("name", reg.name.as_deref())?;
        let email = validate_email(reg.email.as_deref())?;
        let password = validate_password(reg.password.as_deref())?;
        let password_hash = self.hash_password(password).await?;

        let new = NewManager {
            name,
            email,
            password_hash,
        };
        let mut session = self.db.session().await?;
        let manager = session
            .insert_manager(&new)
            .await
            .map_err(email_conflict(Some(new.email.as_str())))?;
        info!(manager_id = manager.id, "manager created");
        Ok(manager)
    }

    pub async fn get_manager(&self, manager_id: i64) -> Result<Manager, TimeOffError> {
        let mut session = self.db.session().await?;
        session
            .manager_by_id(manager_id)
            .await?
            .ok_or_else(|| TimeOffError::manager_not_found(manager_id))
    }

    pub async fn list_managers(&self) -> Result<Vec<Manager>, TimeOffError> {
        let mut session = self.db.session().await?;
        session.list_managers().await
    }

    pub async fn update_manager(
        &self,
        manager_id: i64,
        update: &ManagerUpdate,
    ) -> Result<Manager, TimeOffError> {
        let mut changes = ManagerChanges::default();
        if let Some(name) = update.name.as_deref() {
            changes.name = Some(required_text("name", Some(name))?);
        }
        if let Some(email) = update.email.as_deref() {
            changes.email = Some(validate_email(Some(email))?);
        }
        if let Some(password) = update.password.as_deref() {
            let password = validate_password(Some(password))?;
            changes.password_hash = Some(self.hash_password(password).await?);
        }
        if changes.is_empty() {
            return Err(TimeOffError::invalid_input(
                "at least one of name, email or password is required",
            ));
        }

        let mut session = self.db.session().await?;
        let updated = session
            .update_manager(manager_id, &changes)
            .await
            .map_err(email_conflict(changes.email.as_deref()))?
            .ok_or_else(|| TimeOffError::manager_not_found(manager_id))?;
        info!(manager_id, "manager updated");
        Ok(updated)
    }

    /// Delete a manager and, by cascade, every request they own.
    pub async fn delete_manager(&self, manager_id: i64) -> Result<(), TimeOffError> {
        let mut session = self.db.session().await?;
        if !session.delete_manager(manager_id).await? {
            return Err(TimeOffError::manager_not_found(manager_id));
        }
        info!(manager_id, "manager deleted with owned requests");
        Ok(())
    }
}
