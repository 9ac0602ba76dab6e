//! User profile database operations

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::quota::Plan;

/// User profile record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub plan: String,
    pub billing_customer_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn plan(&self) -> Plan {
        Plan::from_db(&self.plan)
    }
}

/// Provisioning request
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub plan: Option<Plan>,
}

/// User repository
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by id
    pub async fn get(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, plan, billing_customer_id, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Create or update a user profile. Identity events from the external
    /// provider are delivered at-least-once, so provisioning is an upsert.
    pub async fn upsert(&self, new_user: &NewUser) -> Result<User> {
        let now = Utc::now().to_rfc3339();
        let plan = new_user.plan.unwrap_or(Plan::Free);

        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, plan, billing_customer_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, NULL, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                name = excluded.name,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&new_user.id)
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(plan.as_str())
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        let user = self.get(&new_user.id).await?;
        user.ok_or_else(|| crate::error::AppError::Internal("upserted user not found".to_string()))
    }

    /// Change a user's plan (billing-side plan flips land here)
    pub async fn set_plan(&self, id: &str, plan: Plan) -> Result<Option<User>> {
        let now = Utc::now().to_rfc3339();

        let affected = sqlx::query(
            r#"
            UPDATE users SET plan = ?, updated_at = ? WHERE id = ?
            "#,
        )
        .bind(plan.as_str())
        .bind(&now)
        .bind(id)
        .execute(self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    /// Delete a user and, via cascade, their signature rows
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }
}
