//! Signature event database operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Result;
use crate::quota;

/// One recorded signing event
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRecord {
    pub id: String,
    pub user_id: String,
    pub file_name: String,
    pub signed_at: String,
    pub week_number: String,
    pub month_year: String,
}

/// Signature repository
pub struct SignatureRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SignatureRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record one signing event for quota accounting
    pub async fn create(&self, user_id: &str, file_name: &str) -> Result<SignatureRecord> {
        let now = Utc::now();
        let record = SignatureRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            file_name: file_name.to_string(),
            signed_at: now.to_rfc3339(),
            week_number: quota::week_label(now),
            month_year: quota::month_label(now),
        };

        sqlx::query(
            r#"
            INSERT INTO signatures (id, user_id, file_name, signed_at, week_number, month_year)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.file_name)
        .bind(&record.signed_at)
        .bind(&record.week_number)
        .bind(&record.month_year)
        .execute(self.pool)
        .await?;

        Ok(record)
    }

    /// Count events for a user inside a half-open window `[start, end)`
    pub async fn count_between(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM signatures
            WHERE user_id = ? AND signed_at >= ? AND signed_at < ?
            "#,
        )
        .bind(user_id)
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Most recent events for a user
    pub async fn recent(&self, user_id: &str, limit: i32) -> Result<Vec<SignatureRecord>> {
        let records = sqlx::query_as::<_, SignatureRecord>(
            r#"
            SELECT id, user_id, file_name, signed_at, week_number, month_year
            FROM signatures
            WHERE user_id = ?
            ORDER BY signed_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }
}
