//! User Repository - PostgreSQL operations for user profiles using sqlx

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::database::store::{ReputationUpdate, StoreError, UserStore};
use crate::reputation::{Role, UserReputation};

const PROFILE_COLUMNS: &str =
    "identity, name, email, role, classification, rating_count, points, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub identity: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub classification: Option<f64>,
    pub rating_count: u32,
    pub points: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Fresh account: unrated, no votes, no points
    pub fn new(identity: String, name: String, email: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            identity,
            name,
            email,
            role,
            classification: None,
            rating_count: 0,
            points: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn reputation(&self) -> UserReputation {
        UserReputation {
            identity: self.identity.clone(),
            classification: self.classification,
            rating_count: self.rating_count,
            points: self.points,
            role: self.role,
        }
    }
}

/// Counters are `u32` in memory and `INTEGER` in PostgreSQL
fn to_column(field: &'static str, value: u32) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::OutOfRange { field, value })
}

/// Why a compare-and-swap update touched no row
fn missed_update(identity: &str, expected: u32, exists: bool) -> StoreError {
    if exists {
        StoreError::Conflict {
            identity: identity.to_string(),
            expected,
        }
    } else {
        StoreError::NotFound {
            identity: identity.to_string(),
        }
    }
}

fn role_from_row(row: &PgRow) -> Result<Role, sqlx::Error> {
    let raw: String = row.try_get("role")?;
    raw.parse::<Role>().map_err(|e| sqlx::Error::ColumnDecode {
        index: "role".to_string(),
        source: e.into(),
    })
}

fn profile_from_row(row: &PgRow) -> Result<UserProfile, sqlx::Error> {
    let rating_count: i32 = row.try_get("rating_count")?;
    let points: i32 = row.try_get("points")?;

    Ok(UserProfile {
        identity: row.try_get("identity")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: role_from_row(row)?,
        classification: row.try_get("classification")?,
        rating_count: rating_count.max(0) as u32,
        points: points.max(0) as u32,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn reputation_from_row(row: &PgRow) -> Result<UserReputation, sqlx::Error> {
    let rating_count: i32 = row.try_get("rating_count")?;
    let points: i32 = row.try_get("points")?;

    Ok(UserReputation {
        identity: row.try_get("identity")?,
        classification: row.try_get("classification")?,
        rating_count: rating_count.max(0) as u32,
        points: points.max(0) as u32,
        role: role_from_row(row)?,
    })
}

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the users table and its indexes
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        info!("Initializing users schema...");

        sqlx::query("CREATE SCHEMA IF NOT EXISTS community")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS community.users (
                identity VARCHAR(32) PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'student',
                classification DOUBLE PRECISION
                    CHECK (classification IS NULL OR (classification >= 0 AND classification <= 5)),
                rating_count INTEGER NOT NULL DEFAULT 0 CHECK (rating_count >= 0),
                points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_role ON community.users(role)")
            .execute(&self.pool)
            .await?;

        info!("Users schema initialized");
        Ok(())
    }

    async fn exists(&self, identity: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM community.users WHERE identity = $1")
            .bind(identity)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn insert(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let rating_count = to_column("rating_count", profile.rating_count)?;
        let points = to_column("points", profile.points)?;

        let result = sqlx::query(
            r#"
            INSERT INTO community.users
                (identity, name, email, role, classification,
                 rating_count, points, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&profile.identity)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(profile.role.as_str())
        .bind(profile.classification)
        .bind(rating_count)
        .bind(points)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(identity = %profile.identity, "User inserted");
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Duplicate {
                    identity: profile.identity.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_identity(&self, identity: &str) -> Result<Option<UserProfile>, StoreError> {
        let query = format!(
            "SELECT {} FROM community.users WHERE identity = $1",
            PROFILE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(identity)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(profile_from_row).transpose()?)
    }

    async fn find_all_with_classification(&self) -> Result<Vec<UserReputation>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT identity, classification, rating_count, points, role
            FROM community.users
            WHERE classification IS NOT NULL AND classification <> 'NaN'::float8
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(reputation_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_all_by_role(&self, role: Role) -> Result<Vec<UserReputation>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT identity, classification, rating_count, points, role
            FROM community.users
            WHERE role = $1
            "#,
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(reputation_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn update_reputation(
        &self,
        identity: &str,
        update: &ReputationUpdate,
    ) -> Result<(), StoreError> {
        let rating_count = to_column("rating_count", update.rating_count)?;
        let points = to_column("points", update.points)?;
        let expected = to_column("rating_count", update.expected_rating_count)?;

        let result = sqlx::query(
            r#"
            UPDATE community.users
            SET classification = $2,
                rating_count = $3,
                points = $4,
                updated_at = NOW()
            WHERE identity = $1 AND rating_count = $5
            "#,
        )
        .bind(identity)
        .bind(update.classification)
        .bind(rating_count)
        .bind(points)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists = self.exists(identity).await?;
        Err(missed_update(identity, update.expected_rating_count, exists))
    }

    async fn remove(&self, identity: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM community.users WHERE identity = $1")
            .bind(identity)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            debug!(identity = %identity, "User removed");
        }
        Ok(removed)
    }
}
