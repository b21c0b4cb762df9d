//! Database Connection Pool using sqlx

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tracing::info;

use crate::database::store::StoreError;
use crate::database::users::UserRepository;

pub struct DatabasePool {
    pool: PgPool,
    users: Arc<UserRepository>,
}

impl DatabasePool {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await?;

        info!(max_connections, "Connected to PostgreSQL");

        let users = Arc::new(UserRepository::new(pool.clone()));

        Ok(Self { pool, users })
    }

    pub async fn init_schema(&self) -> Result<(), StoreError> {
        info!("Initializing database schema...");
        self.users.init_schema().await?;
        info!("Database schema initialized");
        Ok(())
    }

    pub fn users(&self) -> Arc<UserRepository> {
        self.users.clone()
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
