use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::{
    auth::repo_types::User,
    db::{deadline, StoreError},
};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    /// Returns `false` when no user has `id`.
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let user = deadline(self.timeout, async {
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (email, password_hash)
                VALUES ($1, $2)
                RETURNING id, email, password_hash, is_admin, created_at
                "#,
            )
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.db)
            .await
            .map_err(StoreError::from_insert)
        })
        .await?;
        info!(user_id = user.id, "user created");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        deadline(self.timeout, async {
            let user = sqlx::query_as::<_, User>(
                r#"
                SELECT id, email, password_hash, is_admin, created_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
            Ok::<_, StoreError>(user)
        })
        .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        deadline(self.timeout, async {
            let user = sqlx::query_as::<_, User>(
                r#"
                SELECT id, email, password_hash, is_admin, created_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
            Ok::<_, StoreError>(user)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        deadline(self.timeout, async {
            let users = sqlx::query_as::<_, User>(
                r#"
                SELECT id, email, password_hash, is_admin, created_at
                FROM users
                ORDER BY id
                "#,
            )
            .fetch_all(&self.db)
            .await?;
            Ok::<_, StoreError>(users)
        })
        .await
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool, StoreError> {
        let updated = deadline(self.timeout, async {
            let res = sqlx::query(r#"UPDATE users SET password_hash = $1 WHERE id = $2"#)
                .bind(password_hash)
                .bind(id)
                .execute(&self.db)
                .await?;
            Ok::<_, StoreError>(res.rows_affected() > 0)
        })
        .await?;
        if updated {
            info!(user_id = id, "password changed");
        }
        Ok(updated)
    }
}
