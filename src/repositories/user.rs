use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::{
    error::{StoreError, StoreResult},
    models::user::{User, UserId},
};

/// Storage contract for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts `user` and writes the store-assigned id back into it.
    async fn create(&self, user: &mut User) -> StoreResult<()>;

    /// Finds a user by their ID.
    async fn find_by_id(&self, id: UserId) -> StoreResult<User>;

    /// Finds a user by their email address.
    async fn find_by_email(&self, email: &str) -> StoreResult<User>;

    /// Deletes a user. Deleting an unknown id is not an error.
    async fn delete(&self, id: UserId) -> StoreResult<()>;
}

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> StoreResult<User> {
    Ok(User {
        id: Some(UserId(row.try_get("id")?)),
        first: row.try_get("first")?,
        last: row.try_get("last")?,
        email: row.try_get("email")?,
    })
}

/// `UserStore` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgUserStore {
    pool: Pool,
}

impl PgUserStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: &mut User) -> StoreResult<()> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO users (first, last, email)
                VALUES ($1, $2, $3)
                RETURNING id
                "#,
                &[&user.first, &user.last, &user.email],
            )
            .await?;
        user.id = Some(UserId(row.try_get("id")?));
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<User> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, first, last, email
                FROM users
                WHERE id = $1
                "#,
                &[&id.0],
            )
            .await?
            .ok_or(StoreError::NotFound)?;
        row_to_user(&row)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<User> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, first, last, email
                FROM users
                WHERE email = $1
                ORDER BY id
                LIMIT 1
                "#,
                &[&email],
            )
            .await?
            .ok_or(StoreError::NotFound)?;
        row_to_user(&row)
    }

    async fn delete(&self, id: UserId) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client
            .execute("DELETE FROM users WHERE id = $1", &[&id.0])
            .await?;
        Ok(())
    }
}
