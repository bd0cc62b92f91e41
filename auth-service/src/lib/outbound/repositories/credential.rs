use std::time::Duration;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::PgPool;
use sqlx::Postgres;
use uuid::Uuid;

use crate::credential::errors::CredentialError;
use crate::credential::models::CredentialRecord;
use crate::credential::models::UserId;
use crate::credential::models::Username;
use crate::credential::ports::CredentialStore;

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    username: String,
    password_digest: String,
    name: String,
}

pub struct PostgresCredentialStore {
    pool: PgPool,
    connect_attempts: u32,
    retry_delay: Duration,
}

impl PostgresCredentialStore {
    /// Create a store over an existing pool.
    ///
    /// # Arguments
    /// * `pool` - Postgres connection pool
    /// * `connect_attempts` - Connection acquisitions tried per operation
    /// * `retry_delay` - Pause between acquisition attempts
    pub fn new(pool: PgPool, connect_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            pool,
            connect_attempts: connect_attempts.max(1),
            retry_delay,
        }
    }

    async fn acquire(&self) -> Result<PoolConnection<Postgres>, CredentialError> {
        let mut attempt = 1;
        loop {
            match self.pool.acquire().await {
                Ok(connection) => return Ok(connection),
                Err(e) if attempt < self.connect_attempts && is_transient(&e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.connect_attempts,
                        error = %e,
                        "Database connection attempt failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(map_sqlx_error(e)),
            }
        }
    }

    async fn permissions(
        &self,
        connection: &mut PoolConnection<Postgres>,
        user_id: Uuid,
    ) -> Result<Vec<String>, CredentialError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT permission
            FROM permissions
            WHERE user_id = $1
            ORDER BY permission
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut **connection)
        .await
        .map_err(map_sqlx_error)
    }

    async fn into_record(
        &self,
        connection: &mut PoolConnection<Postgres>,
        row: CredentialRow,
    ) -> Result<CredentialRecord, CredentialError> {
        let permissions = self.permissions(connection, row.id).await?;

        Ok(CredentialRecord {
            user_id: UserId(row.id),
            username: Username::new(row.username)?,
            stored_digest: row.password_digest,
            display_name: row.name,
            permissions,
        })
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_credential_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<CredentialRecord>, CredentialError> {
        let mut connection = self.acquire().await?;

        let rows = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, username, password_digest, name
            FROM users
            WHERE username = $1
            LIMIT 2
            "#,
        )
        .bind(username.as_str())
        .fetch_all(&mut *connection)
        .await
        .map_err(map_sqlx_error)?;

        let row_count = rows.len();
        match single_row(rows) {
            Some(row) => Ok(Some(self.into_record(&mut connection, row).await?)),
            None => {
                if row_count > 1 {
                    tracing::error!(
                        user = %username.fingerprint(),
                        "Duplicate credential records for username"
                    );
                }
                Ok(None)
            }
        }
    }

    async fn find_credential_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<CredentialRecord>, CredentialError> {
        let mut connection = self.acquire().await?;

        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, username, password_digest, name
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut *connection)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(Some(self.into_record(&mut connection, row).await?)),
            None => Ok(None),
        }
    }

    async fn update_stored_digest(
        &self,
        id: &UserId,
        stored_digest: &str,
    ) -> Result<(), CredentialError> {
        let mut connection = self.acquire().await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_digest = $1
            WHERE id = $2
            "#,
        )
        .bind(stored_digest)
        .bind(id.0)
        .execute(&mut *connection)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(CredentialError::NotFound(id.to_string()));
        }

        Ok(())
    }
}

/// Exactly one row, or nothing.
fn single_row<T>(mut rows: Vec<T>) -> Option<T> {
    if rows.len() == 1 {
        rows.pop()
    } else {
        None
    }
}

fn is_transient(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::Tls(_)
    )
}

fn map_sqlx_error(error: sqlx::Error) -> CredentialError {
    if is_transient(&error) || matches!(error, sqlx::Error::PoolClosed) {
        CredentialError::DependencyUnavailable(error.to_string())
    } else {
        CredentialError::DatabaseError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_row() {
        assert_eq!(single_row::<u8>(vec![]), None);
        assert_eq!(single_row(vec![7]), Some(7));
        assert_eq!(single_row(vec![7, 8]), None);
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            CredentialError::DependencyUnavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolClosed),
            CredentialError::DependencyUnavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            CredentialError::DatabaseError(_)
        ));
    }
}
