use crate::db::models::{Session, ShortLink, User, UserId, VerificationToken};
use crate::db::schema::SQLITE_INIT;
use crate::db::store::{PurgeReport, Store, StoreCounts};
use crate::error::PassError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::info;

pub type SqlitePool = Pool<Sqlite>;

/// SQLite-backed [`Store`]. Owns the process-wide connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and bootstrap
    /// the schema.
    pub async fn connect(database_url: &str) -> Result<Self, PassError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let store = Self::new(pool);
        store.init_schema().await?;
        info!(database_url = %database_url, "sqlite store ready");
        Ok(store)
    }

    /// Private in-memory database. A single never-recycled connection keeps
    /// the data alive for the lifetime of the pool.
    pub async fn connect_in_memory() -> Result<Self, PassError> {
        let connect_opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_opts)
            .await?;
        let store = Self::new(pool);
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), PassError> {
        // execute multiple statements one by one (sqlx::query runs a single statement)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Wait for in-flight queries and close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("sqlite store closed");
    }

    fn row_to_user(row: SqliteRow) -> Result<User, PassError> {
        let email_verified: i64 = row.try_get("email_verified")?;
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            email_verified: email_verified != 0,
            password_hash: row.try_get("password_hash")?,
        })
    }

    fn row_to_session(row: SqliteRow) -> Result<Session, PassError> {
        Ok(Session {
            token: row.try_get("token")?,
            user_id: row.try_get("user_id")?,
            created_at: from_millis(row.try_get("created_at")?)?,
            expires_at: from_millis(row.try_get("expires_at")?)?,
        })
    }

    fn row_to_short_link(row: SqliteRow) -> Result<ShortLink, PassError> {
        let expires_at: Option<i64> = row.try_get("expires_at")?;
        Ok(ShortLink {
            code: row.try_get("code")?,
            target_url: row.try_get("target_url")?,
            created_at: from_millis(row.try_get("created_at")?)?,
            expires_at: expires_at.map(from_millis).transpose()?,
        })
    }

    fn row_to_verification_token(row: SqliteRow) -> Result<VerificationToken, PassError> {
        Ok(VerificationToken {
            token: row.try_get("token")?,
            user_id: row.try_get("user_id")?,
            expires_at: from_millis(row.try_get("expires_at")?)?,
        })
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| sqlx::Error::Decode(format!("timestamp out of range: {ms}").into()))
}

/// Translate constraint violations on insert into domain errors.
fn map_insert_error(err: sqlx::Error) -> PassError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return PassError::Conflict;
        }
        if db_err.is_foreign_key_violation() {
            return PassError::UnknownUser;
        }
    }
    err.into()
}

#[async_trait]
impl Store for SqliteStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, PassError> {
        let row = sqlx::query(
            r#"SELECT id, username, email, email_verified, password_hash
               FROM users WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_user).transpose()
    }

    async fn insert_user(&self, user: &User) -> Result<(), PassError> {
        sqlx::query(
            r#"INSERT INTO users (id, username, email, email_verified, password_hash)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(if user.email_verified { 1 } else { 0 })
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;
        Ok(())
    }

    async fn mark_email_verified(&self, id: UserId) -> Result<bool, PassError> {
        let res = sqlx::query("UPDATE users SET email_verified = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>, PassError> {
        let row = sqlx::query(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_session).transpose()
    }

    async fn insert_session(&self, session: &Session) -> Result<(), PassError> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.created_at.timestamp_millis())
        .bind(session.expires_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;
        Ok(())
    }

    async fn delete_session(&self, token: &str) -> Result<bool, PassError> {
        let res = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn find_short_link(&self, code: &str) -> Result<Option<ShortLink>, PassError> {
        let row = sqlx::query(
            "SELECT code, target_url, created_at, expires_at FROM short_links WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_short_link).transpose()
    }

    async fn insert_short_link(&self, link: &ShortLink) -> Result<(), PassError> {
        sqlx::query(
            "INSERT INTO short_links (code, target_url, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&link.code)
        .bind(&link.target_url)
        .bind(link.created_at.timestamp_millis())
        .bind(link.expires_at.map(|t| t.timestamp_millis()))
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;
        Ok(())
    }

    async fn insert_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<(), PassError> {
        sqlx::query("INSERT INTO verification_tokens (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(&token.token)
            .bind(token.user_id)
            .bind(token.expires_at.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(map_insert_error)?;
        Ok(())
    }

    async fn consume_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<VerificationToken>, PassError> {
        let row = sqlx::query(
            r#"DELETE FROM verification_tokens WHERE token = ?
               RETURNING token, user_id, expires_at"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_verification_token).transpose()
    }

    async fn counts(&self) -> Result<StoreCounts, PassError> {
        let (users, sessions, short_links, verification_tokens): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"SELECT
                    (SELECT COUNT(*) FROM users),
                    (SELECT COUNT(*) FROM sessions),
                    (SELECT COUNT(*) FROM short_links),
                    (SELECT COUNT(*) FROM verification_tokens)"#,
            )
            .fetch_one(&self.pool)
            .await?;
        Ok(StoreCounts {
            users,
            sessions,
            short_links,
            verification_tokens,
        })
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<PurgeReport, PassError> {
        let now_ms = now.timestamp_millis();
        let mut tx = self.pool.begin().await?;

        let sessions = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now_ms)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let short_links =
            sqlx::query("DELETE FROM short_links WHERE expires_at IS NOT NULL AND expires_at <= ?")
                .bind(now_ms)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        let verification_tokens =
            sqlx::query("DELETE FROM verification_tokens WHERE expires_at <= ?")
                .bind(now_ms)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        tx.commit().await?;
        Ok(PurgeReport {
            sessions,
            short_links,
            verification_tokens,
        })
    }
}
