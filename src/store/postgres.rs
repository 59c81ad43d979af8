//! PostgreSQL wiki store for production use.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
//! - `DB_MIN_CONNECTIONS`: Minimum idle connections (default: 2)
//! - `DB_CONNECT_TIMEOUT_SECS`: Connection timeout (default: 10)
//! - `DB_IDLE_TIMEOUT_SECS`: Idle connection timeout (default: 300)
//! - `DB_MAX_LIFETIME_SECS`: Max connection lifetime (default: 1800)

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use std::time::Duration;

use super::WikiStore;
use crate::error::WikiError;
use crate::search::SearchQuery;
use crate::types::{
    FingerprintMismatch, ParentRef, Revision, RevisionDraft, RevisionId, User, UserDraft, UserId,
};

/// Configuration for PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum connections in pool (default: 10).
    pub max_connections: u32,
    /// Minimum idle connections to keep warm (default: 2).
    pub min_connections: u32,
    /// Connection acquire timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds (default: 300 = 5 min).
    pub idle_timeout_secs: u64,
    /// Maximum connection lifetime in seconds (default: 1800 = 30 min).
    pub max_lifetime_secs: u64,
}

impl PostgresConfig {
    /// Load configuration from environment variables with production defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/socialwiki".to_string()),
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            min_connections: env_or("DB_MIN_CONNECTIONS", 2),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 1800),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Schema applied by [`PostgresWikiStore::migrate`]. Every statement is
/// idempotent.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS wiki_users (
        id            BIGSERIAL PRIMARY KEY,
        user_name     TEXT NOT NULL,
        first_name    TEXT NOT NULL,
        last_name     TEXT NOT NULL,
        email         TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        is_deleted    BOOLEAN NOT NULL DEFAULT FALSE,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS wiki_users_user_name_key ON wiki_users (UPPER(user_name))",
    "CREATE UNIQUE INDEX IF NOT EXISTS wiki_users_email_key ON wiki_users (UPPER(email))",
    r#"
    CREATE TABLE IF NOT EXISTS wiki_revisions (
        id          BIGSERIAL PRIMARY KEY,
        title       TEXT NOT NULL CHECK (title <> ''),
        content     TEXT NOT NULL,
        parent_id   BIGINT NOT NULL,
        author_id   BIGINT NOT NULL REFERENCES wiki_users (id),
        views       BIGINT NOT NULL DEFAULT 0 CHECK (views >= 0),
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        fingerprint TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS wiki_revisions_parent_idx ON wiki_revisions (parent_id)",
    r#"
    CREATE TABLE IF NOT EXISTS wiki_created_pages (
        user_id     BIGINT NOT NULL REFERENCES wiki_users (id),
        revision_id BIGINT NOT NULL REFERENCES wiki_revisions (id),
        PRIMARY KEY (user_id, revision_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS wiki_likes (
        user_id     BIGINT NOT NULL REFERENCES wiki_users (id),
        revision_id BIGINT NOT NULL REFERENCES wiki_revisions (id),
        PRIMARY KEY (user_id, revision_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS wiki_likes_revision_idx ON wiki_likes (revision_id)",
    r#"
    CREATE TABLE IF NOT EXISTS wiki_follows (
        follower_id BIGINT NOT NULL REFERENCES wiki_users (id),
        followed_id BIGINT NOT NULL REFERENCES wiki_users (id),
        PRIMARY KEY (follower_id, followed_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS wiki_follows_followed_idx ON wiki_follows (followed_id)",
];

const REVISION_COLUMNS: &str =
    "r.id, r.title, r.content, r.parent_id, r.author_id, r.views, r.created_at, r.fingerprint";

const USER_COLUMNS: &str =
    "id, user_name, first_name, last_name, email, password_hash, is_deleted, created_at";

/// PostgreSQL wiki store.
///
/// Each compound mutation runs in one transaction. Row locks taken with
/// `FOR SHARE` / `FOR UPDATE` serialize parent checks against inserts and
/// follow inserts against tombstoning.
pub struct PostgresWikiStore {
    pool: PgPool,
}

impl PostgresWikiStore {
    /// Create a new store with the given configuration.
    pub async fn new(config: PostgresConfig) -> Result<Self, sqlx::Error> {
        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            idle_timeout_secs = config.idle_timeout_secs,
            max_lifetime_secs = config.max_lifetime_secs,
            "Initializing PostgreSQL connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a store from environment variables.
    pub async fn from_env() -> Result<Self, sqlx::Error> {
        Self::new(PostgresConfig::from_env()).await
    }

    /// Create the wiki tables and indexes if they do not exist.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!(statements = SCHEMA_STATEMENTS.len(), "Schema migrated");
        Ok(())
    }

    /// Get the connection pool for health checks.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check if the database is reachable.
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    /// Get pool statistics for monitoring.
    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max: self.pool.options().get_max_connections(),
        }
    }

    /// Parse a revision from a database row and check its fingerprint.
    fn parse_revision_row(row: &PgRow) -> Result<Revision, PostgresError> {
        let parent_raw: i64 = row.try_get("parent_id")?;
        let parent = ParentRef::from_raw(parent_raw).ok_or_else(|| {
            sqlx::Error::Decode(format!("invalid parent_id {}", parent_raw).into())
        })?;
        let views: i64 = row.try_get("views")?;

        let revision = Revision {
            id: RevisionId::new(row.try_get("id")?),
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            parent,
            author: UserId::new(row.try_get("author_id")?),
            views: views.max(0) as u64,
            created_at: row.try_get("created_at")?,
            fingerprint: row.try_get("fingerprint")?,
        };

        revision.verify_fingerprint()?;
        Ok(revision)
    }

    fn parse_user_row(row: &PgRow) -> Result<User, sqlx::Error> {
        Ok(User {
            id: UserId::new(row.try_get("id")?),
            user_name: row.try_get("user_name")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            is_deleted: row.try_get("is_deleted")?,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn fetch_user(&self, clause: &str, value: &str) -> Result<Option<User>, PostgresError> {
        let sql = format!("SELECT {} FROM wiki_users WHERE {}", USER_COLUMNS, clause);
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Self::parse_user_row).transpose()?)
    }

    async fn fetch_ids(&self, sql: &str, key: i64) -> Result<Vec<i64>, PostgresError> {
        let rows = sqlx::query(sql).bind(key).fetch_all(&self.pool).await?;
        let ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>(0))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

/// Share-lock a user row and require it to be live.
///
/// The lock conflicts with the `UPDATE` in `tombstone_user`, so the caller's
/// insert and a concurrent tombstone serialize.
async fn lock_live_user(tx: &mut Transaction<'_, Postgres>, id: UserId) -> Result<(), PostgresError> {
    let deleted: Option<bool> =
        sqlx::query_scalar("SELECT is_deleted FROM wiki_users WHERE id = $1 FOR SHARE")
            .bind(id.get())
            .fetch_optional(&mut **tx)
            .await?;
    match deleted {
        Some(false) => Ok(()),
        Some(true) => Err(PostgresError::UserDeleted(id)),
        None => Err(PostgresError::UserNotFound(id)),
    }
}

/// Escape `%`, `_` and `\` and wrap the needle for a substring ILIKE.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Map a unique violation on the user indexes to a duplicate error.
fn map_user_conflict(e: sqlx::Error, draft: &UserDraft) -> PostgresError {
    if let sqlx::Error::Database(db) = &e {
        match db.constraint() {
            Some("wiki_users_user_name_key") => {
                return PostgresError::DuplicateUserName(draft.user_name.clone())
            }
            Some("wiki_users_email_key") => return PostgresError::DuplicateEmail(draft.email.clone()),
            _ => {}
        }
    }
    PostgresError::Database(e)
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolStats {
    /// Current pool size.
    pub size: u32,
    /// Number of idle connections.
    pub idle: usize,
    /// Maximum pool size.
    pub max: u32,
}

/// Error type for PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Stored page does not match its fingerprint.
    #[error("Integrity check failed: {0}")]
    Integrity(#[from] FingerprintMismatch),
    /// Parent revision named by a draft does not exist.
    #[error("Parent revision not found: {0}")]
    ParentNotFound(RevisionId),
    /// Revision not found.
    #[error("Revision not found: {0}")]
    RevisionNotFound(RevisionId),
    /// User not found (or deleted, where a live user is required).
    #[error("User not found: {0}")]
    UserNotFound(UserId),
    /// Acting user has been deleted.
    #[error("User is deleted: {0}")]
    UserDeleted(UserId),
    /// userName already taken.
    #[error("userName already taken: {0}")]
    DuplicateUserName(String),
    /// Email already taken.
    #[error("email already taken: {0}")]
    DuplicateEmail(String),
}

impl From<PostgresError> for WikiError {
    fn from(e: PostgresError) -> Self {
        match e {
            PostgresError::ParentNotFound(id) | PostgresError::RevisionNotFound(id) => {
                WikiError::revision_not_found(id)
            }
            PostgresError::UserNotFound(id) => WikiError::user_not_found(id),
            PostgresError::UserDeleted(id) => WikiError::Forbidden(format!("account {} is deleted", id)),
            PostgresError::DuplicateUserName(_) | PostgresError::DuplicateEmail(_) => {
                WikiError::Conflict(e.to_string())
            }
            PostgresError::Database(_) | PostgresError::Integrity(_) => WikiError::internal(e),
        }
    }
}

#[async_trait]
impl WikiStore for PostgresWikiStore {
    type Error = PostgresError;

    async fn insert_revision(&self, draft: RevisionDraft) -> Result<Revision, Self::Error> {
        let mut tx = self.pool.begin().await?;

        lock_live_user(&mut tx, draft.author).await?;

        if let Some(parent) = draft.parent.revision_id() {
            let found = sqlx::query("SELECT id FROM wiki_revisions WHERE id = $1 FOR SHARE")
                .bind(parent.get())
                .fetch_optional(&mut *tx)
                .await?;
            if found.is_none() {
                return Err(PostgresError::ParentNotFound(parent));
            }
        }

        let sql = format!(
            r#"
            INSERT INTO wiki_revisions AS r (title, content, parent_id, author_id, fingerprint)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            REVISION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&draft.title)
            .bind(&draft.content)
            .bind(draft.parent.to_raw())
            .bind(draft.author.get())
            .bind(draft.fingerprint())
            .fetch_one(&mut *tx)
            .await?;
        let revision = Self::parse_revision_row(&row)?;

        sqlx::query("INSERT INTO wiki_created_pages (user_id, revision_id) VALUES ($1, $2)")
            .bind(revision.author.get())
            .bind(revision.id.get())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(revision)
    }

    async fn get_revision(&self, id: RevisionId) -> Result<Option<Revision>, Self::Error> {
        let sql = format!("SELECT {} FROM wiki_revisions r WHERE r.id = $1", REVISION_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_revision_row).transpose()
    }

    async fn get_children(&self, id: RevisionId) -> Result<Vec<RevisionId>, Self::Error> {
        let ids = self
            .fetch_ids("SELECT id FROM wiki_revisions WHERE parent_id = $1 ORDER BY id", id.get())
            .await?;
        Ok(ids.into_iter().map(RevisionId::new).collect())
    }

    async fn increment_views(&self, id: RevisionId) -> Result<Option<Revision>, Self::Error> {
        let sql = format!(
            "UPDATE wiki_revisions AS r SET views = views + 1 WHERE r.id = $1 RETURNING {}",
            REVISION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_revision_row).transpose()
    }

    async fn search_revisions(&self, query: &SearchQuery) -> Result<Vec<Revision>, Self::Error> {
        let rows = match query {
            SearchQuery::Fields { title, author, content } => {
                let sql = format!(
                    r#"
                    SELECT {}
                    FROM wiki_revisions r
                    JOIN wiki_users u ON u.id = r.author_id
                    WHERE ($1 = '' OR r.title ILIKE $2 ESCAPE '\')
                      AND ($3 = '' OR u.user_name ILIKE $4 ESCAPE '\')
                      AND ($5 = '' OR r.content ILIKE $6 ESCAPE '\')
                    ORDER BY r.id
                    "#,
                    REVISION_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(title)
                    .bind(like_pattern(title))
                    .bind(author)
                    .bind(like_pattern(author))
                    .bind(content)
                    .bind(like_pattern(content))
                    .fetch_all(&self.pool)
                    .await?
            }
            SearchQuery::Text(text) => {
                if text.is_empty() {
                    return Ok(Vec::new());
                }
                let sql = format!(
                    r#"
                    SELECT {}
                    FROM wiki_revisions r
                    WHERE r.title ILIKE $1 ESCAPE '\' OR r.content ILIKE $1 ESCAPE '\'
                    ORDER BY r.id
                    "#,
                    REVISION_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(like_pattern(text))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(Self::parse_revision_row).collect()
    }

    async fn all_revisions(&self) -> Result<Vec<Revision>, Self::Error> {
        let sql = format!("SELECT {} FROM wiki_revisions r ORDER BY r.id", REVISION_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(Self::parse_revision_row).collect()
    }

    async fn created_revisions(&self, user: UserId) -> Result<Vec<RevisionId>, Self::Error> {
        let ids = self
            .fetch_ids(
                "SELECT revision_id FROM wiki_created_pages WHERE user_id = $1 ORDER BY revision_id",
                user.get(),
            )
            .await?;
        Ok(ids.into_iter().map(RevisionId::new).collect())
    }

    async fn insert_user(&self, draft: UserDraft) -> Result<User, Self::Error> {
        let sql = format!(
            r#"
            INSERT INTO wiki_users (user_name, first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&draft.user_name)
            .bind(&draft.first_name)
            .bind(&draft.last_name)
            .bind(&draft.email)
            .bind(&draft.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_user_conflict(e, &draft))?;

        Ok(Self::parse_user_row(&row)?)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, Self::Error> {
        let sql = format!("SELECT {} FROM wiki_users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Self::parse_user_row).transpose()?)
    }

    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>, Self::Error> {
        self.fetch_user("UPPER(user_name) = UPPER($1)", user_name).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Self::Error> {
        self.fetch_user("UPPER(email) = UPPER($1)", email).await
    }

    async fn find_active_user_by_login(&self, identifier: &str) -> Result<Option<User>, Self::Error> {
        self.fetch_user(
            "NOT is_deleted AND (UPPER(user_name) = UPPER($1) OR UPPER(email) = UPPER($1))",
            identifier,
        )
        .await
    }

    async fn tombstone_user(&self, id: UserId) -> Result<Option<User>, Self::Error> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE wiki_users SET is_deleted = TRUE WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&mut *tx)
            .await?;
        let user = match row {
            Some(ref r) => Self::parse_user_row(r)?,
            None => return Ok(None),
        };

        let removed = sqlx::query("DELETE FROM wiki_follows WHERE followed_id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        tracing::debug!(user_id = %id, removed_follows = removed, "User tombstoned");
        Ok(Some(user))
    }

    async fn add_like(&self, user: UserId, revision: RevisionId) -> Result<bool, Self::Error> {
        let mut tx = self.pool.begin().await?;

        lock_live_user(&mut tx, user).await?;
        if sqlx::query("SELECT id FROM wiki_revisions WHERE id = $1")
            .bind(revision.get())
            .fetch_optional(&mut *tx)
            .await?
            .is_none()
        {
            return Err(PostgresError::RevisionNotFound(revision));
        }

        let inserted = sqlx::query(
            "INSERT INTO wiki_likes (user_id, revision_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user.get())
        .bind(revision.get())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(inserted > 0)
    }

    async fn remove_like(&self, user: UserId, revision: RevisionId) -> Result<bool, Self::Error> {
        let removed = sqlx::query("DELETE FROM wiki_likes WHERE user_id = $1 AND revision_id = $2")
            .bind(user.get())
            .bind(revision.get())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }

    async fn count_likers(&self, revision: RevisionId) -> Result<usize, Self::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wiki_likes WHERE revision_id = $1")
            .bind(revision.get())
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }

    async fn is_liked(&self, user: UserId, revision: RevisionId) -> Result<bool, Self::Error> {
        let row = sqlx::query("SELECT 1 FROM wiki_likes WHERE user_id = $1 AND revision_id = $2")
            .bind(user.get())
            .bind(revision.get())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn liked_revisions(&self, user: UserId) -> Result<Vec<RevisionId>, Self::Error> {
        let ids = self
            .fetch_ids(
                "SELECT revision_id FROM wiki_likes WHERE user_id = $1 ORDER BY revision_id",
                user.get(),
            )
            .await?;
        Ok(ids.into_iter().map(RevisionId::new).collect())
    }

    async fn add_follow(&self, follower: UserId, target: UserId) -> Result<bool, Self::Error> {
        let mut tx = self.pool.begin().await?;

        lock_live_user(&mut tx, follower).await?;

        // Blocks behind a concurrent tombstone of the target.
        let deleted: Option<bool> =
            sqlx::query_scalar("SELECT is_deleted FROM wiki_users WHERE id = $1 FOR SHARE")
                .bind(target.get())
                .fetch_optional(&mut *tx)
                .await?;
        if deleted != Some(false) {
            return Err(PostgresError::UserNotFound(target));
        }

        let inserted = sqlx::query(
            "INSERT INTO wiki_follows (follower_id, followed_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(follower.get())
        .bind(target.get())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(inserted > 0)
    }

    async fn remove_follow(&self, follower: UserId, target: UserId) -> Result<bool, Self::Error> {
        let removed = sqlx::query("DELETE FROM wiki_follows WHERE follower_id = $1 AND followed_id = $2")
            .bind(follower.get())
            .bind(target.get())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }

    async fn followed_users(&self, user: UserId) -> Result<Vec<UserId>, Self::Error> {
        let ids = self
            .fetch_ids(
                "SELECT followed_id FROM wiki_follows WHERE follower_id = $1 ORDER BY followed_id",
                user.get(),
            )
            .await?;
        Ok(ids.into_iter().map(UserId::new).collect())
    }

    async fn followers(&self, user: UserId) -> Result<Vec<UserId>, Self::Error> {
        let ids = self
            .fetch_ids(
                "SELECT follower_id FROM wiki_follows WHERE followed_id = $1 ORDER BY follower_id",
                user.get(),
            )
            .await?;
        Ok(ids.into_iter().map(UserId::new).collect())
    }
}
