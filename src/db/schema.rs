//! SQL DDL for bootstrapping the store.
//! SQLite-first design; timestamps are unix milliseconds (INTEGER).

/// SQLite schema with:
/// - `users`: externally provisioned accounts, `username`/`email` UNIQUE
/// - `sessions`: `token` PRIMARY KEY, cascades away with its user
/// - `short_links`: `code` PRIMARY KEY (BINARY collation, case-sensitive),
///   `expires_at` NULL for links that never expire
/// - `verification_tokens`: single-use, deleted on consumption
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    email_verified INTEGER NOT NULL DEFAULT 0,
    password_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);

CREATE TABLE IF NOT EXISTS short_links (
    code TEXT PRIMARY KEY NOT NULL,
    target_url TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    expires_at INTEGER NULL
);

CREATE TABLE IF NOT EXISTS verification_tokens (
    token TEXT PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    expires_at INTEGER NOT NULL
);
"#;
