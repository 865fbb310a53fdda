//! SQL schema for the Quill SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout revision.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS comments (
    comment_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id   TEXT NOT NULL,   -- external story id; not validated
    author_id   TEXT NOT NULL,   -- caller identity; never updated
    content     TEXT NOT NULL CHECK (content != ''),
    created_at  TEXT NOT NULL,   -- fixed-width RFC 3339 UTC; server-assigned
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS comments_parent_idx ON comments(parent_id, created_at);
CREATE INDEX IF NOT EXISTS comments_author_idx ON comments(author_id);

PRAGMA user_version = 1;
";

/// Drops everything [`SCHEMA`] creates.
pub const TEARDOWN: &str = "
DROP INDEX IF EXISTS comments_author_idx;
DROP INDEX IF EXISTS comments_parent_idx;
DROP TABLE IF EXISTS comments;
PRAGMA user_version = 0;
";
