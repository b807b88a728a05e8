use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Per-connection pragmas. SQLite leaves foreign keys off by default, and the
/// busy timeout makes a second writer wait for the first instead of failing.
pub const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;";

pub fn setup_blog_db(conn: &mut Connection) -> Result<(), SetupError> {
    conn.execute_batch(CONNECTION_PRAGMAS)?;
    let tx = conn.transaction()?;

    log::info!("Creating 'accounts' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL CHECK(role IN ('Normal User', 'Guest Author', 'Admin')),
            avatar_asset_id TEXT,
            avatar_url TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    log::info!("Creating 'posts' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'General',
            image_asset_id TEXT NOT NULL,
            image_url TEXT NOT NULL,
            author_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT,
            FOREIGN KEY (author_id) REFERENCES accounts(id)
        )",
        [],
    )?;

    log::info!("Creating 'submissions' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS submissions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'General',
            image_asset_id TEXT NOT NULL,
            image_url TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending' CHECK(status IN ('pending', 'approved')),
            rejection_reason TEXT,
            author_id INTEGER NOT NULL,
            submitted_at TEXT NOT NULL,
            published_post_id INTEGER,
            FOREIGN KEY (author_id) REFERENCES accounts(id) ON DELETE CASCADE,
            FOREIGN KEY (published_post_id) REFERENCES posts(id) ON DELETE SET NULL
        )",
        [],
    )?;

    log::info!("Creating 'comments' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            body TEXT NOT NULL,
            author_id INTEGER NOT NULL,
            post_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (author_id) REFERENCES accounts(id) ON DELETE CASCADE,
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
        )",
        [],
    )?;

    log::info!("Creating indexes...");
    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at);
         CREATE INDEX IF NOT EXISTS idx_submissions_queue ON submissions(status, submitted_at);
         CREATE INDEX IF NOT EXISTS idx_submissions_author ON submissions(author_id);
         CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created_at);",
    )?;

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_blog_db(&mut conn).unwrap();
        setup_blog_db(&mut conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('accounts', 'posts', 'submissions', 'comments')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }

    #[test]
    fn test_role_check_constraint() {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_blog_db(&mut conn).unwrap();
        let result = conn.execute(
            "INSERT INTO accounts (name, email, password_hash, role, created_at) VALUES ('x', 'x@x', 'h', 'superuser', '2024-01-01')",
            [],
        );
        assert!(result.is_err());
    }
}
