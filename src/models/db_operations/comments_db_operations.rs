use crate::models::db_operations::DbError;
use crate::models::{Comment, CommentView};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

pub fn insert_comment(
    conn: &Connection,
    post_id: i64,
    author_id: i64,
    body: &str,
) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO comments (body, author_id, post_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![body, author_id, post_id, Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_comment(conn: &Connection, id: i64) -> Result<Option<Comment>, DbError> {
    Ok(conn
        .query_row(
            "SELECT id, body, author_id, post_id, created_at FROM comments WHERE id = ?1",
            [id],
            |row| {
                Ok(Comment {
                    id: row.get(0)?,
                    body: row.get(1)?,
                    author_id: row.get(2)?,
                    post_id: row.get(3)?,
                    created_at: row.get(4)?,
                })
            },
        )
        .optional()?)
}

/// Comments on a post with commenter details, newest first.
pub fn read_comments_for_post(
    conn: &Connection,
    post_id: i64,
) -> Result<Vec<CommentView>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.body, c.created_at, c.author_id, a.name, a.avatar_url
         FROM comments c JOIN accounts a ON a.id = c.author_id
         WHERE c.post_id = ?1
         ORDER BY c.created_at DESC, c.id DESC",
    )?;
    let rows = stmt.query_map([post_id], |row| {
        Ok(CommentView {
            id: row.get(0)?,
            content: row.get(1)?,
            pub_date: row.get(2)?,
            commenter_id: row.get(3)?,
            commenter_name: row.get(4)?,
            commenter_image_url: row.get(5)?,
        })
    })?;

    let mut comments = Vec::new();
    for comment in rows {
        comments.push(comment?);
    }
    Ok(comments)
}

pub fn delete_comment(conn: &Connection, id: i64) -> Result<usize, DbError> {
    Ok(conn.execute("DELETE FROM comments WHERE id = ?1", [id])?)
}
