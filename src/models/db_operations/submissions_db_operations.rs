use crate::models::db_operations::DbError;
use crate::models::{
    ImageAssetRef, Submission, SubmissionDetail, SubmissionStatus, SubmissionSummary,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

const SUBMISSION_COLUMNS: &str = "id, title, body, category, image_asset_id, image_url, status, rejection_reason, author_id, submitted_at, published_post_id";

const SUMMARY_SELECT: &str = "SELECT s.id, s.title, s.category, s.image_url, s.status, s.submitted_at, s.author_id, a.name, a.avatar_url, s.body
     FROM submissions s JOIN accounts a ON a.id = s.author_id";

fn parse_status(row: &Row, idx: usize) -> rusqlite::Result<SubmissionStatus> {
    let raw: String = row.get(idx)?;
    raw.parse::<SubmissionStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

fn submission_from_row(row: &Row) -> rusqlite::Result<Submission> {
    Ok(Submission {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        category: row.get(3)?,
        image: ImageAssetRef { id: row.get(4)?, url: row.get(5)? },
        status: parse_status(row, 6)?,
        rejection_reason: row.get(7)?,
        author_id: row.get(8)?,
        submitted_at: row.get(9)?,
        published_post_id: row.get(10)?,
    })
}

fn detail_from_row(row: &Row) -> rusqlite::Result<SubmissionDetail> {
    Ok(SubmissionDetail {
        summary: SubmissionSummary {
            id: row.get(0)?,
            title: row.get(1)?,
            category: row.get(2)?,
            image_url: row.get(3)?,
            status: parse_status(row, 4)?,
            submitted_date: row.get(5)?,
            author_id: row.get(6)?,
            author_name: row.get(7)?,
            author_image_url: row.get(8)?,
        },
        content: row.get(9)?,
    })
}

fn collect_summaries(
    stmt: &mut rusqlite::Statement,
    args: impl rusqlite::Params,
) -> Result<Vec<SubmissionSummary>, DbError> {
    let rows = stmt.query_map(args, detail_from_row)?;
    let mut summaries = Vec::new();
    for detail in rows {
        summaries.push(detail?.summary);
    }
    Ok(summaries)
}

pub fn insert_submission(
    conn: &Connection,
    title: &str,
    body: &str,
    category: &str,
    image: &ImageAssetRef,
    author_id: i64,
) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO submissions (title, body, category, image_asset_id, image_url, status, author_id, submitted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            title,
            body,
            category,
            image.id,
            image.url,
            SubmissionStatus::Pending.as_str(),
            author_id,
            Utc::now()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_submission(conn: &Connection, id: i64) -> Result<Option<Submission>, DbError> {
    let sql = format!("SELECT {} FROM submissions WHERE id = ?1", SUBMISSION_COLUMNS);
    Ok(conn.query_row(&sql, [id], submission_from_row).optional()?)
}

/// Flips a pending submission to approved. Returns 0 when the row is gone or
/// no longer pending, which is how a losing concurrent approval finds out.
pub fn mark_approved(conn: &Connection, id: i64, published_post_id: i64) -> Result<usize, DbError> {
    Ok(conn.execute(
        "UPDATE submissions SET status = ?3, published_post_id = ?2
         WHERE id = ?1 AND status = ?4",
        params![
            id,
            published_post_id,
            SubmissionStatus::Approved.as_str(),
            SubmissionStatus::Pending.as_str()
        ],
    )?)
}

pub fn delete_submission(conn: &Connection, id: i64) -> Result<usize, DbError> {
    Ok(conn.execute("DELETE FROM submissions WHERE id = ?1", [id])?)
}

/// The review queue: pending submissions, oldest first.
pub fn read_pending_summaries(
    conn: &Connection,
    limit: u32,
    offset: u32,
) -> Result<Vec<SubmissionSummary>, DbError> {
    let sql = format!(
        "{} WHERE s.status = 'pending' ORDER BY s.submitted_at ASC, s.id ASC LIMIT ?1 OFFSET ?2",
        SUMMARY_SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    collect_summaries(&mut stmt, params![limit, offset])
}

pub fn read_pending_detail(
    conn: &Connection,
    id: i64,
) -> Result<Option<SubmissionDetail>, DbError> {
    let sql = format!("{} WHERE s.id = ?1 AND s.status = 'pending'", SUMMARY_SELECT);
    Ok(conn.query_row(&sql, [id], detail_from_row).optional()?)
}

/// An author's own submissions in any status, newest first.
pub fn read_summaries_by_author(
    conn: &Connection,
    author_id: i64,
) -> Result<Vec<SubmissionSummary>, DbError> {
    let sql = format!(
        "{} WHERE s.author_id = ?1 ORDER BY s.submitted_at DESC, s.id DESC",
        SUMMARY_SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    collect_summaries(&mut stmt, [author_id])
}
