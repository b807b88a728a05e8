use crate::models::db_operations::DbError;
use crate::models::{ImageAssetRef, PostFilter, PostSummary, PublishedPost};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const POST_COLUMNS: &str =
    "id, title, body, category, image_asset_id, image_url, author_id, created_at, updated_at";

fn post_from_row(row: &Row) -> rusqlite::Result<PublishedPost> {
    Ok(PublishedPost {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        category: row.get(3)?,
        image: ImageAssetRef { id: row.get(4)?, url: row.get(5)? },
        author_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Inserts a published post and returns its id. The image reference is
/// stored as given; callers transferring an existing asset pass it unchanged.
pub fn insert_post(
    conn: &Connection,
    title: &str,
    body: &str,
    category: &str,
    image: &ImageAssetRef,
    author_id: i64,
    created_at: DateTime<Utc>,
) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO posts (title, body, category, image_asset_id, image_url, author_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![title, body, category, image.id, image.url, author_id, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_post(conn: &Connection, id: i64) -> Result<Option<PublishedPost>, DbError> {
    let sql = format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS);
    Ok(conn.query_row(&sql, [id], post_from_row).optional()?)
}

pub fn update_post(
    conn: &Connection,
    id: i64,
    title: &str,
    body: &str,
    category: &str,
    image: &ImageAssetRef,
) -> Result<usize, DbError> {
    Ok(conn.execute(
        "UPDATE posts SET title = ?1, body = ?2, category = ?3, image_asset_id = ?4, image_url = ?5, updated_at = ?6
         WHERE id = ?7",
        params![title, body, category, image.id, image.url, Utc::now(), id],
    )?)
}

/// Deletes a post together with its comments. Returns the number of post rows removed.
pub fn delete_post(conn: &Connection, id: i64) -> Result<usize, DbError> {
    conn.execute("DELETE FROM comments WHERE post_id = ?1", [id])?;
    Ok(conn.execute("DELETE FROM posts WHERE id = ?1", [id])?)
}

/// Escapes `LIKE` wildcards so user text only ever matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Reader listing, newest first, optionally narrowed by a free-text search
/// over title and body and by an exact category.
pub fn read_post_summaries(
    conn: &Connection,
    filter: &PostFilter,
    limit: u32,
    offset: u32,
) -> Result<Vec<PostSummary>, DbError> {
    let mut sql = String::from(
        "SELECT p.id, p.title, p.body, p.category, p.image_url, p.created_at, p.author_id, a.name
         FROM posts p JOIN accounts a ON a.id = p.author_id WHERE 1 = 1",
    );
    let mut args: Vec<Value> = Vec::new();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
        sql.push_str(&format!(
            " AND (lower(p.title) LIKE ?{} ESCAPE '\\' OR lower(p.body) LIKE ?{} ESCAPE '\\')",
            args.len() + 1,
            args.len() + 1
        ));
        args.push(Value::Text(pattern));
    }
    if let Some(category) = filter.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        sql.push_str(&format!(" AND p.category = ?{}", args.len() + 1));
        args.push(Value::Text(category.to_string()));
    }
    sql.push_str(&format!(
        " ORDER BY p.created_at DESC, p.id DESC LIMIT ?{} OFFSET ?{}",
        args.len() + 1,
        args.len() + 2
    ));
    args.push(Value::Integer(i64::from(limit)));
    args.push(Value::Integer(i64::from(offset)));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
        Ok(PostSummary {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            category: row.get(3)?,
            image_url: row.get(4)?,
            pub_date: row.get(5)?,
            author_id: row.get(6)?,
            author_name: row.get(7)?,
        })
    })?;

    let mut posts = Vec::new();
    for post in rows {
        posts.push(post?);
    }
    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::db_operations::{accounts_db_operations, comments_db_operations};
    use crate::models::Role;
    use crate::setup::db_setup;
    use chrono::Duration;

    fn setup() -> (Connection, i64) {
        let mut conn = Connection::open_in_memory().unwrap();
        db_setup::setup_blog_db(&mut conn).unwrap();
        let author = accounts_db_operations::create_account(
            &conn,
            "Admin",
            "admin@example.com",
            "pw",
            Role::Admin,
            4,
        )
        .unwrap();
        (conn, author)
    }

    fn image(n: u32) -> ImageAssetRef {
        ImageAssetRef {
            id: format!("blog_images/{n}.png"),
            url: format!("http://h/media/blog_images/{n}.png"),
        }
    }

    #[test]
    fn test_listing_is_newest_first_and_filters() {
        let (conn, author) = setup();
        let t0 = Utc::now();
        insert_post(&conn, "React Hooks", "state in functions", "Tech", &image(1), author, t0)
            .unwrap();
        insert_post(
            &conn,
            "Leh-Ladakh",
            "mountains",
            "Lifestyle",
            &image(2),
            author,
            t0 + Duration::seconds(1),
        )
        .unwrap();
        insert_post(
            &conn,
            "Tech news",
            "AI breakthroughs",
            "News",
            &image(3),
            author,
            t0 + Duration::seconds(2),
        )
        .unwrap();

        let all = read_post_summaries(&conn, &PostFilter::default(), 10, 0).unwrap();
        let titles: Vec<_> = all.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Tech news", "Leh-Ladakh", "React Hooks"]);
        assert_eq!(all[0].author_name, "Admin");

        let tech = read_post_summaries(
            &conn,
            &PostFilter { category: Some("Tech".into()), ..Default::default() },
            10,
            0,
        )
        .unwrap();
        assert_eq!(tech.len(), 1);

        let search = read_post_summaries(
            &conn,
            &PostFilter { search: Some("TECH".into()), ..Default::default() },
            10,
            0,
        )
        .unwrap();
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].title, "Tech news");

        let page = read_post_summaries(&conn, &PostFilter::default(), 1, 1).unwrap();
        assert_eq!(page[0].title, "Leh-Ladakh");
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let (conn, author) = setup();
        insert_post(&conn, "100% Rust", "snake_case names", "Tech", &image(1), author, Utc::now())
            .unwrap();
        insert_post(&conn, "Other", "plain", "Tech", &image(2), author, Utc::now()).unwrap();

        let search = |q: &str| {
            let filter = PostFilter { search: Some(q.into()), ..Default::default() };
            read_post_summaries(&conn, &filter, 10, 0).unwrap()
        };
        assert_eq!(search("%").len(), 1);
        assert_eq!(search("e_c").len(), 1);
        assert!(search("0%r").is_empty());
        assert!(search("\\").is_empty());
    }

    #[test]
    fn test_delete_removes_comments() {
        let (conn, author) = setup();
        let post_id = insert_post(&conn, "T", "B", "Tech", &image(1), author, Utc::now()).unwrap();
        comments_db_operations::insert_comment(&conn, post_id, author, "nice").unwrap();

        assert_eq!(delete_post(&conn, post_id).unwrap(), 1);
        assert!(read_post(&conn, post_id).unwrap().is_none());
        assert!(comments_db_operations::read_comments_for_post(&conn, post_id).unwrap().is_empty());
        assert_eq!(delete_post(&conn, post_id).unwrap(), 0);
    }
}
