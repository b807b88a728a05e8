use crate::errors::{ServiceError, ServiceResult};
use crate::helper::input_helpers::{required_text, MAX_COMMENT_LEN};
use crate::helper::sanitization_helpers::escape_text;
use crate::lifecycle::load_account;
use crate::models::db_operations::{
    accounts_db_operations, comments_db_operations, posts_db_operations,
};
use crate::models::{Comment, PostDetail, PostFilter, PostSummary};
use rusqlite::Connection;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Turns raw query parameters into a filter. `All` and blank values mean "no filter".
/// Stored titles and bodies are HTML-escaped, so the search text is escaped the same way.
pub fn post_filter(search: Option<&str>, category: Option<&str>) -> PostFilter {
    fn meaningful(value: Option<&str>) -> Option<String> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
            .map(str::to_string)
    }
    PostFilter {
        search: meaningful(search).map(|s| escape_text(&s)),
        category: meaningful(category).map(|c| escape_text(&c)),
    }
}

pub fn fetch_posts(
    conn: &Connection,
    filter: &PostFilter,
    limit: Option<u32>,
    offset: Option<u32>,
) -> ServiceResult<Vec<PostSummary>> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    Ok(posts_db_operations::read_post_summaries(conn, filter, limit, offset.unwrap_or(0))?)
}

pub fn fetch_post_detail(conn: &Connection, post_id: i64) -> ServiceResult<PostDetail> {
    let post = posts_db_operations::read_post(conn, post_id)?
        .ok_or_else(|| ServiceError::NotFound(format!("Blog post {} not found.", post_id)))?;
    let author = accounts_db_operations::read_account_by_id(conn, post.author_id)?;
    let comments = comments_db_operations::read_comments_for_post(conn, post_id)?;

    Ok(PostDetail {
        id: post.id,
        title: post.title,
        content: post.body,
        category: post.category,
        image_url: post.image.url,
        pub_date: post.created_at,
        updated_at: post.updated_at,
        author_id: post.author_id,
        author_name: author.as_ref().map(|a| a.name.clone()).unwrap_or_default(),
        author_image_url: author.as_ref().and_then(|a| a.avatar_url()).map(str::to_string),
        comments,
    })
}

pub fn add_comment(
    conn: &Connection,
    post_id: i64,
    account_id: i64,
    body: &str,
) -> ServiceResult<Comment> {
    let account = load_account(conn, account_id)?;
    let body = required_text("content", body, MAX_COMMENT_LEN)?;
    if posts_db_operations::read_post(conn, post_id)?.is_none() {
        return Err(ServiceError::NotFound(format!("Blog post {} not found.", post_id)));
    }

    let id = comments_db_operations::insert_comment(conn, post_id, account.id, &body)?;
    comments_db_operations::read_comment(conn, id)?
        .ok_or_else(|| ServiceError::NotFound(format!("Comment {} not found.", id)))
}

/// Only the comment's author may delete it.
pub fn delete_comment(conn: &Connection, comment_id: i64, requester_id: i64) -> ServiceResult<()> {
    let comment = comments_db_operations::read_comment(conn, comment_id)?
        .ok_or_else(|| ServiceError::NotFound(format!("Comment {} not found.", comment_id)))?;
    if comment.author_id != requester_id {
        return Err(ServiceError::Unauthorized);
    }
    comments_db_operations::delete_comment(conn, comment_id)?;
    Ok(())
}
