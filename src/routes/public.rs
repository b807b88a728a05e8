use crate::errors::ServiceError;
use crate::helper::public_helpers;
use crate::middleware::AuthenticatedAccount;
use crate::routes::with_conn;
use crate::DbPool;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct PostListQuery {
    q: Option<String>,
    category: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

#[derive(Deserialize)]
pub struct CommentRequest {
    content: String,
}

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/blogs", web::get().to(list_posts))
        .route("/blogs/{id}", web::get().to(get_post))
        .route("/blogs/{id}/comments", web::post().to(add_comment))
        .route("/comments/{id}", web::delete().to(delete_comment));
}

async fn list_posts(
    pool: web::Data<DbPool>,
    query: web::Query<PostListQuery>,
) -> Result<HttpResponse, ServiceError> {
    let query = query.into_inner();
    let filter = public_helpers::post_filter(query.q.as_deref(), query.category.as_deref());
    let posts = with_conn(&pool, move |conn| {
        public_helpers::fetch_posts(conn, &filter, query.limit, query.offset)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "blogs": posts })))
}

async fn get_post(
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let post_id = id.into_inner();
    let post = with_conn(
        &pool,
        move |conn| public_helpers::fetch_post_detail(conn, post_id),
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "blog": post })))
}

async fn add_comment(
    auth: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
    body: web::Json<CommentRequest>,
) -> Result<HttpResponse, ServiceError> {
    let post_id = id.into_inner();
    let content = body.into_inner().content;
    let comment = with_conn(&pool, move |conn| {
        public_helpers::add_comment(conn, post_id, auth.account_id, &content)
    })
    .await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Comment added.",
        "comment": comment,
    })))
}

async fn delete_comment(
    auth: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let comment_id = id.into_inner();
    with_conn(
        &pool,
        move |conn| public_helpers::delete_comment(conn, comment_id, auth.account_id),
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Comment deleted." })))
}
