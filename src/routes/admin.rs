use crate::errors::ServiceError;
use crate::helper::form_helpers;
use crate::lifecycle::{self, PostEdit};
use crate::middleware::AuthenticatedAccount;
use crate::routes::author::draft_from_form;
use crate::routes::{with_conn, PageQuery};
use crate::{AppState, DbPool};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_QUEUE_PAGE: u32 = 50;

#[derive(Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    reason: String,
}

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/admin/blogs/create", web::post().to(create_post))
        .route("/admin/pending-blogs", web::get().to(pending_blogs))
        .route("/admin/pending-blogs/{id}", web::get().to(pending_blog))
        .route("/admin/blogs/approve/{id}", web::post().to(approve_blog))
        .route("/admin/blogs/reject/{id}", web::post().to(reject_blog))
        .route("/blogs/{id}", web::put().to(edit_post))
        .route("/blogs/{id}", web::delete().to(delete_post));
}

async fn create_post(
    auth: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let form = form_helpers::read_image_form(payload, "image", state.max_upload_bytes).await?;
    let assets = state.asset_store.clone();
    let post = with_conn(&pool, move |conn| {
        let draft = draft_from_form(&form);
        lifecycle::direct_publish(
            conn,
            assets.as_ref(),
            auth.account_id,
            &draft,
            form.image.as_ref(),
        )
    })
    .await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Blog published successfully.",
        "blog": post,
    })))
}

async fn pending_blogs(
    auth: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ServiceError> {
    let limit = query.limit.unwrap_or(DEFAULT_QUEUE_PAGE).clamp(1, 200);
    let offset = query.offset.unwrap_or(0);
    let pending = with_conn(&pool, move |conn| {
        lifecycle::pending_queue(conn, auth.account_id, limit, offset)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "pending_blogs": pending })))
}

async fn pending_blog(
    auth: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let submission_id = id.into_inner();
    let pending = with_conn(&pool, move |conn| {
        lifecycle::pending_submission(conn, auth.account_id, submission_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "blog": pending })))
}

async fn approve_blog(
    auth: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let submission_id = id.into_inner();
    let post = with_conn(
        &pool,
        move |conn| lifecycle::approve(conn, submission_id, auth.account_id),
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Blog approved and published.",
        "blog": post,
    })))
}

async fn reject_blog(
    auth: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    id: web::Path<i64>,
    body: web::Json<RejectRequest>,
) -> Result<HttpResponse, ServiceError> {
    let submission_id = id.into_inner();
    let reason = body.into_inner().reason;
    let assets = state.asset_store.clone();
    with_conn(&pool, move |conn| {
        lifecycle::reject(conn, assets.as_ref(), submission_id, &reason, auth.account_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Blog rejected and removed." })))
}

async fn edit_post(
    auth: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    id: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let post_id = id.into_inner();
    let form = form_helpers::read_image_form(payload, "image", state.max_upload_bytes).await?;
    let assets = state.asset_store.clone();
    let post = with_conn(&pool, move |conn| {
        let edit = PostEdit {
            title: form.owned("title"),
            body: form.owned("content"),
            category: form.owned("category"),
        };
        lifecycle::edit_published(
            conn,
            assets.as_ref(),
            post_id,
            auth.account_id,
            &edit,
            form.image.as_ref(),
        )
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Blog updated successfully.",
        "blog": post,
    })))
}

async fn delete_post(
    auth: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let post_id = id.into_inner();
    let assets = state.asset_store.clone();
    with_conn(&pool, move |conn| {
        lifecycle::delete_published(conn, assets.as_ref(), post_id, auth.account_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Blog deleted." })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::config_api;
    use crate::routes::test_support::{
        multipart_body, multipart_content_type, session_cookie, session_middleware, test_env,
    };
    use actix_web::{test, App};
    use serde_json::Value;

    #[actix_web::test]
    async fn test_review_flow() {
        let env = test_env();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(env.pool.clone()))
                .app_data(web::Data::new(env.app_state()))
                .wrap(session_middleware())
                .configure(config_api),
        )
        .await;
        let mut cookies = Vec::new();
        for (email, password, login_type) in [
            ("guest@example.com", "guestpw", "guest"),
            ("admin@example.com", "adminpw", "admin"),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/login")
                .set_json(json!({ "email": email, "password": password, "loginType": login_type }))
                .to_request();
            cookies.push(session_cookie(&test::call_service(&app, req).await));
        }
        let (guest, admin) = (cookies[0].clone(), cookies[1].clone());

        let mut ids = Vec::new();
        for title in ["First", "Second"] {
            let req = test::TestRequest::post()
                .uri("/api/blogs/submit")
                .cookie(guest.clone())
                .insert_header(("content-type", multipart_content_type()))
                .set_payload(multipart_body(
                    &[("title", title), ("content", "Body")],
                    Some("image"),
                ))
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            ids.push(body["submission"]["id"].as_i64().unwrap());
        }

        let req = test::TestRequest::get()
            .uri("/api/admin/pending-blogs")
            .cookie(guest.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);

        let req = test::TestRequest::get()
            .uri("/api/admin/pending-blogs")
            .cookie(admin.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["pending_blogs"][0]["title"], "First");
        assert_eq!(body["pending_blogs"][0]["author_name"], "Guest");

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/blogs/approve/{}", ids[0]))
            .cookie(admin.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let post_id = body["blog"]["id"].as_i64().unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/blogs/approve/{}", ids[0]))
            .cookie(admin.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 409);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/blogs/reject/{}", ids[1]))
            .cookie(admin.clone())
            .set_json(json!({ "reason": "" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/blogs/reject/{}", ids[1]))
            .cookie(admin.clone())
            .set_json(json!({ "reason": "Duplicate topic" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::get()
            .uri(&format!("/api/admin/pending-blogs/{}", ids[1]))
            .cookie(admin.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::put()
            .uri(&format!("/api/blogs/{}", post_id))
            .cookie(admin.clone())
            .insert_header(("content-type", multipart_content_type()))
            .set_payload(multipart_body(&[("title", "First, revised")], None))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["blog"]["title"], "First, revised");

        let req = test::TestRequest::delete()
            .uri(&format!("/api/blogs/{}", post_id))
            .cookie(guest)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/blogs/{}", post_id))
            .cookie(admin)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        assert_eq!(env.assets.upload_count(), 2);
        assert_eq!(env.assets.deleted_ids().len(), 2);
    }
}
