use crate::errors::ServiceError;
use crate::helper::form_helpers::{self, ImageForm};
use crate::lifecycle::{self, PostDraft};
use crate::middleware::AuthenticatedAccount;
use crate::routes::with_conn;
use crate::{AppState, DbPool};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/blogs/submit", web::post().to(submit_post))
        .route("/author/my-posts", web::get().to(my_posts))
        .route("/author/my-posts/{id}", web::delete().to(withdraw_post));
}

/// The text parts of a post form. Missing parts become empty strings and are
/// reported by validation with the field's name.
pub fn draft_from_form(form: &ImageForm) -> PostDraft {
    PostDraft {
        title: form.text_or_empty("title"),
        body: form.text_or_empty("content"),
        category: form.owned("category"),
    }
}

async fn submit_post(
    auth: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let form = form_helpers::read_image_form(payload, "image", state.max_upload_bytes).await?;
    let assets = state.asset_store.clone();
    let submission = with_conn(&pool, move |conn| {
        let draft = draft_from_form(&form);
        lifecycle::submit(conn, assets.as_ref(), auth.account_id, &draft, form.image.as_ref())
    })
    .await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Blog submitted successfully for review.",
        "submission": submission,
    })))
}

async fn my_posts(
    auth: AuthenticatedAccount,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    let posts = with_conn(
        &pool,
        move |conn| lifecycle::own_submissions(conn, auth.account_id),
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "my_posts": posts })))
}

async fn withdraw_post(
    auth: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let submission_id = id.into_inner();
    let assets = state.asset_store.clone();
    with_conn(&pool, move |conn| {
        lifecycle::withdraw_own(conn, assets.as_ref(), submission_id, auth.account_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Submission withdrawn." })))
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
    async fn test_submit_list_and_withdraw() {
        let env = test_env();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(env.pool.clone()))
                .app_data(web::Data::new(env.app_state()))
                .wrap(session_middleware())
                .configure(config_api),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({
                "email": "guest@example.com",
                "password": "guestpw",
                "loginType": "guest"
            }))
            .to_request();
        let cookie = session_cookie(&test::call_service(&app, req).await);

        let req = test::TestRequest::post()
            .uri("/api/blogs/submit")
            .cookie(cookie.clone())
            .insert_header(("content-type", multipart_content_type()))
            .set_payload(multipart_body(&[("title", "Hooks"), ("content", "useState")], None))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        assert_eq!(env.assets.upload_count(), 0);

        let req = test::TestRequest::post()
            .uri("/api/blogs/submit")
            .cookie(cookie.clone())
            .insert_header(("content-type", multipart_content_type()))
            .set_payload(multipart_body(
                &[("title", "Hooks"), ("content", "useState"), ("category", "Tech")],
                Some("image"),
            ))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["submission"]["status"], "pending");
        let submission_id = body["submission"]["id"].as_i64().unwrap();
        assert_eq!(env.assets.upload_count(), 1);

        let req = test::TestRequest::get()
            .uri("/api/author/my-posts")
            .cookie(cookie.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["my_posts"][0]["id"], submission_id);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/author/my-posts/{}", submission_id))
            .cookie(cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(env.assets.deleted_ids().len(), 1);
    }

    #[actix_web::test]
    async fn test_reader_cannot_submit() {
        let env = test_env();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(env.pool.clone()))
                .app_data(web::Data::new(env.app_state()))
                .wrap(session_middleware())
                .configure(config_api),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({
                "email": "reader@example.com",
                "password": "readerpw",
                "loginType": "user"
            }))
            .to_request();
        let cookie = session_cookie(&test::call_service(&app, req).await);

        let req = test::TestRequest::post()
            .uri("/api/blogs/submit")
            .cookie(cookie)
            .insert_header(("content-type", multipart_content_type()))
            .set_payload(multipart_body(&[("title", "Hi"), ("content", "Body")], Some("image")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "unauthorized");
        assert_eq!(env.assets.upload_count(), 0);
    }
}
