use crate::errors::ServiceError;
use crate::helper::account_helpers::{self, LoginRequest, SignupRequest};
use crate::helper::form_helpers;
use crate::lifecycle::load_account;
use crate::middleware::{end_session, start_session, AuthenticatedAccount};
use crate::models::AccountProfile;
use crate::routes::with_conn;
use crate::{AppState, DbPool};
use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/signup", web::post().to(signup))
        .route("/login", web::post().to(login))
        .route("/logout", web::post().to(logout))
        .route("/me", web::get().to(me))
        .route("/user/profile-image", web::post().to(change_profile_image));
}

async fn signup(
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = body.into_inner();
    let bcrypt_cost = state.bcrypt_cost;
    let account = with_conn(
        &pool,
        move |conn| account_helpers::signup(conn, bcrypt_cost, &request),
    )
    .await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Account created successfully!",
        "user": AccountProfile::from(&account),
    })))
}

async fn login(
    pool: web::Data<DbPool>,
    session: Session,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = body.into_inner();
    let account = with_conn(&pool, move |conn| account_helpers::login(conn, &request)).await?;
    start_session(&session, account.id)?;
    log::info!("Account {} logged in as {}.", account.id, account.role);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login successful!",
        "user": AccountProfile::from(&account),
    })))
}

async fn logout(session: Session) -> HttpResponse {
    end_session(&session);
    HttpResponse::Ok().json(json!({ "success": true, "message": "Logged out." }))
}

async fn me(
    auth: AuthenticatedAccount,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ServiceError> {
    let account = with_conn(&pool, move |conn| load_account(conn, auth.account_id)).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "user": AccountProfile::from(&account) })))
}

async fn change_profile_image(
    auth: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let form = form_helpers::read_image_form(
        payload,
        "profileImage",
        state.max_upload_bytes,
    )
    .await?;
    let assets = state.asset_store.clone();
    let account = with_conn(&pool, move |conn| {
        account_helpers::change_avatar(conn, assets.as_ref(), auth.account_id, form.image.as_ref())
    })
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Profile image updated successfully.",
        "user": AccountProfile::from(&account),
    })))
}
