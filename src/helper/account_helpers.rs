use crate::assets::{release_asset, AssetStore, ImageUpload, PROFILE_IMAGES_FOLDER};
use crate::errors::{ServiceError, ServiceResult};
use crate::helper::input_helpers::{checked_image, normalize_email, required_line, MAX_NAME_LEN};
use crate::lifecycle::load_account;
use crate::models::db_operations::{accounts_db_operations, is_unique_violation, DbError};
use crate::models::{Account, Role};
use rusqlite::Connection;
use serde::Deserialize;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub user_type: Role,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub login_type: String,
}

fn duplicate_email() -> ServiceError {
    ServiceError::Conflict("This email is already registered.".to_string())
}

pub fn signup(
    conn: &Connection,
    bcrypt_cost: u32,
    request: &SignupRequest,
) -> ServiceResult<Account> {
    let name = required_line("name", &request.name, MAX_NAME_LEN)?;
    let email = normalize_email(&request.email)?;
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::Validation(format!(
            "'password' must be at least {} characters.",
            MIN_PASSWORD_LEN
        )));
    }
    if request.password != request.confirm_password {
        return Err(ServiceError::Validation("Passwords do not match.".to_string()));
    }
    if !request.user_type.can_self_register() {
        return Err(ServiceError::Validation(format!(
            "Accounts of type '{}' cannot be created by signing up.",
            request.user_type
        )));
    }
    if accounts_db_operations::email_exists(conn, &email)? {
        return Err(duplicate_email());
    }

    let id = match accounts_db_operations::create_account(
        conn,
        &name,
        &email,
        &request.password,
        request.user_type,
        bcrypt_cost,
    ) {
        Ok(id) => id,
        // Lost a race with another signup for the same address.
        Err(DbError::Rusqlite(e)) if is_unique_violation(&e) => return Err(duplicate_email()),
        Err(e) => return Err(e.into()),
    };
    log::info!("New {} account {} registered.", request.user_type, id);
    load_account(conn, id)
}

/// Checks credentials and that the account's role matches the login form used.
pub fn login(conn: &Connection, request: &LoginRequest) -> ServiceResult<Account> {
    let expected = Role::from_login_type(request.login_type.trim()).ok_or_else(|| {
        ServiceError::Validation("'loginType' must be one of user, guest or admin.".to_string())
    })?;
    let email = request.email.trim().to_lowercase();

    let account = accounts_db_operations::verify_credentials(conn, &email, &request.password)?
        .ok_or_else(|| ServiceError::Unauthenticated("Invalid email or password.".to_string()))?;
    if account.role != expected {
        log::warn!(
            "Account {} ({}) tried to log in as {}.",
            account.id,
            account.role,
            expected
        );
        return Err(ServiceError::Unauthorized);
    }
    Ok(account)
}

/// Replaces the avatar. The old image is released once the account points
/// at the new one.
pub fn change_avatar(
    conn: &Connection,
    assets: &dyn AssetStore,
    account_id: i64,
    image: Option<&ImageUpload>,
) -> ServiceResult<Account> {
    let account = load_account(conn, account_id)?;
    let image = image
        .ok_or_else(|| ServiceError::Validation("'profileImage' is required.".to_string()))
        .and_then(checked_image)?;

    let asset = assets.upload(image, PROFILE_IMAGES_FOLDER)?;
    if let Err(e) = accounts_db_operations::update_avatar(conn, account.id, &asset) {
        release_asset(assets, &asset);
        return Err(e.into());
    }
    if let Some(previous) = &account.avatar {
        release_asset(assets, previous);
    }

    log::info!("Account {} changed its profile image.", account.id);
    load_account(conn, account.id)
}
