use crate::errors::{ServiceError, ServiceResult};
use crate::DbPool;
use actix_web::{web, HttpResponse, Responder};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

pub mod account;
pub mod admin;
pub mod author;
pub mod public;

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Mounts every JSON endpoint under `/api`. Session middleware is applied by
/// the caller so tests can supply their own.
pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .configure(account::config_routes)
            .configure(author::config_routes)
            .configure(public::config_routes)
            .configure(admin::config_routes),
    );
}

/// Malformed JSON bodies get the same error shape as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        ServiceError::Validation(format!("Invalid request body: {}", err)).into()
    })
}

pub async fn root_handler() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "Backend server is running!" }))
}

/// Runs blocking database work on the blocking thread pool with a pooled connection.
pub async fn with_conn<T, F>(pool: &web::Data<DbPool>, work: F) -> ServiceResult<T>
where
    F: FnOnce(&mut Connection) -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    web::block(move || {
        let mut conn = pool.get()?;
        work(&mut conn)
    })
    .await?
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::assets::recording::RecordingAssetStore;
    use crate::models::db_operations::accounts_db_operations;
    use crate::models::Role;
    use crate::setup::db_setup;
    use crate::{build_pool, AppState, DbPool};
    use actix_session::storage::CookieSessionStore;
    use actix_session::SessionMiddleware;
    use actix_web::cookie::{Cookie, Key};
    use actix_web::dev::ServiceResponse;
    use std::sync::Arc;
    use tempfile::TempDir;

    pub struct TestEnv {
        pub _dir: TempDir,
        pub pool: DbPool,
        pub assets: Arc<RecordingAssetStore>,
        pub admin: i64,
        pub guest: i64,
        pub reader: i64,
    }

    pub fn test_env() -> TestEnv {
        let dir = TempDir::new().unwrap();
        let pool = build_pool(&dir.path().join("blog.db")).unwrap();
        let mut conn = pool.get().unwrap();
        db_setup::setup_blog_db(&mut conn).unwrap();
        let admin = accounts_db_operations::create_account(
            &conn,
            "Admin",
            "admin@example.com",
            "adminpw",
            Role::Admin,
            4,
        )
        .unwrap();
        let guest = accounts_db_operations::create_account(
            &conn,
            "Guest",
            "guest@example.com",
            "guestpw",
            Role::GuestAuthor,
            4,
        )
        .unwrap();
        let reader = accounts_db_operations::create_account(
            &conn,
            "Reader",
            "reader@example.com",
            "readerpw",
            Role::NormalUser,
            4,
        )
        .unwrap();
        TestEnv {
            _dir: dir,
            pool,
            assets: Arc::new(RecordingAssetStore::new()),
            admin,
            guest,
            reader,
        }
    }

    impl TestEnv {
        pub fn app_state(&self) -> AppState {
            AppState {
                asset_store: self.assets.clone(),
                bcrypt_cost: 4,
                max_upload_bytes: 1024 * 1024,
            }
        }
    }

    pub fn session_middleware() -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), Key::from(&[7u8; 64]))
            .cookie_secure(false)
            .build()
    }

    pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
        resp.response()
            .cookies()
            .find(|c| c.name() == "id")
            .expect("login response sets a session cookie")
            .into_owned()
    }

    pub const BOUNDARY: &str = "----blogbase-test-boundary";

    /// Builds a multipart body with text fields and an optional PNG part named `file_field`.
    pub fn multipart_body(fields: &[(&str, &str)], file_field: Option<&str>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some(name) = file_field {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"cover.png\"\r\nContent-Type: image/png\r\n\r\n",
                    BOUNDARY, name
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"\x89PNG\r\n\x1a\n");
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    pub fn multipart_content_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }
}
