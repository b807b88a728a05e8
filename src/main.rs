use actix_cors::Cors;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::http::header;
use actix_web::{cookie::Key, middleware::{DefaultHeaders, Logger}, web, App, HttpServer};
use blogbase_backend::{
    assets::local::LocalAssetStore, build_pool, config::Config, routes, AppState,
};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "blogbase_server", author, version, about = "Starts the blog backend web server.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

fn build_cors(allowed_origins: &str) -> Cors {
    let cors = if allowed_origins.trim() == "*" {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };
    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let db_path = config.blog_db_path();
    if !db_path.exists() {
        panic!(
            "FATAL: blog.db not found at '{}'. Run 'cargo run --bin setup_cli -- --env-file <path> db setup'",
            db_path.display()
        );
    }
    let pool = build_pool(&db_path).expect("FATAL: Failed to create Rusqlite connection pool.");

    fs::create_dir_all(&config.media_path).expect("Failed to create media directory");
    let asset_store = LocalAssetStore::new(&config.media_path, config.media_base_url());
    log::info!("Storing image assets under '{}'.", asset_store.root().display());

    let app_state = web::Data::new(AppState {
        asset_store: Arc::new(asset_store),
        bcrypt_cost: config.bcrypt_cost,
        max_upload_bytes: config.max_upload_size_bytes(),
    });
    let pool_data = web::Data::new(pool);

    let session_key_bytes = hex::decode(&config.session_secret_key)
        .expect("FATAL: SESSION_SECRET_KEY in .env is not a valid hex string.");
    let session_key = Key::try_from(session_key_bytes.as_slice())
        .expect("FATAL: The decoded SESSION_SECRET_KEY is not long enough (minimum 64 bytes required).");

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!("Server starting at http://{}", server_address);

    HttpServer::new(move || {
        let session_mw =
            SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                .cookie_secure(config.use_secure_cookies)
                .cookie_http_only(true)
                .cookie_same_site(actix_web::cookie::SameSite::Lax)
                .build();

        App::new()
            .wrap(session_mw)
            .wrap(build_cors(&config.allowed_origins))
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY")),
            )
            .app_data(pool_data.clone())
            .app_data(app_state.clone())
            .app_data(routes::json_config())
            .configure(routes::config_api)
            .service(actix_files::Files::new("/media", &config.media_path))
            .route("/", web::get().to(routes::root_handler))
    })
    .bind(server_address)?
    .run()
    .await
}
