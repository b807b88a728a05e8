use blogbase_backend::config::Config;
use blogbase_backend::helper::account_helpers::MIN_PASSWORD_LEN;
use blogbase_backend::helper::input_helpers::normalize_email;
use blogbase_backend::models::db_operations::accounts_db_operations;
use blogbase_backend::models::Role;
use blogbase_backend::setup::db_setup;
use clap::{Parser, Subcommand};
use rand::RngCore;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "setup_cli",
    author,
    version,
    about = "A CLI for initial blog backend setup.",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file. Required by every command except `secret generate`.
    #[arg(long, global = true, value_name = "FILE")]
    env_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    /// Creates the blog database and its tables.
    Setup,
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    List,
    ChangePassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        new_password: String,
    },
}

#[derive(Subcommand, Debug)]
enum SecretAction {
    /// Prints a random 64-byte key, hex encoded, for SESSION_SECRET_KEY.
    Generate,
}

fn load_config(env_file: Option<&PathBuf>) -> Config {
    let env_file = env_file.expect("FATAL: --env-file <FILE> is required for this command.");
    Config::from_env(env_file).expect("FATAL: Failed to load or parse configuration.")
}

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Db { action } => match action {
            DbAction::Setup => setup_blog_database(&load_config(cli.env_file.as_ref())),
        },
        Commands::Admin { action } => {
            let config = load_config(cli.env_file.as_ref());
            match action {
                AdminAction::Create { name, email, password } => {
                    create_admin_account(&config, name, email, password);
                }
                AdminAction::List => list_admin_accounts(&config),
                AdminAction::ChangePassword { email, new_password } => {
                    change_admin_password(&config, email, new_password);
                }
            }
        }
        Commands::Secret { action } => match action {
            SecretAction::Generate => generate_secret(),
        },
    }
}

fn setup_blog_database(config: &Config) {
    let db_path = config.blog_db_path();
    if db_path.exists() {
        println!(
            "ℹ️ Blog database already exists at '{}'. Skipping creation.",
            db_path.display()
        );
        return;
    }
    println!("\nSetting up blog database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }
    fs::create_dir_all(&config.media_path).expect("Could not create media directory.");

    let mut conn = Connection::open(&db_path).expect("Could not create blog database file.");
    match db_setup::setup_blog_db(&mut conn) {
        Ok(_) => println!("✅ Blog database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up blog database: {}", e),
    }
}

fn open_existing(config: &Config) -> Option<Connection> {
    let db_path = config.blog_db_path();
    if !db_path.exists() {
        eprintln!(
            "❌ Error: Blog database not found at '{}'. Please run `setup_cli db setup` first.",
            db_path.display()
        );
        return None;
    }
    match Connection::open(&db_path) {
        Ok(conn) => Some(conn),
        Err(e) => {
            eprintln!("❌ Error opening blog database: {}", e);
            None
        }
    }
}

fn create_admin_account(config: &Config, name: &str, email: &str, password: &str) {
    let email = match normalize_email(email) {
        Ok(email) => email,
        Err(e) => return eprintln!("❌ Error: {}", e),
    };
    if password.chars().count() < MIN_PASSWORD_LEN {
        return eprintln!(
            "❌ Error: The password must be at least {} characters.",
            MIN_PASSWORD_LEN
        );
    }
    let Some(conn) = open_existing(config) else { return };

    match accounts_db_operations::create_account(
        &conn,
        name.trim(),
        &email,
        password,
        Role::Admin,
        config.bcrypt_cost,
    ) {
        Ok(id) => println!("✅ Admin account '{}' created with id {}.", email, id),
        Err(e) => eprintln!(
            "❌ Error creating admin account: {}. The email might already be registered.",
            e
        ),
    }
}

fn list_admin_accounts(config: &Config) {
    let Some(conn) = open_existing(config) else { return };

    println!("Listing Admin Accounts:");
    match accounts_db_operations::read_accounts_by_role(&conn, Role::Admin) {
        Ok(admins) if admins.is_empty() => println!("(none)"),
        Ok(admins) => {
            for admin in admins {
                println!("- {} <{}> (id {})", admin.name, admin.email, admin.id);
            }
        }
        Err(e) => eprintln!("❌ Error fetching admins: {}", e),
    }
}

fn change_admin_password(config: &Config, email: &str, new_password: &str) {
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return eprintln!(
            "❌ Error: The password must be at least {} characters.",
            MIN_PASSWORD_LEN
        );
    }
    let Some(conn) = open_existing(config) else { return };
    let email = email.trim().to_lowercase();

    match accounts_db_operations::read_account_by_email(&conn, &email) {
        Ok(Some(account)) if account.role == Role::Admin => {}
        Ok(_) => return eprintln!("❌ Error: No admin account with email '{}' found.", email),
        Err(e) => return eprintln!("❌ Error looking up account: {}", e),
    }
    match accounts_db_operations::update_password(&conn, &email, new_password, config.bcrypt_cost) {
        Ok(_) => println!("✅ Password for admin account '{}' changed successfully.", email),
        Err(e) => eprintln!("❌ Error updating password: {}", e),
    }
}

fn generate_secret() {
    let mut key = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut key);
    println!("{}", hex::encode(key));
}
