use crate::models::db_operations::DbError;
use crate::models::{Account, ImageAssetRef, Role};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

const ACCOUNT_COLUMNS: &str =
    "id, name, email, password_hash, role, avatar_asset_id, avatar_url, created_at";

fn account_from_row(row: &Row) -> rusqlite::Result<Account> {
    let role_str: String = row.get(4)?;
    let role = role_str.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
    })?;
    let avatar_id: Option<String> = row.get(5)?;
    let avatar_url: Option<String> = row.get(6)?;
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role,
        avatar: avatar_id.zip(avatar_url).map(|(id, url)| ImageAssetRef { id, url }),
        created_at: row.get(7)?,
    })
}

/// Hashes the password and inserts the account, returning its id.
/// A duplicate email surfaces as a UNIQUE constraint failure.
pub fn create_account(
    conn: &Connection,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    bcrypt_cost: u32,
) -> Result<i64, DbError> {
    let password_hash = bcrypt::hash(password, bcrypt_cost)?;
    conn.execute(
        "INSERT INTO accounts (name, email, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, email, password_hash, role.as_str(), Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_account_by_id(conn: &Connection, id: i64) -> Result<Option<Account>, DbError> {
    let sql = format!("SELECT {} FROM accounts WHERE id = ?1", ACCOUNT_COLUMNS);
    Ok(conn.query_row(&sql, [id], account_from_row).optional()?)
}

pub fn read_account_by_email(conn: &Connection, email: &str) -> Result<Option<Account>, DbError> {
    let sql = format!("SELECT {} FROM accounts WHERE email = ?1", ACCOUNT_COLUMNS);
    Ok(conn.query_row(&sql, [email], account_from_row).optional()?)
}

pub fn read_accounts_by_role(conn: &Connection, role: Role) -> Result<Vec<Account>, DbError> {
    let sql = format!("SELECT {} FROM accounts WHERE role = ?1 ORDER BY id", ACCOUNT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([role.as_str()], account_from_row)?;
    let mut accounts = Vec::new();
    for account in rows {
        accounts.push(account?);
    }
    Ok(accounts)
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool, DbError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = ?1)",
        [email],
        |row| row.get(0),
    )?)
}

/// Returns the account when the password matches its stored hash.
pub fn verify_credentials(
    conn: &Connection,
    email: &str,
    password: &str,
) -> Result<Option<Account>, DbError> {
    let account = match read_account_by_email(conn, email)? {
        Some(account) => account,
        None => return Ok(None),
    };
    if bcrypt::verify(password, &account.password_hash).unwrap_or(false) {
        Ok(Some(account))
    } else {
        Ok(None)
    }
}

pub fn update_avatar(
    conn: &Connection,
    account_id: i64,
    avatar: &ImageAssetRef,
) -> Result<usize, DbError> {
    Ok(conn.execute(
        "UPDATE accounts SET avatar_asset_id = ?1, avatar_url = ?2 WHERE id = ?3",
        params![avatar.id, avatar.url, account_id],
    )?)
}

pub fn update_password(
    conn: &Connection,
    email: &str,
    new_password: &str,
    bcrypt_cost: u32,
) -> Result<usize, DbError> {
    let password_hash = bcrypt::hash(new_password, bcrypt_cost)?;
    Ok(conn.execute(
        "UPDATE accounts SET password_hash = ?1 WHERE email = ?2",
        params![password_hash, email],
    )?)
}
