use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CATEGORY: &str = "General";

/// Flat authorization tier stored on every account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Normal User")]
    NormalUser,
    #[serde(rename = "Guest Author")]
    GuestAuthor,
    #[serde(rename = "Admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::NormalUser => "Normal User",
            Role::GuestAuthor => "Guest Author",
            Role::Admin => "Admin",
        }
    }

    /// Roles allowed to put posts into the review queue.
    pub fn can_submit(&self) -> bool {
        matches!(self, Role::GuestAuthor | Role::Admin)
    }

    pub fn can_moderate(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Admin accounts are only created through `setup_cli`.
    pub fn can_self_register(&self) -> bool {
        !matches!(self, Role::Admin)
    }

    /// Maps the `loginType` sent by the login forms to the role it expects.
    pub fn from_login_type(login_type: &str) -> Option<Role> {
        match login_type {
            "user" => Some(Role::NormalUser),
            "guest" => Some(Role::GuestAuthor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal User" => Ok(Role::NormalUser),
            "Guest Author" => Ok(Role::GuestAuthor),
            "Admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// An uploaded image: the store's opaque id plus a URL readers can fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAssetRef {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(rename = "user_type")]
    pub role: Role,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip)]
    pub avatar: Option<ImageAssetRef>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar.as_ref().map(|a| a.url.as_str())
    }
}

/// Public view of an account, as returned by login and `/api/me`.
#[derive(Debug, Serialize)]
pub struct AccountProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub user_type: Role,
    pub profile_image_url: Option<String>,
}

impl From<&Account> for AccountProfile {
    fn from(account: &Account) -> Self {
        AccountProfile {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            user_type: account.role,
            profile_image_url: account.avatar_url().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishedPost {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub category: String,
    pub image: ImageAssetRef,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
        }
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "approved" => Ok(SubmissionStatus::Approved),
            other => Err(format!("unknown submission status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub category: String,
    pub image: ImageAssetRef,
    pub status: SubmissionStatus,
    pub rejection_reason: Option<String>,
    pub author_id: i64,
    pub submitted_at: DateTime<Utc>,
    pub published_post_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub author_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

// --- Read models joined with author details ---

#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub image_url: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub author_name: String,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub content: String,
    pub pub_date: DateTime<Utc>,
    pub commenter_id: i64,
    pub commenter_name: String,
    pub commenter_image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub image_url: String,
    pub pub_date: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub author_id: i64,
    pub author_name: String,
    pub author_image_url: Option<String>,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionSummary {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub image_url: String,
    pub status: SubmissionStatus,
    pub submitted_date: DateTime<Utc>,
    pub author_id: i64,
    pub author_name: String,
    pub author_image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionDetail {
    #[serde(flatten)]
    pub summary: SubmissionSummary,
    pub content: String,
}

/// Optional filters for the reader listing.
#[derive(Debug, Default, Clone)]
pub struct PostFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

pub mod db_operations;
