//! Submission lifecycle.
//!
//! Moves a post from review to published or discarded and keeps its image
//! asset in step with the record that owns it. Callers pass only an account
//! id; the role is re-read from the database on every call.
//!
//! Writes that must agree with each other run in one `IMMEDIATE`
//! transaction, so two admins acting on the same submission queue on
//! SQLite's write lock and the second sees the first one's result.

use crate::assets::{release_asset, AssetStore, ImageUpload, BLOG_IMAGES_FOLDER};
use crate::errors::{ServiceError, ServiceResult};
use crate::helper::input_helpers::{
    category_or_default, checked_image, required_body, required_image, required_line,
    MAX_TITLE_LEN,
};
use crate::models::db_operations::{
    accounts_db_operations, posts_db_operations, submissions_db_operations,
};
use crate::models::{
    Account, ImageAssetRef, PublishedPost, Submission, SubmissionDetail, SubmissionStatus,
    SubmissionSummary,
};
use chrono::Utc;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Deserialize;


/// Content for a new submission or post, as sent by the client.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
    pub category: Option<String>,
}

/// Changes to a published post. Absent or blank fields are left as they are.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostEdit {
    pub title: Option<String>,
    pub body: Option<String>,
    pub category: Option<String>,
}

struct CleanDraft {
    title: String,
    body: String,
    category: String,
}

#[derive(Default)]
struct CleanEdit {
    title: Option<String>,
    body: Option<String>,
    category: Option<String>,
}

impl CleanEdit {
    fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.category.is_none()
    }
}

fn clean_draft(draft: &PostDraft) -> ServiceResult<CleanDraft> {
    Ok(CleanDraft {
        title: required_line("title", &draft.title, MAX_TITLE_LEN)?,
        body: required_body("body", &draft.body)?,
        category: category_or_default(draft.category.as_deref())?,
    })
}

fn clean_edit(edit: &PostEdit) -> ServiceResult<CleanEdit> {
    fn provided(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|v| !v.trim().is_empty())
    }
    Ok(CleanEdit {
        title: provided(&edit.title)
            .map(|t| required_line("title", t, MAX_TITLE_LEN))
            .transpose()?,
        body: provided(&edit.body).map(|b| required_body("body", b)).transpose()?,
        category: provided(&edit.category)
            .map(|c| category_or_default(Some(c)))
            .transpose()?,
    })
}

/// Loads the acting account. An id with no account behind it is treated as
/// an unauthorized caller, not a missing resource.
pub fn load_account(conn: &Connection, account_id: i64) -> ServiceResult<Account> {
    accounts_db_operations::read_account_by_id(conn, account_id)?.ok_or(ServiceError::Unauthorized)
}

pub fn require_admin(conn: &Connection, account_id: i64) -> ServiceResult<Account> {
    let account = load_account(conn, account_id)?;
    if !account.role.can_moderate() {
        log::warn!(
            "Account {} ({}) attempted an admin-only action.",
            account.id,
            account.role
        );
        return Err(ServiceError::Unauthorized);
    }
    Ok(account)
}

fn immediate(conn: &mut Connection) -> ServiceResult<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

fn submission_not_found(id: i64) -> ServiceError {
    ServiceError::NotFound(format!("Submission {} not found.", id))
}

fn post_not_found(id: i64) -> ServiceError {
    ServiceError::NotFound(format!("Blog post {} not found.", id))
}

fn already_approved(id: i64) -> ServiceError {
    ServiceError::Conflict(format!("Submission {} has already been approved.", id))
}

// --- Author operations ---

/// Uploads the image and queues a new `pending` submission.
pub fn submit(
    conn: &Connection,
    assets: &dyn AssetStore,
    author_id: i64,
    draft: &PostDraft,
    image: Option<&ImageUpload>,
) -> ServiceResult<Submission> {
    let author = load_account(conn, author_id)?;
    if !author.role.can_submit() {
        return Err(ServiceError::Unauthorized);
    }
    let draft = clean_draft(draft)?;
    let image = required_image(image)?;

    let asset = assets.upload(image, BLOG_IMAGES_FOLDER)?;
    match store_submission(conn, &draft, &asset, author.id) {
        Ok(submission) => {
            log::info!(
                "Account {} submitted '{}' for review as submission {}.",
                author.id,
                submission.title,
                submission.id
            );
            Ok(submission)
        }
        Err(e) => {
            release_asset(assets, &asset);
            Err(e)
        }
    }
}

fn store_submission(
    conn: &Connection,
    draft: &CleanDraft,
    asset: &ImageAssetRef,
    author_id: i64,
) -> ServiceResult<Submission> {
    let id = submissions_db_operations::insert_submission(
        conn,
        &draft.title,
        &draft.body,
        &draft.category,
        asset,
        author_id,
    )?;
    submissions_db_operations::read_submission(conn, id)?.ok_or_else(|| submission_not_found(id))
}

/// Deletes the requester's own submission. A pending submission still owns
/// its image, so the image goes with it; once approved the image belongs to
/// the published post and is left alone.
pub fn withdraw_own(
    conn: &mut Connection,
    assets: &dyn AssetStore,
    submission_id: i64,
    requester_id: i64,
) -> ServiceResult<Submission> {
    let tx = immediate(conn)?;
    let submission = submissions_db_operations::read_submission(&tx, submission_id)?
        .ok_or_else(|| submission_not_found(submission_id))?;
    if submission.author_id != requester_id {
        log::warn!(
            "Account {} tried to withdraw submission {} owned by {}.",
            requester_id,
            submission_id,
            submission.author_id
        );
        return Err(ServiceError::Unauthorized);
    }

    submissions_db_operations::delete_submission(&tx, submission_id)?;
    if submission.status == SubmissionStatus::Pending {
        release_asset(assets, &submission.image);
    }
    tx.commit()?;

    log::info!("Account {} withdrew submission {}.", requester_id, submission_id);
    Ok(submission)
}

pub fn own_submissions(conn: &Connection, author_id: i64) -> ServiceResult<Vec<SubmissionSummary>> {
    let author = load_account(conn, author_id)?;
    Ok(submissions_db_operations::read_summaries_by_author(conn, author.id)?)
}

// --- Review queue ---

pub fn pending_queue(
    conn: &Connection,
    admin_id: i64,
    limit: u32,
    offset: u32,
) -> ServiceResult<Vec<SubmissionSummary>> {
    require_admin(conn, admin_id)?;
    Ok(submissions_db_operations::read_pending_summaries(conn, limit, offset)?)
}

pub fn pending_submission(
    conn: &Connection,
    admin_id: i64,
    submission_id: i64,
) -> ServiceResult<SubmissionDetail> {
    require_admin(conn, admin_id)?;
    submissions_db_operations::read_pending_detail(conn, submission_id)?
        .ok_or_else(|| submission_not_found(submission_id))
}

/// Publishes a pending submission. The post takes over the submission's
/// image reference as is; nothing is re-uploaded. The submission row stays
/// behind as `approved` with a link to the post.
pub fn approve(
    conn: &mut Connection,
    submission_id: i64,
    admin_id: i64,
) -> ServiceResult<PublishedPost> {
    let admin = require_admin(conn, admin_id)?;
    let tx = immediate(conn)?;

    let submission = submissions_db_operations::read_submission(&tx, submission_id)?
        .ok_or_else(|| submission_not_found(submission_id))?;
    if submission.status != SubmissionStatus::Pending {
        return Err(already_approved(submission_id));
    }

    let post_id = posts_db_operations::insert_post(
        &tx,
        &submission.title,
        &submission.body,
        &submission.category,
        &submission.image,
        submission.author_id,
        Utc::now(),
    )?;
    if submissions_db_operations::mark_approved(&tx, submission_id, post_id)? == 0 {
        return Err(already_approved(submission_id));
    }
    let post = posts_db_operations::read_post(&tx, post_id)?
        .ok_or_else(|| post_not_found(post_id))?;
    tx.commit()?;

    log::info!(
        "Admin {} approved submission {} as blog post {}.",
        admin.id,
        submission_id,
        post_id
    );
    Ok(post)
}

/// Discards a pending submission and its image. The reason is required but
/// only recorded in the log, since the record itself is deleted.
pub fn reject(
    conn: &mut Connection,
    assets: &dyn AssetStore,
    submission_id: i64,
    reason: &str,
    admin_id: i64,
) -> ServiceResult<Submission> {
    let admin = require_admin(conn, admin_id)?;
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ServiceError::Validation(
            "'reason' is required to reject a submission.".to_string(),
        ));
    }

    let tx = immediate(conn)?;
    let submission = submissions_db_operations::read_submission(&tx, submission_id)?
        .ok_or_else(|| submission_not_found(submission_id))?;
    if submission.status != SubmissionStatus::Pending {
        return Err(already_approved(submission_id));
    }

    submissions_db_operations::delete_submission(&tx, submission_id)?;
    release_asset(assets, &submission.image);
    tx.commit()?;

    log::info!(
        "Admin {} rejected submission {} ('{}'). Reason: {}",
        admin.id,
        submission_id,
        submission.title,
        reason
    );
    Ok(submission)
}

// --- Published posts ---

/// Publishes straight away, bypassing review.
pub fn direct_publish(
    conn: &Connection,
    assets: &dyn AssetStore,
    admin_id: i64,
    draft: &PostDraft,
    image: Option<&ImageUpload>,
) -> ServiceResult<PublishedPost> {
    let admin = require_admin(conn, admin_id)?;
    let draft = clean_draft(draft)?;
    let image = required_image(image)?;

    let asset = assets.upload(image, BLOG_IMAGES_FOLDER)?;
    match store_post(conn, &draft, &asset, admin.id) {
        Ok(post) => {
            log::info!("Admin {} published blog post {} directly.", admin.id, post.id);
            Ok(post)
        }
        Err(e) => {
            release_asset(assets, &asset);
            Err(e)
        }
    }
}

fn store_post(
    conn: &Connection,
    draft: &CleanDraft,
    asset: &ImageAssetRef,
    author_id: i64,
) -> ServiceResult<PublishedPost> {
    let id = posts_db_operations::insert_post(
        conn,
        &draft.title,
        &draft.body,
        &draft.category,
        asset,
        author_id,
        Utc::now(),
    )?;
    posts_db_operations::read_post(conn, id)?.ok_or_else(|| post_not_found(id))
}

/// Partially updates a post, optionally replacing its image.
///
/// A replacement image is uploaded before the record changes and the old one
/// is released only after the update commits. If the update fails the new
/// upload is released instead, so the post never points at a deleted asset.
pub fn edit_published(
    conn: &mut Connection,
    assets: &dyn AssetStore,
    post_id: i64,
    admin_id: i64,
    edit: &PostEdit,
    image: Option<&ImageUpload>,
) -> ServiceResult<PublishedPost> {
    let admin = require_admin(conn, admin_id)?;
    let edit = clean_edit(edit)?;
    let image = image.map(checked_image).transpose()?;
    if edit.is_empty() && image.is_none() {
        return Err(ServiceError::Validation("No changes were provided.".to_string()));
    }
    if posts_db_operations::read_post(conn, post_id)?.is_none() {
        return Err(post_not_found(post_id));
    }

    let new_asset = match image {
        Some(image) => Some(assets.upload(image, BLOG_IMAGES_FOLDER)?),
        None => None,
    };

    match apply_edit(conn, post_id, &edit, new_asset.as_ref()) {
        Ok((post, previous_image)) => {
            if new_asset.is_some() {
                release_asset(assets, &previous_image);
            }
            log::info!("Admin {} edited blog post {}.", admin.id, post_id);
            Ok(post)
        }
        Err(e) => {
            if let Some(asset) = &new_asset {
                release_asset(assets, asset);
            }
            Err(e)
        }
    }
}

/// Returns the updated post and the image it had before.
fn apply_edit(
    conn: &mut Connection,
    post_id: i64,
    edit: &CleanEdit,
    new_image: Option<&ImageAssetRef>,
) -> ServiceResult<(PublishedPost, ImageAssetRef)> {
    let tx = immediate(conn)?;
    let current = posts_db_operations::read_post(&tx, post_id)?
        .ok_or_else(|| post_not_found(post_id))?;

    posts_db_operations::update_post(
        &tx,
        post_id,
        edit.title.as_deref().unwrap_or(&current.title),
        edit.body.as_deref().unwrap_or(&current.body),
        edit.category.as_deref().unwrap_or(&current.category),
        new_image.unwrap_or(&current.image),
    )?;
    let updated = posts_db_operations::read_post(&tx, post_id)?
        .ok_or_else(|| post_not_found(post_id))?;
    tx.commit()?;
    Ok((updated, current.image))
}

/// Deletes a post with its comments and releases its image.
pub fn delete_published(
    conn: &mut Connection,
    assets: &dyn AssetStore,
    post_id: i64,
    admin_id: i64,
) -> ServiceResult<PublishedPost> {
    let admin = require_admin(conn, admin_id)?;
    let tx = immediate(conn)?;
    let post = posts_db_operations::read_post(&tx, post_id)?
        .ok_or_else(|| post_not_found(post_id))?;

    posts_db_operations::delete_post(&tx, post_id)?;
    release_asset(assets, &post.image);
    tx.commit()?;

    log::info!("Admin {} deleted blog post {} ('{}').", admin.id, post_id, post.title);
    Ok(post)
}
