use crate::assets::{image_extension_for, ImageUpload};
use crate::errors::{ServiceError, ServiceResult};
use crate::helper::sanitization_helpers::{sanitize_body, strip_all_html};
use crate::models::DEFAULT_CATEGORY;
use regex::Regex;
use std::sync::OnceLock;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_CATEGORY_LEN: usize = 50;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_COMMENT_LEN: usize = 2000;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"))
}

/// Strips markup from a single-line field and requires something to be left.
pub fn required_line(field: &str, value: &str, max_len: usize) -> ServiceResult<String> {
    let cleaned = strip_all_html(value.trim());
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(ServiceError::Validation(format!("'{}' is required.", field)));
    }
    if cleaned.chars().count() > max_len {
        return Err(ServiceError::Validation(format!(
            "'{}' must be at most {} characters.",
            field, max_len
        )));
    }
    Ok(cleaned.to_string())
}

pub fn required_body(field: &str, value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("'{}' is required.", field)));
    }
    Ok(sanitize_body(trimmed))
}

/// Plain text kept as typed, for fields clients display as text (comments).
pub fn required_text(field: &str, value: &str, max_len: usize) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("'{}' is required.", field)));
    }
    if trimmed.chars().count() > max_len {
        return Err(ServiceError::Validation(format!(
            "'{}' must be at most {} characters.",
            field, max_len
        )));
    }
    Ok(trimmed.to_string())
}

/// Blank or absent categories fall back to the default one.
pub fn category_or_default(value: Option<&str>) -> ServiceResult<String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => required_line("category", v, MAX_CATEGORY_LEN),
        None => Ok(DEFAULT_CATEGORY.to_string()),
    }
}

/// An image part must be present, non-empty and of an accepted type.
pub fn required_image(image: Option<&ImageUpload>) -> ServiceResult<&ImageUpload> {
    let image = image
        .filter(|i| !i.bytes.is_empty())
        .ok_or_else(|| ServiceError::Validation("'image' is required.".to_string()))?;
    checked_image(image)
}

pub fn checked_image(image: &ImageUpload) -> ServiceResult<&ImageUpload> {
    if image.bytes.is_empty() {
        return Err(ServiceError::Validation("'image' is empty.".to_string()));
    }
    if image_extension_for(&image.content_type).is_none() {
        return Err(ServiceError::Validation(
            "'image' must be a JPEG, PNG, GIF or WebP file.".to_string(),
        ));
    }
    Ok(image)
}

pub fn normalize_email(email: &str) -> ServiceResult<String> {
    let email = email.trim().to_lowercase();
    if !email_regex().is_match(&email) {
        return Err(ServiceError::Validation("'email' is not a valid address.".to_string()));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(bytes: &[u8], content_type: &str) -> ImageUpload {
        ImageUpload {
            bytes: bytes.to_vec(),
            content_type: content_type.into(),
            original_filename: None,
        }
    }

    #[test]
    fn test_required_line() {
        assert_eq!(
            required_line("title", "  <i>Rust</i> tips ", MAX_TITLE_LEN).unwrap(),
            "Rust tips"
        );
        let err = required_line("title", "   ", MAX_TITLE_LEN).unwrap_err();
        assert_eq!(err.to_string(), "'title' is required.");
        assert!(required_line("title", "<b></b>", MAX_TITLE_LEN).is_err());
        assert!(required_line("category", &"x".repeat(51), MAX_CATEGORY_LEN).is_err());
    }

    #[test]
    fn test_category_defaults() {
        assert_eq!(category_or_default(None).unwrap(), "General");
        assert_eq!(category_or_default(Some("  ")).unwrap(), "General");
        assert_eq!(category_or_default(Some("Tech")).unwrap(), "Tech");
    }

    #[test]
    fn test_required_image() {
        assert!(matches!(required_image(None), Err(ServiceError::Validation(_))));
        assert!(required_image(Some(&upload(b"", "image/png"))).is_err());
        assert!(required_image(Some(&upload(b"GIF89a", "text/plain"))).is_err());
        assert!(required_image(Some(&upload(b"GIF89a", "image/gif"))).is_ok());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" Ann@Example.COM ").unwrap(), "ann@example.com");
        assert!(normalize_email("ann").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("ann@localhost").is_err());
        assert!(normalize_email("ann@two@example.com").is_err());
        assert!(normalize_email("ann smith@example.com").is_err());
    }

    #[test]
    fn test_required_text_keeps_markup_as_typed() {
        assert_eq!(
            required_text("content", "  1 < 2 & <b>ok</b> ", MAX_COMMENT_LEN).unwrap(),
            "1 < 2 & <b>ok</b>"
        );
        assert!(matches!(
            required_text("content", " ", MAX_COMMENT_LEN),
            Err(ServiceError::Validation(_))
        ));
        let too_long = "x".repeat(MAX_COMMENT_LEN + 1);
        assert!(required_text("content", &too_long, MAX_COMMENT_LEN).is_err());
    }
}
