use crate::assets::ImageUpload;
use crate::errors::{ServiceError, ServiceResult};
use actix_multipart::Multipart;
use actix_web::web::BytesMut;
use futures_util::StreamExt;
use std::collections::HashMap;

const MAX_TEXT_FIELD_BYTES: usize = 1024 * 1024;

/// A parsed `multipart/form-data` body: text fields by name plus at most one image.
#[derive(Debug, Default)]
pub struct ImageForm {
    pub fields: HashMap<String, String>,
    pub image: Option<ImageUpload>,
}

impl ImageForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn text_or_empty(&self, name: &str) -> String {
        self.text(name).unwrap_or_default().to_string()
    }

    pub fn owned(&self, name: &str) -> Option<String> {
        self.text(name).map(str::to_string)
    }
}

/// Reads a multipart body, buffering the part named `image_field` as the
/// upload and every other part as UTF-8 text. The image is capped at
/// `max_image_bytes`; a file input left empty by the browser counts as no image.
pub async fn read_image_form(
    mut payload: Multipart,
    image_field: &str,
    max_image_bytes: u64,
) -> ServiceResult<ImageForm> {
    let mut form = ImageForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|e| ServiceError::Validation(format!("Malformed form data: {}", e)))?;
        let field_name = field.content_disposition().get_name().unwrap_or_default().to_string();

        if field_name == image_field {
            let content_type = field
                .content_type()
                .map(|m| m.essence_str().to_string())
                .unwrap_or_default();
            let original_filename = field
                .content_disposition()
                .get_filename()
                .filter(|name| !name.is_empty())
                .map(str::to_string);

            let mut data = BytesMut::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk
                    .map_err(|e| ServiceError::Validation(format!("Malformed form data: {}", e)))?;
                if (data.len() + chunk.len()) as u64 > max_image_bytes {
                    return Err(ServiceError::Validation(format!(
                        "File is too large. Maximum size is {}MB.",
                        max_image_bytes / (1024 * 1024)
                    )));
                }
                data.extend_from_slice(&chunk);
            }

            if !data.is_empty() {
                form.image = Some(ImageUpload {
                    bytes: data.to_vec(),
                    content_type,
                    original_filename,
                });
            }
        } else {
            let mut data = BytesMut::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk
                    .map_err(|e| ServiceError::Validation(format!("Malformed form data: {}", e)))?;
                if data.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
                    return Err(ServiceError::Validation(format!("'{}' is too long.", field_name)));
                }
                data.extend_from_slice(&chunk);
            }
            let value = String::from_utf8(data.to_vec()).map_err(|_| {
                ServiceError::Validation(format!("Invalid UTF-8 in form field '{}'.", field_name))
            })?;
            form.fields.insert(field_name, value);
        }
    }

    Ok(form)
}
