//! Warehouse image upload.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    Extension,
};

use super::{respond, ApiResult};
use crate::auth::Session;
use crate::errors::AppError;
use crate::forms::{FieldInput, FileMeta, FormField};
use crate::gateway::FilePart;
use crate::models::Warehouse;
use crate::AppState;

pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// Kept below axum's default request body limit.
pub const MAX_IMAGE_BYTES: u64 = 1024 * 1024;

/// POST /api/warehouses/{id}/image - Forward the first uploaded file.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Warehouse> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let name = field.name().unwrap_or("image").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        upload = Some(FilePart {
            field: name,
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let file = upload.ok_or_else(|| AppError::BadRequest("No image file was uploaded".to_string()))?;
    check_image(&file)?;

    respond(
        state
            .mutations
            .upload_warehouse_image(&session, &id, file)
            .await,
    )
}

/// Same size and extension rules as the form's image field.
fn check_image(file: &FilePart) -> Result<(), AppError> {
    let mut field = FormField::file("image", "Image", IMAGE_EXTENSIONS, MAX_IMAGE_BYTES);
    let meta = FileMeta {
        file_name: file.file_name.clone(),
        size: file.bytes.len() as u64,
    };
    if field.input(FieldInput::File(meta)) {
        return Ok(());
    }
    Err(AppError::BadRequest(
        field.error.unwrap_or_else(|| "Invalid image".to_string()),
    ))
}
