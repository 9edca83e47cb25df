use std::path::PathBuf;
use std::str::FromStr;

use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::AccessLevel;
use common::storage::{BoxReader, Locator};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::caller::{AnyCaller, IdentifiedCaller};
use crate::extractors::json::AppJson;
use crate::files::{FileStore, FileStoreError, FileUpdate, NewFile};
use crate::models::file::{FileListResponse, FileResponse, RenameFileRequest};
use crate::state::AppState;
use crate::utils::filename::validate_file_name;

/// Room for multipart framing and the text fields on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = usize::try_from(max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(limit)
}

#[utoipa::path(
    get,
    path = "/files",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List visible files",
    description = "Returns every file the caller may see, ordered by name. Public files are \
        visible to everyone, internal files to any identified caller and private files to \
        their owner and `root`.",
    params(("id" = String, Header, description = "Caller identity")),
    responses(
        (status = 200, description = "File list", body = FileListResponse),
        (status = 401, description = "Identity missing (IDENTITY_MISSING)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller), fields(caller = ?caller))]
pub async fn list_files(
    IdentifiedCaller(caller): IdentifiedCaller,
    State(state): State<AppState>,
) -> Result<Json<FileListResponse>, AppError> {
    let files = FileStore::new(&state.db).list(&caller).await?;
    Ok(Json(FileListResponse::from(files)))
}

#[utoipa::path(
    get,
    path = "/files/{name}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Get a file record",
    description = "Returns the record if it exists and is visible to the caller. Files the \
        caller may not see are reported exactly like absent ones.",
    params(
        ("name" = String, Path, description = "File name"),
        ("id" = Option<String>, Header, description = "Caller identity"),
    ),
    responses(
        (status = 200, description = "File record", body = FileResponse),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller), fields(caller = ?caller))]
pub async fn get_file(
    AnyCaller(caller): AnyCaller,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let file = FileStore::new(&state.db)
        .get_by_name(&caller, &name)
        .await?;
    Ok(Json(FileResponse::from(file)))
}

#[utoipa::path(
    post,
    path = "/files",
    tag = "Files",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Stores the `file` multipart field under `name` (defaults to the uploaded \
        filename) with the given `accessLevel`. The content type is detected from the bytes \
        and a gzip mirror is produced before the record is created.",
    params(("id" = String, Header, description = "Caller identity")),
    request_body(content_type = "multipart/form-data", description = "Fields: file, accessLevel, name (optional)"),
    responses(
        (status = 201, description = "File created", body = FileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Identity missing (IDENTITY_MISSING)", body = ErrorBody),
        (status = 409, description = "Name already taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller, multipart), fields(caller = ?caller, name, locator))]
pub async fn upload_file(
    IdentifiedCaller(caller): IdentifiedCaller,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut staged: Option<StagedUpload> = None;
    let mut file_name: Option<String> = None;
    let mut access_level: Option<String> = None;
    let mut name_override: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                file_name = field.file_name().map(|s| s.to_string());
                staged = Some(
                    stream_field_to_temp(field, state.config.storage.max_upload_size).await?,
                );
            }
            Some("accessLevel") => access_level = Some(read_text(field, "accessLevel").await?),
            Some("name") => name_override = Some(read_text(field, "name").await?),
            _ => {} // Ignore unknown fields.
        }
    }

    let staged = staged.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let access_level = access_level
        .ok_or_else(|| AppError::Validation("Missing 'accessLevel' field".into()))?;
    let access_level =
        AccessLevel::from_str(&access_level).map_err(|e| AppError::Validation(e.to_string()))?;

    let name = name_override
        .filter(|n| !n.is_empty())
        .or(file_name)
        .ok_or_else(|| AppError::Validation("File name is required".into()))?;
    validate_file_name(&name).map_err(|e| AppError::Validation(e.message().into()))?;

    let locator = Locator::generate();
    let span = tracing::Span::current();
    span.record("name", name.as_str());
    span.record("locator", locator.as_str());

    let reader: BoxReader = Box::new(staged.open().await?);
    let stored = state.content.store(&locator, reader).await?;

    let owner = caller.id().unwrap_or_default().to_string();
    let inserted = FileStore::new(&state.db)
        .insert(NewFile {
            name,
            locator: locator.clone(),
            owner,
            access_level,
            mime: Some(stored.mime),
        })
        .await;

    let file = match inserted {
        Ok(file) => file,
        Err(err @ FileStoreError::Conflict(_)) => {
            if let Err(e) = state.content.discard(&locator).await {
                warn!("Failed to discard content of rejected upload: {e}");
            }
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    info!(size = stored.size, "File uploaded");
    Ok((StatusCode::CREATED, Json(FileResponse::from(file))))
}

#[utoipa::path(
    delete,
    path = "/files/{name}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Deletes the record if the caller owns it (`root` may delete any record). \
        Deleting a file that does not exist or belongs to someone else succeeds without effect.",
    params(
        ("name" = String, Path, description = "File name"),
        ("id" = String, Header, description = "Caller identity"),
    ),
    responses(
        (status = 204, description = "Deleted, or nothing to delete"),
        (status = 401, description = "Identity missing (IDENTITY_MISSING)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller), fields(caller = ?caller))]
pub async fn delete_file(
    IdentifiedCaller(caller): IdentifiedCaller,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    let removed = FileStore::new(&state.db).delete(&caller, &name).await?;
    debug!(removed, "Delete finished");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/files/{name}",
    tag = "Files",
    operation_id = "renameFile",
    summary = "Rename or re-classify a file",
    description = "Changes the name and/or access level. At least one of `newName` and \
        `newAccessLevel` is required. Targets the caller's own record; `root` may target any \
        record except private files owned by others. No matching record is a silent success.",
    params(
        ("name" = String, Path, description = "File name"),
        ("id" = String, Header, description = "Caller identity"),
    ),
    request_body = RenameFileRequest,
    responses(
        (status = 204, description = "Updated, or nothing matched"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Identity missing (IDENTITY_MISSING)", body = ErrorBody),
        (status = 409, description = "New name already taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller, payload), fields(caller = ?caller))]
pub async fn rename_file(
    IdentifiedCaller(caller): IdentifiedCaller,
    State(state): State<AppState>,
    Path(name): Path<String>,
    AppJson(payload): AppJson<RenameFileRequest>,
) -> Result<StatusCode, AppError> {
    let new_access_level = payload
        .new_access_level
        .filter(|l| !l.is_empty())
        .map(|l| AccessLevel::from_str(&l))
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let new_name = payload.new_name.filter(|n| !n.is_empty());
    if let Some(new_name) = &new_name {
        validate_file_name(new_name).map_err(|e| AppError::Validation(e.message().into()))?;
    }

    let changed = FileStore::new(&state.db)
        .rename(
            &caller,
            &name,
            FileUpdate {
                new_name,
                new_access_level,
            },
        )
        .await?;
    debug!(changed, "Rename finished");
    Ok(StatusCode::NO_CONTENT)
}

async fn read_text(
    field: axum::extract::multipart::Field<'_>,
    label: &str,
) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {label}: {e}")))
}

/// An upload spooled to a temp file, removed when dropped.
struct StagedUpload {
    path: PathBuf,
}

impl StagedUpload {
    async fn open(&self) -> Result<tokio::fs::File, AppError> {
        tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        // Best effort.
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Spool a multipart field to a temp file, enforcing `max_size`.
async fn stream_field_to_temp(
    mut field: axum::extract::multipart::Field<'_>,
    max_size: u64,
) -> Result<StagedUpload, AppError> {
    let staged = StagedUpload {
        path: std::env::temp_dir().join(format!("uploader-{}", Uuid::new_v4())),
    };

    let mut temp_file = tokio::fs::File::create(&staged.path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

    let mut total_size: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        total_size += chunk.len() as u64;
        if total_size > max_size {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {max_size} bytes"
            )));
        }
        temp_file
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
    }

    temp_file
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

    Ok(staged)
}
