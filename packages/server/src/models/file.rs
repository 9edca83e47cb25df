use common::AccessLevel;
use serde::{Deserialize, Serialize};

use crate::entity::file;

/// A file record as returned by the API.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    /// Unique file name.
    #[schema(example = "report.pdf")]
    pub name: String,
    /// Internal content locator.
    #[schema(example = "0192b7c4e8a07d5f9c3e1a2b4d6f8e0a")]
    pub locator: String,
    /// Identity of the uploader.
    #[schema(example = "alice")]
    pub owner: String,
    pub access_level: AccessLevel,
    /// Sniffed content type.
    #[schema(example = "application/pdf")]
    pub mime: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
    pub total: u64,
}

/// Body of `PUT /files/{name}`. At least one field must be set.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameFileRequest {
    #[schema(example = "report-2024.pdf")]
    pub new_name: Option<String>,
    /// One of `public`, `internal`, `private`.
    #[schema(example = "internal")]
    pub new_access_level: Option<String>,
}

impl From<file::Model> for FileResponse {
    fn from(model: file::Model) -> Self {
        Self {
            name: model.name,
            locator: model.locator,
            owner: model.owner,
            access_level: model.access_level,
            mime: model.mime,
        }
    }
}

impl From<Vec<file::Model>> for FileListResponse {
    fn from(models: Vec<file::Model>) -> Self {
        let total = models.len() as u64;
        let files = models.into_iter().map(FileResponse::from).collect();
        Self { files, total }
    }
}
