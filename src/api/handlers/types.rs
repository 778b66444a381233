use crate::services::dropbox::Entry;
use crate::services::jobs::JobState;
use crate::utils::paths::{self, PathElement};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Folder to list; empty or `/` for the root
    pub path: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EntryResponse {
    pub name: String,
    pub path: String,
    pub is_folder: bool,
    pub size: Option<u64>,
    pub server_modified: Option<String>,
    /// Browse page for folders, download URL for files
    pub link: String,
}

impl From<&Entry> for EntryResponse {
    fn from(entry: &Entry) -> Self {
        let path = entry.path();
        let link = if entry.is_folder() {
            paths::browse_link(&path)
        } else {
            paths::download_link(&path)
        };

        Self {
            name: entry.name.clone(),
            is_folder: entry.is_folder(),
            size: entry.size,
            server_modified: entry.server_modified.clone(),
            path,
            link,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ListingResponse {
    pub path: String,
    pub breadcrumbs: Vec<PathElement>,
    pub entries: Vec<EntryResponse>,
}

/// A selected table row
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SelectedItem {
    pub path: String,
    #[serde(default)]
    pub is_folder: bool,
}

impl SelectedItem {
    pub fn kind_label(&self) -> &'static str {
        if self.is_folder { "folder" } else { "file" }
    }
}

/// Names are checked after trimming, see [`crate::utils::validation::validate_entry_name`]
#[derive(Deserialize, ToSchema)]
pub struct CreateFolderRequest {
    /// Folder the new folder goes into; root when absent
    pub parent: Option<String>,
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RenameRequest {
    pub item: SelectedItem,
    pub name: String,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct RelocateRequest {
    #[validate(length(min = 1, message = "No items provided"))]
    pub items: Vec<SelectedItem>,
    pub destination: String,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct DeleteRequest {
    #[validate(length(min = 1, message = "No items provided"))]
    pub items: Vec<SelectedItem>,
}

/// Result of a file operation. Batch operations carry the job id to poll.
#[derive(Serialize, ToSchema)]
pub struct OperationResponse {
    pub status: JobState,
    pub job_id: Option<String>,
    pub message: String,
}

impl OperationResponse {
    pub fn complete(message: String) -> Self {
        Self {
            status: JobState::Complete,
            job_id: None,
            message,
        }
    }
}
