use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntryTag {
    File,
    Folder,
    Deleted,
}

/// File or folder metadata as returned by `files/list_folder`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Entry {
    #[serde(rename = ".tag")]
    pub tag: EntryTag,
    pub name: String,
    #[serde(default)]
    pub path_lower: Option<String>,
    #[serde(default)]
    pub path_display: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub server_modified: Option<String>,
}

impl Entry {
    pub fn is_folder(&self) -> bool {
        self.tag == EntryTag::Folder
    }

    /// Display path, falling back to the lowercased one
    pub fn path(&self) -> String {
        self.path_display
            .clone()
            .or_else(|| self.path_lower.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListFolderResult {
    pub entries: Vec<Entry>,
    pub cursor: String,
    pub has_more: bool,
}

/// Token endpoint response. Only the access token is kept.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RelocationPath {
    pub from_path: String,
    pub to_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteArg {
    pub path: String,
}

/// Move and copy share one endpoint shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    Move,
    Copy,
}

impl Relocation {
    pub(crate) fn endpoint(self) -> &'static str {
        match self {
            Relocation::Move => "files/move_v2",
            Relocation::Copy => "files/copy_v2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    Move,
    Copy,
    Delete,
}

impl BatchKind {
    pub fn launch_endpoint(self) -> &'static str {
        match self {
            BatchKind::Move => "files/move_batch_v2",
            BatchKind::Copy => "files/copy_batch_v2",
            BatchKind::Delete => "files/delete_batch",
        }
    }

    pub fn check_endpoint(self) -> &'static str {
        match self {
            BatchKind::Move => "files/move_batch/check_v2",
            BatchKind::Copy => "files/copy_batch/check_v2",
            BatchKind::Delete => "files/delete_batch/check",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BatchKind::Move => "move",
            BatchKind::Copy => "copy",
            BatchKind::Delete => "delete",
        }
    }

    /// Progressive form used while a job runs ("Moving", ...)
    pub fn progressive(self) -> &'static str {
        match self {
            BatchKind::Move => "Moving",
            BatchKind::Copy => "Copying",
            BatchKind::Delete => "Deleting",
        }
    }

    /// Past tense used in notifications ("Moved", "Copied", "Deleted")
    pub fn past_tense(self) -> &'static str {
        match self {
            BatchKind::Move => "Moved",
            BatchKind::Copy => "Copied",
            BatchKind::Delete => "Deleted",
        }
    }
}

impl From<Relocation> for BatchKind {
    fn from(value: Relocation) -> Self {
        match value {
            Relocation::Move => BatchKind::Move,
            Relocation::Copy => BatchKind::Copy,
        }
    }
}

/// Arguments for a multi-entry operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchRequest {
    Move(Vec<RelocationPath>),
    Copy(Vec<RelocationPath>),
    Delete(Vec<DeleteArg>),
}

impl BatchRequest {
    pub fn kind(&self) -> BatchKind {
        match self {
            BatchRequest::Move(_) => BatchKind::Move,
            BatchRequest::Copy(_) => BatchKind::Copy,
            BatchRequest::Delete(_) => BatchKind::Delete,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BatchRequest::Move(e) | BatchRequest::Copy(e) => e.len(),
            BatchRequest::Delete(e) => e.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON body for the launch endpoint
    pub fn to_body(&self) -> serde_json::Value {
        match self {
            BatchRequest::Move(entries) | BatchRequest::Copy(entries) => serde_json::json!({
                "entries": entries,
                "autorename": false,
            }),
            BatchRequest::Delete(entries) => serde_json::json!({ "entries": entries }),
        }
    }
}

/// Per-entry outcome inside a completed batch
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub enum BatchEntryResult {
    Success,
    Failure,
    #[serde(other)]
    Other,
}

/// Answer of a batch launch endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub enum BatchLaunch {
    AsyncJobId {
        async_job_id: String,
    },
    Complete {
        #[serde(default)]
        entries: Vec<BatchEntryResult>,
    },
    #[serde(other)]
    Other,
}

/// Answer of a batch check endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub enum JobStatus {
    InProgress,
    Complete {
        #[serde(default)]
        entries: Vec<BatchEntryResult>,
    },
    Failed {
        #[serde(default)]
        failed: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

/// A file body streamed from the content endpoint
pub struct Download {
    pub name: String,
    pub size: Option<u64>,
    pub stream: BoxStream<'static, Result<Bytes, std::io::Error>>,
}
