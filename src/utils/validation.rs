use anyhow::{Result, anyhow};

/// Longest entry name the provider accepts
pub const MAX_NAME_LENGTH: usize = 255;

#[derive(Debug)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a single path component typed by the user (new folder, rename)
pub fn validate_entry_name(name: &str) -> Result<&str> {
    let name = name.trim();

    if name.is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_NAME",
            message: "Name cannot be empty".to_string(),
        }));
    }

    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        tracing::warn!("Rejected entry name with path components: {}", name);
        return Err(anyhow!(ValidationError {
            code: "INVALID_NAME",
            message: "Name cannot contain path separators".to_string(),
        }));
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(anyhow!(ValidationError {
            code: "INVALID_NAME",
            message: "Name cannot contain control characters".to_string(),
        }));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(anyhow!(ValidationError {
            code: "NAME_TOO_LONG",
            message: format!("Name cannot exceed {} characters", MAX_NAME_LENGTH),
        }));
    }

    Ok(name)
}

/// Check a folder path typed by the user as move/copy destination
pub fn validate_destination(path: &str) -> Result<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_DESTINATION",
            message: "Destination cannot be empty".to_string(),
        }));
    }

    if trimmed.split('/').any(|s| s == "..") {
        return Err(anyhow!(ValidationError {
            code: "INVALID_DESTINATION",
            message: "Destination cannot contain '..'".to_string(),
        }));
    }

    Ok(super::paths::normalize(trimmed))
}
