use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::constants::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};

// Stored paths end up inside quoted HTML attributes
static UNSAFE_NAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._ -]").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Subfolder under the media root, also used as the filename prefix.
    pub fn folder(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => IMAGE_EXTENSIONS,
            MediaKind::Video => VIDEO_EXTENSIONS,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("{0} files must have one of these extensions: {1}")]
    UnsupportedType(&'static str, String),
    #[error("attachment is empty")]
    Empty,
    #[error("failed to store attachment: {0}")]
    Io(#[from] std::io::Error),
}

/// Chat attachments on local disk, laid out as
/// `{root}/{images|videos}/{user_id}/{kind}_{timestamp}_{name}`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes the upload and returns the stored path.
    pub async fn save(
        &self,
        kind: MediaKind,
        user_id: i64,
        original_name: &str,
        data: &[u8],
    ) -> Result<String, MediaError> {
        let name = stored_name(original_name);
        if !has_allowed_extension(&name, kind) {
            return Err(MediaError::UnsupportedType(
                kind.folder(),
                kind.allowed_extensions().join(", "),
            ));
        }
        if data.is_empty() {
            return Err(MediaError::Empty);
        }

        let dir = self.root.join(kind.folder()).join(user_id.to_string());
        fs::create_dir_all(&dir).await?;

        let timestamp = Utc::now().format("%Y%m%d%H%M%S%3f");
        let path = dir.join(format!("{}_{}_{}", kind.folder(), timestamp, name));
        fs::write(&path, data).await?;

        tracing::debug!("Stored {} bytes at {}", data.len(), path.display());
        Ok(path.to_string_lossy().replace('\\', "/"))
    }
}

/// Filesystem-safe name restricted to `[A-Za-z0-9._ -]`.
fn stored_name(original_name: &str) -> String {
    let name = sanitize_filename::sanitize(original_name);
    UNSAFE_NAME_CHARS.replace_all(&name, "_").into_owned()
}

fn has_allowed_extension(name: &str, kind: MediaKind) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            kind.allowed_extensions().contains(&ext.as_str())
        })
        .unwrap_or(false)
}
