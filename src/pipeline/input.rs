//! Input loading for the command-line client: a path on disk → [`Upload`].
//!
//! The web front-end receives uploads as multipart bytes; the CLI receives
//! paths. Both end as an [`Upload`], so the pipeline never touches the file
//! system. Content is not validated here: a non-PDF passed as `--pdf` goes
//! through extraction and comes back as "unreadable", exactly as an upload
//! would.

use crate::error::StudyError;
use crate::request::Upload;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Read a local file into an [`Upload`] named after its file name.
pub async fn load_upload(path: impl AsRef<Path>) -> Result<Upload, StudyError> {
    let path = path.as_ref();

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => StudyError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => StudyError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => StudyError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
    Ok(Upload::new(file_name, bytes))
}
