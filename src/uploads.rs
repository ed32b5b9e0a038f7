use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::models::ResumeFile;

/// Accepted resume formats: (extension, content type)
const RESUME_FORMATS: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Resume file is empty")]
    Empty,

    #[error("Resume is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Unsupported resume type '{0}'; upload a PDF, DOC or DOCX file")]
    UnsupportedType(String),

    #[error("Invalid stored file name '{0}'")]
    InvalidName(String),

    #[error("Stored file '{0}' is missing")]
    Missing(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Resume files on local disk, named `<uuid>.<ext>` under the upload directory.
pub struct ResumeStorage {
    dir: PathBuf,
    max_bytes: usize,
}

impl ResumeStorage {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            max_bytes: config.max_resume_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Validate and persist an uploaded resume.
    pub async fn save(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<ResumeFile, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        let (extension, canonical_type) = resume_format(file_name, content_type)?;
        let stored_as = format!("{}.{}", Uuid::new_v4(), extension);

        self.ensure_dir().await?;
        tokio::fs::write(self.dir.join(&stored_as), bytes).await?;

        let checksum = format!("{:x}", Sha256::digest(bytes));
        info!("Stored resume {} ({} bytes)", stored_as, bytes.len());

        Ok(ResumeFile {
            file_name: display_name(file_name),
            content_type: canonical_type.to_string(),
            size: bytes.len() as u64,
            checksum,
            stored_as,
        })
    }

    pub async fn load(&self, stored_as: &str) -> Result<Vec<u8>, UploadError> {
        let path = self.path_for(stored_as)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(UploadError::Missing(stored_as.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Missing files are not an error
    pub async fn remove(&self, stored_as: &str) -> Result<(), UploadError> {
        let path = self.path_for(stored_as)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed resume {}", stored_as);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, stored_as: &str) -> Result<PathBuf, UploadError> {
        let valid = !stored_as.is_empty()
            && !stored_as.starts_with('.')
            && stored_as
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        if !valid {
            return Err(UploadError::InvalidName(stored_as.to_string()));
        }
        Ok(self.dir.join(stored_as))
    }
}

/// Resolve the format by declared content type, falling back to the file extension
/// when the client sent a generic type.
fn resume_format(
    file_name: &str,
    content_type: Option<&str>,
) -> Result<(&'static str, &'static str), UploadError> {
    let declared = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    if let Some(ct) = declared {
        return RESUME_FORMATS
            .iter()
            .find(|(_, known)| *known == ct)
            .copied()
            .ok_or(UploadError::UnsupportedType(ct));
    }

    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    RESUME_FORMATS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .copied()
        .ok_or_else(|| UploadError::UnsupportedType(file_name.to_string()))
}

/// Strip any client-side directory components from the original name
fn display_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    if base.is_empty() {
        "resume".to_string()
    } else {
        base.to_string()
    }
}
