use crate::error::{ServiceError, ServiceResult};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
    pub mtime: f64,
}

/// The directory finished downloads land in.
#[derive(Debug, Clone)]
pub struct DownloadFolder {
    root: PathBuf,
}

impl DownloadFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Regular files only, newest first.
    pub async fn list(&self) -> ServiceResult<Vec<StoredFile>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(e) => e,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let mtime = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);
            files.push(StoredFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: meta.len(),
                mtime,
            });
        }

        files.sort_by(|a, b| b.mtime.total_cmp(&a.mtime));
        Ok(files)
    }

    pub async fn delete(&self, name: &str) -> ServiceResult<()> {
        let path = self.resolve(name)?;
        match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => {}
            Ok(_) => return Err(ServiceError::FileNotFound(name.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ServiceError::FileNotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        }
        tokio::fs::remove_file(&path).await?;
        tracing::info!(file = %path.display(), "deleted download");
        Ok(())
    }

    /// Map a client-supplied name to a path inside the folder. Anything that
    /// is not a plain file name is refused.
    pub fn resolve(&self, name: &str) -> ServiceResult<PathBuf> {
        if name.is_empty() || sanitize_filename::sanitize(name) != name {
            return Err(ServiceError::InvalidRequest(format!("invalid file name: {}", name)));
        }
        Ok(self.root.join(name))
    }
}
