use std::path::{Path, PathBuf};

use rand::Rng;
use sha2::{Digest, Sha256};
use shared_types::AppError;

// ── Trait ────────────────────────────────────────────────────────────

/// Byte storage for uploaded documents, addressed by key.
#[allow(async_fn_in_trait)]
pub trait ObjectStore: Send + Sync {
    /// Write bytes under `key`, replacing any existing object.
    async fn put(&self, key: &str, body: &[u8]) -> Result<(), AppError>;

    /// Read an object's bytes.
    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError>;

    /// Delete an object. Missing objects are not an error.
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

// ── Local disk implementation ───────────────────────────────────────

/// Flat directory of uploaded files.
pub struct LocalDiskStore {
    root: PathBuf,
}

impl LocalDiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_env() -> Self {
        Self::new(crate::config::upload_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            tracing::error!(path = %self.root.display(), error = %e, "failed to create upload dir");
            AppError::internal("تعذر تجهيز مجلد الملفات")
        })
    }

    /// Keys are generated by `storage_key`; anything with a separator is
    /// rejected so a key can never leave the root.
    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(AppError::bad_request("مسار الملف غير صالح"));
        }
        Ok(self.root.join(key))
    }
}

impl ObjectStore for LocalDiskStore {
    async fn put(&self, key: &str, body: &[u8]) -> Result<(), AppError> {
        self.ensure_root().await?;
        let path = self.path_for(key)?;
        tokio::fs::write(&path, body).await.map_err(|e| {
            tracing::error!(key, error = %e, "file write failed");
            AppError::internal("تعذر حفظ الملف")
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let path = self.path_for(key)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found("الملف غير موجود على الخادم")
            } else {
                tracing::error!(key, error = %e, "file read failed");
                AppError::internal("تعذر قراءة الملف")
            }
        })
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                tracing::error!(key, error = %e, "file delete failed");
                Err(AppError::internal("تعذر حذف الملف"))
            }
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Lowercased extension of an uploaded filename, without the dot.
pub fn file_extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            e.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .unwrap_or_default()
}

/// `{unix-millis}-{random}.{ext}`.
pub fn storage_key(extension: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random: u32 = rand::thread_rng().gen_range(100_000_000..1_000_000_000);
    if extension.is_empty() {
        format!("{millis}-{random}")
    } else {
        format!("{millis}-{random}.{extension}")
    }
}

/// Hex SHA-256 of the file bytes.
pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
