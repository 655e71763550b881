use std::path::{Component, Path, PathBuf};

use rand::Rng;
use tokio::fs;
use tracing::debug;

use super::error::UploadError;
use super::MAX_UPLOAD_BYTES;

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub original_name: String,
    pub size: usize,
    pub path: PathBuf,
}

/// Disk-backed upload store. Stored names are the sanitized original
/// stem, four random hex characters, and the original extension.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Result<Self, UploadError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn store(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredFile, UploadError> {
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge { size: data.len() });
        }

        let (stem, extension) = split_name(original_name);

        // Re-draw the suffix if it happens to collide with an existing
        // file.
        for _ in 0..8 {
            let filename = format!("{stem}-{}{extension}", random_suffix());
            let path = self.root.join(&filename);
            if fs::try_exists(&path).await? {
                continue;
            }
            fs::write(&path, data).await?;
            debug!(filename = %filename, size = data.len(), "stored upload");
            return Ok(StoredFile {
                filename,
                original_name: original_name.to_string(),
                size: data.len(),
                path,
            });
        }

        Err(UploadError::InvalidFilename(format!(
            "could not find a free name for {original_name}"
        )))
    }

    pub async fn open(&self, filename: &str) -> Result<Option<Vec<u8>>, UploadError> {
        let path = self.resolve(filename)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(UploadError::Io(err)),
        }
    }

    /// Only bare filenames resolve; anything with path separators or
    /// parent components is rejected.
    fn resolve(&self, filename: &str) -> Result<PathBuf, UploadError> {
        let path = Path::new(filename);
        let mut components = path.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(self.root.join(name)),
            _ => Err(UploadError::InvalidFilename(filename.to_string())),
        }
    }
}

/// Sanitized stem (up to the first dot, matching the upstream naming
/// convention) and the final extension with its dot.
fn split_name(original: &str) -> (String, String) {
    let base = Path::new(original)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload");

    let raw_stem = base.split('.').next().unwrap_or("upload");
    let stem: String = raw_stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect();
    let stem = if stem.is_empty() {
        "upload".to_string()
    } else {
        stem
    };

    let extension = Path::new(base)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    (stem, extension)
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..4)
        .map(|_| char::from_digit(rng.gen_range(0..16u32), 16).expect("hex digit in range"))
        .collect()
}
