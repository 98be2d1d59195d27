use super::{SubmissionKey, SubmissionStore};
use anyhow::{bail, Context, Result};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::info;

pub const ANSWERS_FILE: &str = "answers.txt";
pub const VOICE_FILE: &str = "voice_message.ogg";

/// Stores each submission as a directory `<root>/<key>/`
#[derive(Debug, Clone)]
pub struct FsSubmissionStore {
    root: PathBuf,
}

impl FsSubmissionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the artifacts of `key`
    ///
    /// The key must be a single plain path component, so the directory is
    /// always a direct child of the root.
    pub fn submission_dir(&self, key: &SubmissionKey) -> Result<PathBuf> {
        let mut components = Path::new(key.as_str()).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name == key.as_str() => {
                Ok(self.root.join(name))
            }
            _ => bail!("Submission key {:?} is not a plain directory name", key.as_str()),
        }
    }

    async fn write_file(&self, key: &SubmissionKey, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.submission_dir(key)?;
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create submission directory: {:?}", dir))?;

        let path = dir.join(name);
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", path))?;

        info!("Wrote {} ({} bytes)", path.display(), bytes.len());

        Ok(path)
    }
}

#[async_trait::async_trait]
impl SubmissionStore for FsSubmissionStore {
    async fn write_text(&self, key: &SubmissionKey, content: &str) -> Result<PathBuf> {
        self.write_file(key, ANSWERS_FILE, content.as_bytes()).await
    }

    async fn write_binary(&self, key: &SubmissionKey, bytes: &[u8]) -> Result<PathBuf> {
        self.write_file(key, VOICE_FILE, bytes).await
    }
}
