//! Submission storage
//!
//! A finalized application is written as two artifacts under one
//! [`SubmissionKey`]: the answers as plain text and the voice recording as
//! opaque bytes. The two writes are independent; there is no joint
//! transaction.

mod fs;
mod key;

pub use fs::{FsSubmissionStore, ANSWERS_FILE, VOICE_FILE};
pub use key::{format_answers, SubmissionKey};

use anyhow::Result;
use std::path::PathBuf;

/// Where finalized applications are persisted
#[async_trait::async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Store the formatted answers, returning where they landed
    async fn write_text(&self, key: &SubmissionKey, content: &str) -> Result<PathBuf>;

    /// Store the voice recording, returning where it landed
    async fn write_binary(&self, key: &SubmissionKey, bytes: &[u8]) -> Result<PathBuf>;
}
