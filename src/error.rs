//! Typed errors of the intake flow

use thiserror::Error;

/// Why a voice submission could not be persisted
///
/// The session stays in the voice capture step after any of these, so the
/// applicant can simply send the recording again.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FinalizeError {
    #[error("no voice attachment to finalize")]
    MissingVoice,
    #[error("failed to fetch voice attachment: {0:#}")]
    Fetch(anyhow::Error),
    #[error("failed to store submission: {0:#}")]
    Store(anyhow::Error),
}
