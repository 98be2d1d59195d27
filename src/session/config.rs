use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime settings for the session manager
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Idle time after which a session is swept
    /// Default: 24 hours
    pub ttl: Duration,

    /// Texts sent to applicants
    pub prompts: Prompts,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            prompts: Prompts::default(),
        }
    }
}

/// Fixed messages of the intake conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    /// Sent on begin, together with the track keyboard
    pub welcome: String,

    /// Sent once every question is answered
    pub voice_request: String,

    /// Sent after the application is stored
    pub confirmation: String,

    /// Sent when the voice message could not be stored
    pub finalize_failed: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            welcome: "Welcome! Please choose the vacancy you are interested in:".to_string(),
            voice_request: "Please send a voice message telling us about yourself, or try to sell us something".to_string(),
            confirmation: "Thank you! Your application has been saved. We will contact you soon.".to_string(),
            finalize_failed: "Sorry, we could not save your voice message. Please send it again.".to_string(),
        }
    }
}
