use super::messages::Keyboard;
use crate::session::{AttachmentRef, SessionId};
use anyhow::Result;

/// Outbound side of the chat platform
///
/// Implementations:
/// - `NatsGateway`: bridges to a platform adapter over NATS
/// - test doubles recording sent messages
#[async_trait::async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send `text` to a chat, optionally with a reply keyboard
    async fn send_message(
        &self,
        session_id: &SessionId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()>;

    /// Download the bytes of a received attachment
    async fn fetch_attachment(&self, attachment: &AttachmentRef) -> Result<Vec<u8>>;
}
