use super::backend::MessagingGateway;
use super::messages::{
    AttachmentReply, AttachmentRequest, InboundEvent, InboundMessage, Keyboard, OutboundMessage,
};
use crate::session::{AttachmentRef, SessionId};
use anyhow::{anyhow, bail, Context, Result};
use async_nats::Client;
use base64::Engine;
use futures::stream::{BoxStream, StreamExt};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Messaging gateway speaking JSON over NATS to a chat platform adapter
pub struct NatsGateway {
    client: Client,
    subject_prefix: String,
    fetch_timeout: Duration,
}

impl NatsGateway {
    /// Connect to NATS server, authenticating with the bot token when given
    pub async fn connect(
        url: &str,
        token: Option<&str>,
        subject_prefix: impl Into<String>,
        fetch_timeout: Duration,
    ) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let options = match token {
            Some(token) => async_nats::ConnectOptions::with_token(token.to_string()),
            None => async_nats::ConnectOptions::new(),
        };

        let client = options
            .connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            subject_prefix: subject_prefix.into(),
            fetch_timeout,
        })
    }

    /// Subscribe to inbound chat messages
    ///
    /// Payloads that fail to parse are logged and skipped.
    pub async fn subscribe_events(&self) -> Result<BoxStream<'static, InboundEvent>> {
        let subject = format!("{}.inbound.>", self.subject_prefix);

        info!("Subscribing to inbound messages on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .context("Failed to subscribe to inbound messages")?;

        info!("Subscribed to {}", subject);

        let events = subscriber.filter_map(|msg| async move {
            match serde_json::from_slice::<InboundMessage>(&msg.payload) {
                Ok(inbound) => Some(InboundEvent::from(inbound)),
                Err(e) => {
                    warn!("Failed to parse inbound message on {}: {}", msg.subject, e);
                    None
                }
            }
        });

        Ok(events.boxed())
    }

    /// `<prefix>.outbound.<id>`; ids with `.` or wildcards would change the subject
    fn outbound_subject(&self, session_id: &SessionId) -> Result<String> {
        outbound_subject(&self.subject_prefix, session_id)
    }

    fn fetch_subject(&self) -> String {
        format!("{}.attachment.fetch", self.subject_prefix)
    }
}

#[async_trait::async_trait]
impl MessagingGateway for NatsGateway {
    async fn send_message(
        &self,
        session_id: &SessionId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()> {
        let subject = self.outbound_subject(session_id)?;

        let message = OutboundMessage {
            chat_id: session_id.clone(),
            text: text.to_string(),
            keyboard,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish outbound message")?;

        debug!("Published message to {} ({} chars)", subject, text.len());

        Ok(())
    }

    async fn fetch_attachment(&self, attachment: &AttachmentRef) -> Result<Vec<u8>> {
        let request = AttachmentRequest {
            file_id: attachment.to_string(),
        };
        let payload = serde_json::to_vec(&request)?;

        let response = tokio::time::timeout(
            self.fetch_timeout,
            self.client.request(self.fetch_subject(), payload.into()),
        )
        .await
        .with_context(|| format!("Timed out fetching attachment {}", attachment))?
        .with_context(|| format!("Failed to request attachment {}", attachment))?;

        let bytes = decode_attachment_reply(attachment, &response.payload)?;

        info!("Fetched attachment {} ({} bytes)", attachment, bytes.len());

        Ok(bytes)
    }
}

fn outbound_subject(prefix: &str, session_id: &SessionId) -> Result<String> {
    if !session_id.is_well_formed() {
        bail!("Refusing to publish to malformed chat id {:?}", session_id.as_str());
    }
    Ok(format!("{}.outbound.{}", prefix, session_id))
}

/// Turn an attachment reply payload into the file bytes
fn decode_attachment_reply(attachment: &AttachmentRef, payload: &[u8]) -> Result<Vec<u8>> {
    let reply: AttachmentReply =
        serde_json::from_slice(payload).context("Failed to parse attachment reply")?;

    if let Some(error) = reply.error {
        return Err(anyhow!("Adapter could not fetch {}: {}", attachment, error));
    }

    let data = reply
        .data
        .ok_or_else(|| anyhow!("Attachment reply for {} carried no data", attachment))?;

    base64::engine::general_purpose::STANDARD
        .decode(data)
        .context("Failed to decode attachment data")
}
