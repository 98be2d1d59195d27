//! Messaging gateway: the chat platform as seen by the intake flow
//!
//! - `MessagingGateway` trait for sending messages and fetching attachments
//! - `NatsGateway`, a JSON-over-NATS bridge to a platform adapter
//! - Wire types and inbound command parsing

mod backend;
mod client;
pub mod messages;

pub use backend::MessagingGateway;
pub use client::NatsGateway;
pub use messages::{InboundEvent, InboundMessage, Keyboard, OutboundMessage};
