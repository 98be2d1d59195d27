pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod http;
pub mod session;
pub mod store;

pub use config::Config;
pub use dispatch::Dispatcher;
pub use error::FinalizeError;
pub use gateway::{InboundEvent, Keyboard, MessagingGateway, NatsGateway};
pub use http::{create_router, AppState};
pub use session::{
    AttachmentRef, Clock, Outcome, SessionConfig, SessionId, SessionManager, SessionSnapshot,
    Track, TrackCatalog,
};
pub use store::{FsSubmissionStore, SubmissionKey, SubmissionStore};
