//! Error types for the coaching core.

use thiserror::Error;

use crate::llm::ServiceError;

/// Errors surfaced by [`crate::coach::CoachContext`].
///
/// Transport failures never appear here for `send_message` or
/// `generate_quick_tip`: those are absorbed into fallback text at the
/// boundary. `Unconfigured` only reaches callers from `open_session`.
#[derive(Error, Debug)]
pub enum CoachError {
    /// No credential is configured for the language-model service
    #[error("language-model service unavailable: no API key configured")]
    Unconfigured,

    /// A message was sent before the session was opened
    #[error("chat session not initialized")]
    SessionNotReady,

    /// A reply is still outstanding for the previous message
    #[error("still awaiting a reply to the previous message")]
    AwaitingReply,

    /// Blank message text
    #[error("message is empty")]
    EmptyMessage,

    /// The service client could not be constructed
    #[error("service client error: {0}")]
    Service(#[from] ServiceError),
}
