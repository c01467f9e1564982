//! Assistant layer: backend selection and conversation state
//!
//! The chat surface talks to three pieces. [`ConversationSession`] holds
//! the transcript and busy flag; [`ChatBackend`] is the reply strategy,
//! live or demo; [`BackendSelector`] probes the inference endpoint once,
//! binds a backend to the session, and drives respond/clear.

mod backend;
mod selector;
mod session;

pub use backend::{ChatBackend, EchoBackend, RemoteBackend};
pub use selector::{
    BackendSelection, BackendSelector, GREETING_DEMO, GREETING_LIVE, REPLY_ERROR,
};
pub use session::{ChatMessage, ConversationSession, Role};
