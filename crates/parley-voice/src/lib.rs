//! Voice relay for the Parley platform.
//!
//! Turns a spoken question into a work item for an externally hosted AI
//! agent, waits for the agent's answer to land in the correlation store, and
//! turns the answer back into a spoken reply.
//!
//! The caller and the worker never share a connection: the dispatcher fires
//! the work item at the worker's webhook, the worker later writes its answer
//! to the ingress endpoint, and the session adapter polls for it under a
//! deadline.

pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod session;
pub mod source;

pub use config::RelayConfig;
pub use dispatch::Dispatcher;
pub use envelope::{RequestEnvelope, ResponseEnvelope, VoiceReply};
pub use error::{DispatchError, VoiceError};
pub use session::{DispatchFailure, SessionAdapter, SessionOutcome, SessionState};
pub use source::HttpResultSource;
