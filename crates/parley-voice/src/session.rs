//! One spoken turn: capture the question, hand it to the worker, wait for
//! the answer, speak it.
//!
//! ```text
//! AwaitingPrompt ──no slot──────────────────────▶ NoPromptCaptured
//!       │
//!       ▼
//!   Dispatched ──transport error / status ≥ 400─▶ DispatchFailed
//!       │
//!       ▼
//!    Polling ──text──────────────────────────────▶ Answered
//!       ├──────deadline──────────────────────────▶ TimedOut
//!       └──────cancel────────────────────────────▶ Cancelled
//! ```
//!
//! Turns are independent; nothing is remembered between them.

use crate::config::RelayConfig;
use crate::dispatch::{is_rejection, Dispatcher};
use crate::envelope::{Intent, RequestEnvelope, RequestKind, VoiceReply};
use parley_correlation::{PollOutcome, Poller, ResultSource};
use parley_types::{RequestId, WorkItem};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

pub const WELCOME: &str = "Welcome to your local AI agent. Ask me anything.";
pub const WELCOME_REPROMPT: &str = "What would you like to ask?";
pub const NO_PROMPT: &str = "I didn't catch your question. Please say it again.";
pub const UNREACHABLE: &str = "Sorry, I couldn't reach the AI server.";
pub const WORKER_ERROR: &str = "The AI server returned an error. Try again later.";
pub const TIMED_OUT: &str = "Sorry, the AI didn't respond in time.";
pub const NOT_UNDERSTOOD: &str = "I didn't understand that. Please ask again.";
pub const IDLE: &str = "I'm here. You can ask me anything.";
pub const INTERNAL_ERROR: &str = "Sorry, I ran into an error.";

/// States of a spoken turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingPrompt,
    Dispatched,
    Polling,
    Answered,
    TimedOut,
    DispatchFailed,
    NoPromptCaptured,
    Cancelled,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingPrompt => "awaiting_prompt",
            Self::Dispatched => "dispatched",
            Self::Polling => "polling",
            Self::Answered => "answered",
            Self::TimedOut => "timed_out",
            Self::DispatchFailed => "dispatch_failed",
            Self::NoPromptCaptured => "no_prompt_captured",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the work item never reached a running worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchFailure {
    /// No status was received (DNS, connect, timeout), or no webhook is set.
    Transport(String),
    /// The worker answered with an error status.
    Rejected(u16),
}

/// Terminal outcome of a spoken turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Answered(String),
    TimedOut,
    DispatchFailed(DispatchFailure),
    NoPromptCaptured,
    Cancelled,
}

impl SessionOutcome {
    pub fn state(&self) -> SessionState {
        match self {
            Self::Answered(_) => SessionState::Answered,
            Self::TimedOut => SessionState::TimedOut,
            Self::DispatchFailed(_) => SessionState::DispatchFailed,
            Self::NoPromptCaptured => SessionState::NoPromptCaptured,
            Self::Cancelled => SessionState::Cancelled,
        }
    }

    /// Maps the outcome to what the user hears. Raw error detail never
    /// reaches the reply.
    pub fn into_reply(self) -> VoiceReply {
        match self {
            Self::Answered(text) => VoiceReply::say(text),
            Self::TimedOut | Self::Cancelled => VoiceReply::say(TIMED_OUT),
            Self::DispatchFailed(DispatchFailure::Transport(_)) => VoiceReply::say(UNREACHABLE),
            Self::DispatchFailed(DispatchFailure::Rejected(_)) => VoiceReply::say(WORKER_ERROR),
            Self::NoPromptCaptured => VoiceReply::ask(NO_PROMPT, NO_PROMPT),
        }
    }
}

/// Trims `text` and truncates it to at most `max_chars` characters.
pub fn speech_safe(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect()
}

/// Orchestrates dispatch, polling, and reply for each spoken turn.
#[derive(Debug, Clone)]
pub struct SessionAdapter<S> {
    dispatcher: Dispatcher,
    poller: Poller<S>,
    timeout: Duration,
    max_speech_chars: usize,
}

impl<S> SessionAdapter<S>
where
    S: ResultSource<Output = String> + Sync,
{
    pub fn new(config: &RelayConfig, dispatcher: Dispatcher, source: S) -> Self {
        Self {
            dispatcher,
            poller: Poller::new(source, config.poll_interval()),
            timeout: config.timeout(),
            max_speech_chars: config.max_speech_chars,
        }
    }

    /// Answers one inbound voice request.
    pub async fn handle(&self, envelope: &RequestEnvelope) -> VoiceReply {
        self.handle_until_cancelled(envelope, std::future::pending())
            .await
    }

    /// Like [`handle`](Self::handle), but abandons polling when `cancel`
    /// resolves.
    pub async fn handle_until_cancelled<C>(
        &self,
        envelope: &RequestEnvelope,
        cancel: C,
    ) -> VoiceReply
    where
        C: Future<Output = ()>,
    {
        match envelope.kind() {
            RequestKind::Launch => VoiceReply::ask(WELCOME, WELCOME_REPROMPT),
            RequestKind::Ask(intent) => self.run_turn(intent, cancel).await.into_reply(),
            RequestKind::Fallback => {
                info!("fallback intent");
                VoiceReply::ask(NOT_UNDERSTOOD, NOT_UNDERSTOOD)
            }
            RequestKind::SessionEnded => VoiceReply::empty(),
            RequestKind::Unhandled => {
                warn!(
                    kind = %envelope.request.kind,
                    intent = envelope.request.intent.as_ref().map(|i| i.name.as_str()),
                    "unhandled voice request"
                );
                VoiceReply::ask(IDLE, IDLE)
            }
        }
    }

    /// Runs a turn for an ask intent, extracting the prompt from its slots.
    pub async fn run_turn<C>(&self, intent: &Intent, cancel: C) -> SessionOutcome
    where
        C: Future<Output = ()>,
    {
        info!(state = %SessionState::AwaitingPrompt, "ask intent received");
        match intent.prompt() {
            Some(prompt) => self.ask_until_cancelled(prompt, cancel).await,
            None => {
                info!(state = %SessionState::NoPromptCaptured, "no prompt in slots");
                SessionOutcome::NoPromptCaptured
            }
        }
    }

    /// Relays `prompt` under a freshly minted identifier.
    pub async fn ask(&self, prompt: &str) -> SessionOutcome {
        self.ask_until_cancelled(prompt, std::future::pending())
            .await
    }

    pub async fn ask_until_cancelled<C>(&self, prompt: &str, cancel: C) -> SessionOutcome
    where
        C: Future<Output = ()>,
    {
        self.ask_with_id(RequestId::generate(), prompt, cancel)
            .await
    }

    /// Relays `prompt` under `request_id`: dispatch, then poll until the
    /// answer, the deadline, or `cancel`.
    pub async fn ask_with_id<C>(
        &self,
        request_id: RequestId,
        prompt: &str,
        cancel: C,
    ) -> SessionOutcome
    where
        C: Future<Output = ()>,
    {
        let item = WorkItem::new(request_id, prompt);
        let request_id = &item.request_id;

        let status = match self.dispatcher.dispatch(&item).await {
            Ok(status) => status,
            Err(e) => {
                warn!(
                    request_id = %request_id,
                    state = %SessionState::DispatchFailed,
                    error = %e,
                    "could not reach worker"
                );
                return SessionOutcome::DispatchFailed(DispatchFailure::Transport(e.to_string()));
            }
        };

        if is_rejection(status) {
            warn!(
                request_id = %request_id,
                state = %SessionState::DispatchFailed,
                status = status.as_u16(),
                "worker rejected work item"
            );
            return SessionOutcome::DispatchFailed(DispatchFailure::Rejected(status.as_u16()));
        }
        info!(
            request_id = %request_id,
            state = %SessionState::Dispatched,
            "worker accepted work item"
        );

        let deadline = Instant::now() + self.timeout;
        info!(
            request_id = %request_id,
            state = %SessionState::Polling,
            timeout_ms = self.timeout.as_millis() as u64,
            "waiting for result"
        );

        match self
            .poller
            .poll_until_cancelled(request_id, deadline, cancel)
            .await
        {
            PollOutcome::Ready { value, attempts } => {
                let text = speech_safe(&value, self.max_speech_chars);
                info!(
                    request_id = %request_id,
                    state = %SessionState::Answered,
                    attempts,
                    chars = text.chars().count(),
                    "speaking result"
                );
                SessionOutcome::Answered(text)
            }
            PollOutcome::TimedOut { attempts } => {
                warn!(
                    request_id = %request_id,
                    state = %SessionState::TimedOut,
                    attempts,
                    "no result before deadline"
                );
                SessionOutcome::TimedOut
            }
            PollOutcome::Cancelled { attempts } => {
                info!(
                    request_id = %request_id,
                    state = %SessionState::Cancelled,
                    attempts,
                    "turn cancelled"
                );
                SessionOutcome::Cancelled
            }
        }
    }
}
