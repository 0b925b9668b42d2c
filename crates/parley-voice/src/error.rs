use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Failure to hand a work item to the worker before it reported any status.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("no worker webhook URL configured")]
    NotConfigured,

    /// DNS, connect, timeout, or other transport-level failure.
    #[error("worker dispatch transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
