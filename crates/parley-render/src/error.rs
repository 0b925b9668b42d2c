//! Error types for the render client.

/// Errors from talking to the rendering service or preparing a workflow.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The rendering service could not be reached, or the call timed out.
    #[error("render service transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The rendering service answered with a non-success status.
    #[error("render service returned status {0}")]
    Status(u16),

    /// The rendering service's body was not the expected JSON.
    #[error("render service response could not be decoded: {0}")]
    Decode(String),

    /// A submission was accepted but no job identifier came back.
    #[error("no prompt_id returned from render service")]
    MissingPromptId,

    /// The workflow template is unusable.
    #[error("workflow template error: {0}")]
    Template(String),

    /// The render settings are invalid.
    #[error("render configuration error: {0}")]
    Config(String),
}
