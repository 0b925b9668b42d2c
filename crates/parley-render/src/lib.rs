//! Client for a local media-rendering service.
//!
//! Jobs follow the same asynchronous shape as the voice relay: submit work,
//! get an opaque job id back, then poll the service's history until the job
//! reports an output file or the wait runs out.

pub mod client;
pub mod config;
pub mod error;
pub mod status;
pub mod template;
pub mod tool;

pub use client::RenderClient;
pub use config::RenderConfig;
pub use error::RenderError;
pub use status::{JobReport, JobStatus, ReportStatus};
pub use template::{RenderRequest, WorkflowTemplate, DEFAULT_NEGATIVE_PROMPT};
pub use tool::RenderTool;
