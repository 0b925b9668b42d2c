//! Workflow templates.
//!
//! A workflow is an opaque JSON graph owned by the rendering service. The
//! relay only substitutes placeholder leaves: a string leaf equal to
//! `{{positive_prompt}}` or `{{negative_prompt}}` becomes the prompt text,
//! and `{{frames}}` becomes the frame count as a number. Everything else is
//! passed through untouched.

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::error::RenderError;

pub const POSITIVE_PROMPT: &str = "{{positive_prompt}}";
pub const NEGATIVE_PROMPT: &str = "{{negative_prompt}}";
pub const FRAMES: &str = "{{frames}}";

pub const DEFAULT_NEGATIVE_PROMPT: &str = "blurry, low quality, jpeg artifacts, distorted, ugly";

/// Frames rendered per second of requested clip length.
pub const FRAMES_PER_SECOND: u32 = 8;

const TEXT_TO_VIDEO: &str = include_str!("../workflows/text_to_video.json");

/// What to render.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenderRequest {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
}

impl RenderRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: None,
            duration_seconds: None,
        }
    }

    /// The negative prompt, or the default one when blank or unset.
    pub fn negative_prompt(&self) -> &str {
        self.negative_prompt
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(DEFAULT_NEGATIVE_PROMPT)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowTemplate {
    workflow: Value,
}

impl WorkflowTemplate {
    /// Wraps a workflow graph.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Template` if the graph is not a JSON object or
    /// has no `{{positive_prompt}}` leaf.
    pub fn from_value(workflow: Value) -> Result<Self, RenderError> {
        if !workflow.is_object() {
            return Err(RenderError::Template(
                "workflow must be a JSON object of nodes".to_string(),
            ));
        }
        if !contains_leaf(&workflow, POSITIVE_PROMPT) {
            return Err(RenderError::Template(format!(
                "workflow has no {} placeholder",
                POSITIVE_PROMPT
            )));
        }
        Ok(Self { workflow })
    }

    /// Loads a template from a JSON file.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RenderError::Template(format!("failed to read {}: {}", path.display(), e))
        })?;
        let workflow = serde_json::from_str(&raw).map_err(|e| {
            RenderError::Template(format!("failed to parse {}: {}", path.display(), e))
        })?;
        Self::from_value(workflow)
    }

    /// The bundled text-to-video workflow.
    pub fn text_to_video() -> Result<Self, RenderError> {
        let workflow = serde_json::from_str(TEXT_TO_VIDEO)
            .map_err(|e| RenderError::Template(format!("bundled workflow: {}", e)))?;
        Self::from_value(workflow)
    }

    /// Returns a copy of the workflow with every placeholder filled in.
    pub fn instantiate(&self, request: &RenderRequest, default_duration_seconds: u32) -> Value {
        let duration = request
            .duration_seconds
            .filter(|d| *d > 0)
            .unwrap_or(default_duration_seconds);
        let fill = Fill {
            positive: request.prompt.trim(),
            negative: request.negative_prompt(),
            frames: duration.saturating_mul(FRAMES_PER_SECOND),
        };
        let mut workflow = self.workflow.clone();
        fill.apply(&mut workflow);
        workflow
    }
}

struct Fill<'a> {
    positive: &'a str,
    negative: &'a str,
    frames: u32,
}

impl Fill<'_> {
    fn apply(&self, value: &mut Value) {
        match value {
            Value::String(s) => {
                let filled = match s.as_str() {
                    POSITIVE_PROMPT => Value::from(self.positive),
                    NEGATIVE_PROMPT => Value::from(self.negative),
                    FRAMES => Value::from(self.frames),
                    _ => return,
                };
                *value = filled;
            }
            Value::Array(items) => items.iter_mut().for_each(|item| self.apply(item)),
            Value::Object(map) => map.values_mut().for_each(|item| self.apply(item)),
            _ => {}
        }
    }
}

fn contains_leaf(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s == needle,
        Value::Array(items) => items.iter().any(|item| contains_leaf(item, needle)),
        Value::Object(map) => map.values().any(|item| contains_leaf(item, needle)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bundled_workflow_fills_prompts_and_frames() {
        let template = WorkflowTemplate::text_to_video().unwrap();
        let workflow = template.instantiate(&RenderRequest::new("  a red fox in snow "), 10);

        assert_eq!(workflow["89"]["inputs"]["text"], "a red fox in snow");
        assert_eq!(workflow["72"]["inputs"]["text"], DEFAULT_NEGATIVE_PROMPT);
        assert_eq!(workflow["74"]["inputs"]["length"], 80);
        assert_eq!(workflow["78"]["inputs"]["positive"], json!(["89", 0]));
    }

    #[test]
    fn explicit_negative_prompt_and_duration_win() {
        let template = WorkflowTemplate::text_to_video().unwrap();
        let request = RenderRequest {
            prompt: "waves".to_string(),
            negative_prompt: Some("people".to_string()),
            duration_seconds: Some(3),
        };
        let workflow = template.instantiate(&request, 10);
        assert_eq!(workflow["72"]["inputs"]["text"], "people");
        assert_eq!(workflow["74"]["inputs"]["length"], 24);
    }

    #[test]
    fn blank_negative_prompt_uses_default() {
        let request = RenderRequest {
            negative_prompt: Some("   ".to_string()),
            ..RenderRequest::new("x")
        };
        assert_eq!(request.negative_prompt(), DEFAULT_NEGATIVE_PROMPT);
    }

    #[test]
    fn placeholders_inside_longer_strings_are_left_alone() {
        let template = WorkflowTemplate::from_value(json!({
            "1": {"inputs": {"text": "{{positive_prompt}}", "note": "see {{frames}}"}}
        }))
        .unwrap();
        let workflow = template.instantiate(&RenderRequest::new("cat"), 2);
        assert_eq!(workflow["1"]["inputs"]["text"], "cat");
        assert_eq!(workflow["1"]["inputs"]["note"], "see {{frames}}");
    }

    #[test]
    fn rejects_templates_without_prompt_slot() {
        assert!(matches!(
            WorkflowTemplate::from_value(json!({"1": {"inputs": {"text": "fixed"}}})),
            Err(RenderError::Template(_))
        ));
        assert!(WorkflowTemplate::from_value(json!(["not", "an", "object"])).is_err());
    }
}
