//! Voice platform request and response envelopes.
//!
//! Only the fields the relay reads are modelled; everything else in the
//! platform's envelope is ignored. Deserialization is lenient: a missing
//! `request`, `type`, or `intent` produces an unhandled request rather than
//! an error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Slot names tried, in order, when looking for the spoken question.
pub const PROMPT_SLOTS: &[&str] = &["Query", "query", "Question", "question", "q", "text"];

/// Intent that carries a question for the worker.
pub const ASK_INTENT: &str = "AskIntent";

/// Platform intent raised when the utterance matched nothing.
pub const FALLBACK_INTENT: &str = "AMAZON.FallbackIntent";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub request: InboundRequest,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundRequest {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub intent: Option<Intent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Intent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slots: HashMap<String, Slot>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Slot {
    #[serde(default)]
    pub value: Option<String>,
}

/// What the relay does with an inbound request.
#[derive(Debug, Clone, Copy)]
pub enum RequestKind<'a> {
    Launch,
    Ask(&'a Intent),
    Fallback,
    SessionEnded,
    Unhandled,
}

impl RequestEnvelope {
    pub fn kind(&self) -> RequestKind<'_> {
        match (self.request.kind.as_str(), self.request.intent.as_ref()) {
            ("LaunchRequest", _) => RequestKind::Launch,
            ("SessionEndedRequest", _) => RequestKind::SessionEnded,
            ("IntentRequest", Some(intent)) if intent.name == ASK_INTENT => {
                RequestKind::Ask(intent)
            }
            ("IntentRequest", Some(intent)) if intent.name == FALLBACK_INTENT => {
                RequestKind::Fallback
            }
            _ => RequestKind::Unhandled,
        }
    }
}

impl Intent {
    /// Returns the first non-blank value among [`PROMPT_SLOTS`].
    pub fn prompt(&self) -> Option<&str> {
        PROMPT_SLOTS.iter().find_map(|name| {
            self.slots
                .get(*name)?
                .value
                .as_deref()
                .filter(|value| !value.trim().is_empty())
        })
    }
}

/// A spoken reply, independent of the platform's envelope format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VoiceReply {
    pub speech: Option<String>,
    pub reprompt: Option<String>,
    pub end_session: Option<bool>,
}

impl VoiceReply {
    /// Speaks `text` and closes the session.
    pub fn say(text: impl Into<String>) -> Self {
        Self {
            speech: Some(text.into()),
            reprompt: None,
            end_session: Some(true),
        }
    }

    /// Speaks `text`, then keeps the session open and re-prompts with
    /// `reprompt`.
    pub fn ask(text: impl Into<String>, reprompt: impl Into<String>) -> Self {
        Self {
            speech: Some(text.into()),
            reprompt: Some(reprompt.into()),
            end_session: Some(false),
        }
    }

    /// An empty acknowledgement.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn into_envelope(self) -> ResponseEnvelope {
        ResponseEnvelope {
            version: "1.0".to_string(),
            response: ResponseBody {
                output_speech: self.speech.map(OutputSpeech::plain),
                reprompt: self.reprompt.map(|text| Reprompt {
                    output_speech: OutputSpeech::plain(text),
                }),
                should_end_session: self.end_session,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub version: String,
    pub response: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub output_speech: Option<OutputSpeech>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reprompt: Option<Reprompt>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub should_end_session: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpeech {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl OutputSpeech {
    fn plain(text: String) -> Self {
        Self {
            kind: "PlainText".to_string(),
            text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: serde_json::Value) -> RequestEnvelope {
        serde_json::from_value(value).expect("envelope should deserialize")
    }

    #[test]
    fn routes_request_kinds() {
        assert!(matches!(
            envelope(json!({"request": {"type": "LaunchRequest", "requestId": "x"}})).kind(),
            RequestKind::Launch
        ));
        assert!(matches!(
            envelope(json!({"request": {"type": "SessionEndedRequest", "reason": "USER_INITIATED"}}))
                .kind(),
            RequestKind::SessionEnded
        ));
        assert!(matches!(
            envelope(json!({"request": {"type": "IntentRequest", "intent": {"name": "AskIntent"}}}))
                .kind(),
            RequestKind::Ask(_)
        ));
        assert!(matches!(
            envelope(json!({"request": {"type": "IntentRequest", "intent": {"name": "AMAZON.FallbackIntent"}}}))
                .kind(),
            RequestKind::Fallback
        ));
        assert!(matches!(
            envelope(json!({"request": {"type": "IntentRequest", "intent": {"name": "AMAZON.StopIntent"}}}))
                .kind(),
            RequestKind::Unhandled
        ));
        assert!(matches!(
            envelope(json!({"request": {"type": "IntentRequest"}})).kind(),
            RequestKind::Unhandled
        ));
        assert!(matches!(envelope(json!({})).kind(), RequestKind::Unhandled));
    }

    #[test]
    fn prompt_uses_first_non_blank_slot_in_priority_order() {
        let intent: Intent = serde_json::from_value(json!({
            "name": "AskIntent",
            "slots": {
                "text": {"name": "text", "value": "from text"},
                "Question": {"name": "Question", "value": "from question"},
                "Query": {"name": "Query", "value": "   "},
                "query": {"name": "query"}
            }
        }))
        .unwrap();
        assert_eq!(intent.prompt(), Some("from question"));
    }

    #[test]
    fn prompt_absent_when_no_slot_has_a_value() {
        let intent: Intent = serde_json::from_value(json!({
            "name": "AskIntent",
            "slots": {"Other": {"value": "ignored"}, "Query": {"value": null}}
        }))
        .unwrap();
        assert_eq!(intent.prompt(), None);
    }

    #[test]
    fn reply_envelope_shapes() {
        let value = serde_json::to_value(VoiceReply::say("It is noon.").into_envelope()).unwrap();
        assert_eq!(
            value,
            json!({
                "version": "1.0",
                "response": {
                    "outputSpeech": {"type": "PlainText", "text": "It is noon."},
                    "shouldEndSession": true
                }
            })
        );

        let value = serde_json::to_value(VoiceReply::ask("Hi.", "Again?").into_envelope()).unwrap();
        assert_eq!(value["response"]["reprompt"]["outputSpeech"]["text"], "Again?");
        assert_eq!(value["response"]["shouldEndSession"], false);

        let value = serde_json::to_value(VoiceReply::empty().into_envelope()).unwrap();
        assert_eq!(value, json!({"version": "1.0", "response": {}}));
    }
}
