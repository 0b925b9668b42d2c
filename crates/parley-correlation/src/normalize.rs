//! Extraction of flat answer text from worker payloads.
//!
//! The worker's output shape is not contractually fixed. Each
//! [`NormalizeRule`] recognizes one known shape; a [`Normalizer`] tries its
//! rules in order and the first one whose path holds a string decides the
//! result. Every rule is total: a missing key, a wrong type, or an empty
//! array simply means the rule does not match. A matching rule whose text is
//! blank makes the whole payload absent.

use serde_json::Value;

/// One recognized payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeRule {
    /// The payload is itself a JSON string.
    PlainString,
    /// Chat-completion shape: `content.choices[0].message.content`.
    ChatCompletion,
    /// A mapping with a flat `text` string.
    FlatText,
}

const DEFAULT_RULES: &[NormalizeRule] = &[
    NormalizeRule::PlainString,
    NormalizeRule::ChatCompletion,
    NormalizeRule::FlatText,
];

impl NormalizeRule {
    /// Returns the raw (untrimmed) text this rule finds in `payload`.
    pub fn extract(self, payload: &Value) -> Option<&str> {
        match self {
            Self::PlainString => payload.as_str(),
            Self::ChatCompletion => payload
                .get("content")?
                .get("choices")?
                .get(0)?
                .get("message")?
                .get("content")?
                .as_str(),
            Self::FlatText => payload.as_object()?.get("text")?.as_str(),
        }
    }
}

/// The shape a payload was recognized as, carrying the trimmed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape<'a> {
    PlainString(&'a str),
    ChatCompletion(&'a str),
    FlatText(&'a str),
    Unrecognized,
}

impl<'a> PayloadShape<'a> {
    fn matched(rule: NormalizeRule, text: &'a str) -> Self {
        match rule {
            NormalizeRule::PlainString => Self::PlainString(text),
            NormalizeRule::ChatCompletion => Self::ChatCompletion(text),
            NormalizeRule::FlatText => Self::FlatText(text),
        }
    }

    pub fn text(self) -> Option<&'a str> {
        match self {
            Self::PlainString(t) | Self::ChatCompletion(t) | Self::FlatText(t) => Some(t),
            Self::Unrecognized => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlainString(_) => "plain_string",
            Self::ChatCompletion(_) => "chat_completion",
            Self::FlatText(_) => "flat_text",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// An ordered set of normalization rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    rules: Vec<NormalizeRule>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
        }
    }
}

impl Normalizer {
    /// Builds a normalizer that tries `rules` in the given order.
    pub fn with_rules(rules: impl Into<Vec<NormalizeRule>>) -> Self {
        Self {
            rules: rules.into(),
        }
    }

    pub fn rules(&self) -> &[NormalizeRule] {
        &self.rules
    }

    /// Classifies `payload` by the first rule whose path holds a string.
    pub fn classify<'a>(&self, payload: &'a Value) -> PayloadShape<'a> {
        let Some((rule, text)) = self
            .rules
            .iter()
            .find_map(|&rule| rule.extract(payload).map(|text| (rule, text.trim())))
        else {
            return PayloadShape::Unrecognized;
        };
        if text.is_empty() {
            PayloadShape::Unrecognized
        } else {
            PayloadShape::matched(rule, text)
        }
    }

    /// Returns the trimmed answer text, or `None` if no rule matched.
    pub fn normalize(&self, payload: &Value) -> Option<String> {
        self.classify(payload).text().map(str::to_string)
    }
}

/// Normalizes `payload` with the default rule order.
pub fn normalize(payload: &Value) -> Option<String> {
    Normalizer::default().normalize(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_chat_completion_is_trimmed() {
        let payload = json!({"content": {"choices": [{"message": {"content": " hi "}}]}});
        assert_eq!(normalize(&payload).as_deref(), Some("hi"));
    }

    #[test]
    fn plain_string_is_trimmed() {
        assert_eq!(normalize(&json!("  hello  ")).as_deref(), Some("hello"));
    }

    #[test]
    fn flat_text_key() {
        assert_eq!(normalize(&json!({"text": "x"})).as_deref(), Some("x"));
    }

    #[test]
    fn empty_mapping_is_absent() {
        assert_eq!(normalize(&json!({})), None);
    }

    #[test]
    fn malformed_nested_paths_fall_back_to_text() {
        let cases = [
            json!({"content": "not a mapping", "text": "fallback"}),
            json!({"content": {"choices": []}, "text": "fallback"}),
            json!({"content": {"choices": [{"message": {"content": 42}}]}, "text": "fallback"}),
            json!({"content": {"choices": [null]}, "text": "fallback"}),
            json!({"content": {"choices": {"0": {}}}, "text": "fallback"}),
        ];
        for payload in cases {
            assert_eq!(
                normalize(&payload).as_deref(),
                Some("fallback"),
                "payload: {payload}"
            );
        }
    }

    #[test]
    fn blank_chat_content_does_not_fall_back_to_text() {
        let payload = json!({"content": {"choices": [{"message": {"content": "   "}}]}, "text": "flat"});
        assert_eq!(normalize(&payload), None);
        assert_eq!(
            Normalizer::default().classify(&payload),
            PayloadShape::Unrecognized
        );
    }

    #[test]
    fn unrecognized_shapes_are_absent() {
        for payload in [
            json!(null),
            json!(17),
            json!(true),
            json!(["a", "b"]),
            json!({"text": 5}),
            json!("   "),
        ] {
            assert_eq!(normalize(&payload), None, "payload: {payload}");
        }
    }

    #[test]
    fn classify_reports_the_matching_rule() {
        let normalizer = Normalizer::default();
        let chat = json!({"content": {"choices": [{"message": {"content": "a"}}]}, "text": "b"});
        assert_eq!(normalizer.classify(&chat), PayloadShape::ChatCompletion("a"));
        assert_eq!(normalizer.classify(&json!({"text": "b"})).as_str(), "flat_text");
        assert_eq!(normalizer.classify(&json!([])), PayloadShape::Unrecognized);
    }

    #[test]
    fn custom_rule_order_is_respected() {
        let payload = json!({"content": {"choices": [{"message": {"content": "chat"}}]}, "text": "flat"});
        let flat_first =
            Normalizer::with_rules([NormalizeRule::FlatText, NormalizeRule::ChatCompletion]);
        assert_eq!(flat_first.normalize(&payload).as_deref(), Some("flat"));

        let strings_only = Normalizer::with_rules(vec![NormalizeRule::PlainString]);
        assert_eq!(strings_only.normalize(&payload), None);
        assert_eq!(strings_only.rules(), &[NormalizeRule::PlainString]);
    }
}
