//! Response Reconciliation
//!
//! Turns a parsed `chat/completions` response into a [`GenerationResult`].
//!
//! Structured `tool_calls` always win. When the server leaves them empty but
//! the model wrote the call into `content`, the reconciler tries three text
//! forms in order:
//!
//! ```text
//! {"name": "...", "arguments": {...}}                 direct call
//! {"content": "<json text>"} / {"content": {...}}     nested call
//! {"portalName": "...", "reason": "..."}              bare arguments,
//!                                                     matched against specs
//! ```
//!
//! Anything else is returned as plain text. Extraction never errors.

use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};
use crate::provider::GenerationResult;
use crate::tool::{ToolInvocation, ToolSpecification, new_call_id};
use crate::usage::TokenUsage;

/// Minimum fraction of a spec's properties a bare-arguments object must carry
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.8;

/// How many `{"content": "<json>"}` layers are unwrapped before giving up
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 3;

/// Reconciler tunables
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReconcileConfig {
    pub match_threshold: f64,
    pub max_nesting_depth: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Parse a raw response body
pub fn parse_body(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(BridgeError::WireParse)
}

/// Stateless response reconciler
#[derive(Clone, Debug, Default)]
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    pub const fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Reconcile a parsed response against the specs that were advertised
    pub fn reconcile(&self, response: &Value, specs: &[ToolSpecification]) -> Result<GenerationResult> {
        let choice = response
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .ok_or_else(|| BridgeError::protocol("response has no choices"))?;
        let message = choice
            .get("message")
            .filter(|m| m.is_object())
            .ok_or_else(|| BridgeError::protocol("first choice has no message"))?;

        let usage = TokenUsage::from_response(response);

        let mut result = if let Some(calls) = message
            .get("tool_calls")
            .and_then(Value::as_array)
            .filter(|calls| !calls.is_empty())
        {
            let invocations = calls
                .iter()
                .enumerate()
                .map(|(index, call)| structured_invocation(index, call))
                .collect::<Result<Vec<_>>>()?;
            tracing::info!(count = invocations.len(), "Model returned structured tool calls");
            GenerationResult::tool_calls(invocations, usage)
        } else {
            match message.get("content") {
                Some(Value::String(content)) => self.reconcile_content(content, specs, usage),
                None | Some(Value::Null) => {
                    return Err(BridgeError::protocol(
                        "message has neither content nor tool_calls",
                    ));
                }
                Some(other) => {
                    return Err(BridgeError::protocol(format!(
                        "unsupported message content of type {}",
                        json_type(other)
                    )));
                }
            }
        };

        result.finish_reason = choice
            .get("finish_reason")
            .and_then(Value::as_str)
            .map(str::to_string);
        result.model = response.get("model").and_then(Value::as_str).map(str::to_string);
        Ok(result)
    }

    fn reconcile_content(
        &self,
        content: &str,
        specs: &[ToolSpecification],
        usage: TokenUsage,
    ) -> GenerationResult {
        if let Some(invocation) = self.try_extract(content, specs) {
            tracing::info!(tool = %invocation.name, "Recovered tool call from message content");
            return GenerationResult::tool_calls(vec![invocation], usage);
        }
        tracing::debug!(len = content.len(), "Model returned a text response");
        GenerationResult::text(content, usage)
    }

    /// Try to recover a tool invocation written into text content
    pub fn try_extract(&self, content: &str, specs: &[ToolSpecification]) -> Option<ToolInvocation> {
        self.extract_at(content, specs, 0)
    }

    fn extract_at(&self, content: &str, specs: &[ToolSpecification], depth: usize) -> Option<ToolInvocation> {
        let parsed: Value = match serde_json::from_str(content.trim()) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "Content is not a tool call JSON");
                return None;
            }
        };
        let object = parsed.as_object()?;

        if let Some(invocation) = direct_call(object) {
            return Some(invocation);
        }

        if let Some(inner) = object.get("content") {
            match inner {
                Value::String(text) => {
                    if depth + 1 > self.config.max_nesting_depth {
                        tracing::debug!(depth, "Nested content too deep, giving up");
                        return None;
                    }
                    return self.extract_at(text, specs, depth + 1);
                }
                Value::Object(inner) => {
                    if let Some(invocation) = direct_call(inner) {
                        return Some(invocation);
                    }
                }
                _ => {}
            }
        }

        specs
            .iter()
            .find(|spec| self.matches(object, spec))
            .map(|spec| ToolInvocation::with_fresh_id(&spec.name, parsed.to_string()))
    }

    /// Whether a bare-arguments object fits a spec's parameter schema.
    ///
    /// Every required name must be present, and the share of declared
    /// properties present must reach the threshold. A spec without
    /// properties never matches.
    pub fn matches(&self, object: &Map<String, Value>, spec: &ToolSpecification) -> bool {
        let Some(params) = spec.parameters.as_ref() else {
            return false;
        };
        if params.properties.is_empty() || !params.required_present(object) {
            return false;
        }
        params.coverage(object) >= self.config.match_threshold
    }
}

/// `{"name": "...", "arguments": ...}`
///
/// Scalar names are taken as their text; a null or structured name does not
/// count as a direct call.
fn direct_call(object: &Map<String, Value>) -> Option<ToolInvocation> {
    let name = match object.get("name")? {
        Value::String(name) => name.clone(),
        scalar @ (Value::Number(_) | Value::Bool(_)) => scalar.to_string(),
        _ => return None,
    };
    let arguments = object.get("arguments")?;
    Some(ToolInvocation::with_fresh_id(name, arguments.to_string()))
}

fn structured_invocation(index: usize, call: &Value) -> Result<ToolInvocation> {
    let function = call
        .get("function")
        .filter(|f| f.is_object())
        .ok_or_else(|| BridgeError::protocol(format!("tool call {index} has no function")))?;
    let name = function
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| BridgeError::protocol(format!("tool call {index} has no function name")))?;

    let arguments = match function.get("arguments") {
        Some(Value::String(raw)) => raw.clone(),
        None | Some(Value::Null) => "{}".to_string(),
        Some(other) => other.to_string(),
    };
    let id = call
        .get("id")
        .and_then(Value::as_str)
        .map_or_else(new_call_id, str::to_string);

    tracing::debug!(tool = name, id = %id, "Structured tool call");
    Ok(ToolInvocation::new(id, name, arguments))
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::GenerationContent;
    use crate::tool::ToolParameters;
    use serde_json::json;

    fn access_request() -> ToolSpecification {
        ToolSpecification::new("createAccessRequest").parameters(
            ToolParameters::object()
                .required_property("portalName", json!({"type": "string"}))
                .required_property("reason", json!({"type": "string"})),
        )
    }

    fn mentor_match() -> ToolSpecification {
        ToolSpecification::new("findMentor").parameters(
            ToolParameters::object()
                .required_property("department", json!({"type": "string"}))
                .property("location", json!({"type": "string"}))
                .property("language", json!({"type": "string"}))
                .property("seniority", json!({"type": "string"}))
                .property("topic", json!({"type": "string"})),
        )
    }

    fn response_with_content(content: &str) -> Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    #[test]
    fn test_structured_calls_in_order() {
        let response = json!({
            "choices": [{
                "message": {
                    "content": "ignored text",
                    "tool_calls": [
                        {"id": "a", "type": "function", "function": {"name": "first", "arguments": "{\"x\": 1}"}},
                        {"id": "b", "type": "function", "function": {"name": "second", "arguments": "{}"}},
                        {"id": "c", "type": "function", "function": {"name": "third", "arguments": "{\"z\":[1,2]}"}}
                    ]
                },
                "finish_reason": "tool_calls"
            }],
            "model": "served-model"
        });

        let result = Reconciler::default().reconcile(&response, &[]).unwrap();
        let calls = result.invocations();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], ToolInvocation::new("a", "first", "{\"x\": 1}"));
        assert_eq!(calls[1].name, "second");
        assert_eq!(calls[2].arguments, "{\"z\":[1,2]}");
        assert_eq!(result.as_text(), None);
        assert_eq!(result.finish_reason.as_deref(), Some("tool_calls"));
        assert_eq!(result.model.as_deref(), Some("served-model"));
    }

    #[test]
    fn test_structured_call_object_arguments_and_missing_id() {
        let response = json!({
            "choices": [{"message": {"tool_calls": [
                {"function": {"name": "ping", "arguments": {"host": "a", "count": 2}}}
            ]}}]
        });
        let result = Reconciler::default().reconcile(&response, &[]).unwrap();
        let call = &result.invocations()[0];
        assert!(call.id.starts_with("call_"));
        assert_eq!(call.arguments, r#"{"host":"a","count":2}"#);
    }

    #[test]
    fn test_structured_call_without_name_is_violation() {
        let response = json!({"choices": [{"message": {"tool_calls": [{"id": "a", "function": {}}]}}]});
        let err = Reconciler::default().reconcile(&response, &[]).unwrap_err();
        assert!(matches!(err, BridgeError::ProtocolViolation(_)));
    }

    #[test]
    fn test_empty_tool_calls_falls_through_to_content() {
        let response = json!({"choices": [{"message": {"content": "hi", "tool_calls": []}}]});
        let result = Reconciler::default().reconcile(&response, &[]).unwrap();
        assert_eq!(result.as_text(), Some("hi"));
    }

    #[test]
    fn test_direct_call_form() {
        let content = r#"{"name":"createAccessRequest","arguments":{"portalName":"Jira","reason":"need access"}}"#;
        let result = Reconciler::default()
            .reconcile(&response_with_content(content), &[access_request()])
            .unwrap();

        let calls = result.invocations();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "createAccessRequest");
        assert_eq!(calls[0].arguments, r#"{"portalName":"Jira","reason":"need access"}"#);
        assert_eq!(
            calls[0].arguments_value().unwrap(),
            json!({"portalName": "Jira", "reason": "need access"})
        );
        assert!(calls[0].id.starts_with("call_"));
    }

    #[test]
    fn test_bare_arguments_form() {
        let content = r#"{"portalName":"Jira","reason":"need access"}"#;
        let result = Reconciler::default()
            .reconcile(&response_with_content(content), &[access_request()])
            .unwrap();

        let calls = result.invocations();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "createAccessRequest");
        assert_eq!(calls[0].arguments, content);
    }

    #[test]
    fn test_missing_required_degrades_to_text() {
        let content = r#"{"portalName":"Jira"}"#;
        let result = Reconciler::default()
            .reconcile(&response_with_content(content), &[access_request()])
            .unwrap();
        assert_eq!(result.content, GenerationContent::Text { content: content.into() });
    }

    #[test]
    fn test_nested_string_content() {
        let content = r#"{"content":"{\"name\":\"x\",\"arguments\":{}}"}"#;
        let invocation = Reconciler::default().try_extract(content, &[]).unwrap();
        assert_eq!(invocation.name, "x");
        assert_eq!(invocation.arguments, "{}");
    }

    #[test]
    fn test_nested_object_content() {
        let content = r#"{"content":{"name":"x","arguments":{"a":1}}}"#;
        let invocation = Reconciler::default().try_extract(content, &[]).unwrap();
        assert_eq!(invocation.name, "x");
        assert_eq!(invocation.arguments, r#"{"a":1}"#);
    }

    #[test]
    fn test_scalar_name_is_coerced() {
        let reconciler = Reconciler::default();

        let invocation = reconciler.try_extract(r#"{"name": 5, "arguments": {"a": 1}}"#, &[]).unwrap();
        assert_eq!(invocation.name, "5");
        assert_eq!(invocation.arguments, r#"{"a":1}"#);

        let invocation = reconciler.try_extract(r#"{"name": true, "arguments": {}}"#, &[]).unwrap();
        assert_eq!(invocation.name, "true");

        assert!(reconciler.try_extract(r#"{"name": null, "arguments": {}}"#, &[]).is_none());
        assert!(reconciler.try_extract(r#"{"name": {"x": 1}, "arguments": {}}"#, &[]).is_none());
    }

    #[test]
    fn test_nested_object_without_call_falls_back_to_outer_arguments() {
        let content = r#"{"content":{"x":1},"portalName":"Jira","reason":"r"}"#;
        let invocation = Reconciler::default().try_extract(content, &[access_request()]).unwrap();
        assert_eq!(invocation.name, "createAccessRequest");
        assert_eq!(invocation.arguments, content);

        assert!(Reconciler::default().try_extract(r#"{"content":{"x":1}}"#, &[access_request()]).is_none());
    }

    #[test]
    fn test_config_accessor() {
        let config = ReconcileConfig { match_threshold: 0.6, max_nesting_depth: 1 };
        assert_eq!(*Reconciler::new(config).config(), config);
        assert_eq!(*Reconciler::default().config(), ReconcileConfig::default());
    }

    #[test]
    fn test_nesting_cap() {
        fn wrap(inner: &str) -> String {
            json!({ "content": inner }).to_string()
        }
        let call = r#"{"name":"x","arguments":{}}"#;
        let three = wrap(&wrap(&wrap(call)));
        let four = wrap(&three);

        let reconciler = Reconciler::default();
        assert!(reconciler.try_extract(&three, &[]).is_some());
        assert!(reconciler.try_extract(&four, &[]).is_none());

        let shallow = Reconciler::new(ReconcileConfig { max_nesting_depth: 0, ..Default::default() });
        assert!(shallow.try_extract(&wrap(call), &[]).is_none());
    }

    #[test]
    fn test_first_matching_spec_wins() {
        let twin = ToolSpecification::new("createAccessRequestV2").parameters(
            access_request().parameters.unwrap(),
        );
        let content = r#"{"portalName":"Jira","reason":"need access"}"#;

        let invocation = Reconciler::default()
            .try_extract(content, &[twin.clone(), access_request()])
            .unwrap();
        assert_eq!(invocation.name, "createAccessRequestV2");

        let invocation = Reconciler::default()
            .try_extract(content, &[access_request(), twin])
            .unwrap();
        assert_eq!(invocation.name, "createAccessRequest");
    }

    #[test]
    fn test_threshold_is_inclusive_and_overridable() {
        // 4 of 5 properties present: exactly 0.8
        let content = r#"{"department":"IT","location":"Istanbul","language":"tr","topic":"onboarding"}"#;
        assert!(Reconciler::default().try_extract(content, &[mentor_match()]).is_some());

        let strict = Reconciler::new(ReconcileConfig { match_threshold: 0.9, ..Default::default() });
        assert!(strict.try_extract(content, &[mentor_match()]).is_none());

        // 3 of 5
        let sparse = r#"{"department":"IT","location":"Istanbul","topic":"onboarding"}"#;
        assert!(Reconciler::default().try_extract(sparse, &[mentor_match()]).is_none());
    }

    #[test]
    fn test_spec_without_properties_never_matches() {
        let content = r#"{"anything": true}"#;
        assert!(Reconciler::default().try_extract(content, &[ToolSpecification::new("ping")]).is_none());
    }

    #[test]
    fn test_non_json_and_non_object_content() {
        let reconciler = Reconciler::default();
        assert!(reconciler.try_extract("Merhaba! How can I help?", &[access_request()]).is_none());
        assert!(reconciler.try_extract("[1, 2, 3]", &[access_request()]).is_none());
        assert!(reconciler.try_extract("\"just a string\"", &[access_request()]).is_none());
        assert!(reconciler.try_extract("", &[access_request()]).is_none());
    }

    #[test]
    fn test_whitespace_around_json_is_ignored() {
        let content = "\n  {\"name\":\"x\",\"arguments\":{}}  \n";
        assert!(Reconciler::default().try_extract(content, &[]).is_some());
    }

    #[test]
    fn test_shape_violations() {
        let reconciler = Reconciler::default();
        for response in [
            json!({}),
            json!({"choices": []}),
            json!({"choices": [{}]}),
            json!({"choices": [{"message": {"content": null}}]}),
            json!({"choices": [{"message": {"role": "assistant"}}]}),
        ] {
            let err = reconciler.reconcile(&response, &[]).unwrap_err();
            assert!(matches!(err, BridgeError::ProtocolViolation(_)), "{response}");
        }
    }

    #[test]
    fn test_usage_is_attached() {
        let mut response = response_with_content("hello");
        response["usage"] = json!({"prompt_tokens": 10});
        let result = Reconciler::default().reconcile(&response, &[]).unwrap();
        assert_eq!(result.usage, TokenUsage { prompt_tokens: 10, completion_tokens: 0, total_tokens: 10 });
    }

    #[test]
    fn test_parse_body() {
        assert!(parse_body(r#"{"choices": []}"#).is_ok());
        assert!(matches!(parse_body("<html>bad gateway</html>"), Err(BridgeError::WireParse(_))));
    }

    #[tokio::test]
    async fn test_concurrent_reconciles_are_independent() {
        let reconciler = std::sync::Arc::new(Reconciler::default());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let reconciler = reconciler.clone();
                tokio::spawn(async move {
                    let tool = format!("tool_{i}");
                    let param = format!("param_{i}");
                    let spec = ToolSpecification::new(&tool).parameters(
                        ToolParameters::object().required_property(&param, json!({"type": "string"})),
                    );
                    let content = json!({ param.clone(): i }).to_string();
                    let result = reconciler
                        .reconcile(&response_with_content(&content), &[spec])
                        .unwrap();
                    (tool, result)
                })
            })
            .collect();

        for handle in handles {
            let (tool, result) = handle.await.unwrap();
            let calls = result.invocations();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].name, tool);
        }
    }
}
