//! Invariant discovery: combines the deterministic Obligation Policy with
//! an optional LLM proposer that suggests assumed preconditions. The LLM
//! path is advisory only — `assumptions_valid` is still gated through
//! [`crate::evidence::validate_assumptions`], and nothing it proposes can
//! add a canonical obligation.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::ArgusError;
use crate::evidence::validate_assumptions;
use crate::models::{AssumedInput, Obligation, Severity};
use crate::policy::ObligationPolicy;

const DEFAULT_MODEL: &str = "gemini-2.5-pro";
const FALLBACK_PROMPT: &str = "Return JSON with `assumed_inputs` and `obligations` candidates. \
Do not include markdown fences.";

#[derive(Debug, Clone)]
pub struct DiscoveryResult {
    pub obligations: Vec<Obligation>,
    pub assumed_inputs: Vec<AssumedInput>,
    pub llm_candidates_raw: String,
    pub assumptions_valid: bool,
}

/// Configuration for the invariant discovery stage. `api_key` absent or
/// empty disables the LLM call and leaves the policy-derived obligations
/// as the only output, matching a deliberately offline run.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub model: String,
    pub use_llm: bool,
    pub api_key: Option<String>,
    pub prompt_override: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            use_llm: true,
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            prompt_override: None,
        }
    }
}

pub struct InvariantDiscovery {
    config: DiscoveryConfig,
    policy: ObligationPolicy,
    client: reqwest::Client,
}

impl InvariantDiscovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            policy: ObligationPolicy::new(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn discover(&self, python_code: &str) -> Result<DiscoveryResult, ArgusError> {
        let policy_result = self.policy.derive(python_code);
        let obligations = policy_result.obligations;

        let mut raw = String::new();
        let mut assumed_inputs = Vec::new();

        if self.config.use_llm {
            if let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
                raw = self.query_llm(api_key, python_code).await?;
                assumed_inputs = parse_assumed_inputs(&raw);
            } else {
                debug!("GEMINI_API_KEY unset; skipping LLM-assisted discovery");
            }
        }

        let (assumptions_valid, _issues) = validate_assumptions(&assumed_inputs);

        Ok(DiscoveryResult {
            obligations,
            assumed_inputs,
            llm_candidates_raw: raw,
            assumptions_valid,
        })
    }

    async fn query_llm(&self, api_key: &str, python_code: &str) -> Result<String, ArgusError> {
        let prompt = self
            .config
            .prompt_override
            .clone()
            .unwrap_or_else(|| FALLBACK_PROMPT.to_string());
        let contents = format!("{prompt}\n\nPython:\n{python_code}");

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.config.model
        );

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": contents }] }],
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ArgusError::config(format!("Gemini request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(status = %status, "invariant discovery LLM call returned non-2xx");
            return Ok(String::new());
        }

        let payload: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ArgusError::config(format!("Gemini response decode failed: {e}")))?;

        Ok(payload.text().trim().to_string())
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

impl GeminiResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

fn parse_assumed_inputs(text: &str) -> Vec<AssumedInput> {
    if text.is_empty() {
        return Vec::new();
    }
    let Some(payload) = extract_json(text) else {
        return Vec::new();
    };

    let Some(items) = payload.get("assumed_inputs").and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| item.as_object())
        .map(|item| {
            let get_str = |key: &str| -> String {
                item.get(key)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .trim()
                    .to_string()
            };
            let mut source_type = get_str("source_type");
            if source_type.is_empty() {
                source_type = "policy".to_string();
            }
            let severity = item
                .get("severity")
                .and_then(|v| v.as_str())
                .map(str::to_lowercase)
                .and_then(|s| match s.as_str() {
                    "critical" => Some(Severity::Critical),
                    "high" => Some(Severity::High),
                    "medium" => Some(Severity::Medium),
                    "low" => Some(Severity::Low),
                    _ => None,
                })
                .unwrap_or(Severity::Medium);

            AssumedInput::new(
                get_str("property"),
                get_str("description"),
                get_str("justification"),
                source_type,
                get_str("source_ref"),
                get_str("evidence_id"),
                severity,
            )
        })
        .collect()
}

/// Strips a leading ```/```json fence and a trailing ``` fence, then
/// tries to parse as JSON; falls back to the outermost `{...}` span so a
/// model that wraps the object in prose still yields usable output.
fn extract_json(text: &str) -> Option<serde_json::Value> {
    let mut trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        trimmed = rest;
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        trimmed = rest;
    }
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed).trim();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return Some(value);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_strips_fences() {
        let text = "```json\n{\"assumed_inputs\": []}\n```";
        let value = extract_json(text).expect("should parse");
        assert!(value.get("assumed_inputs").is_some());
    }

    #[test]
    fn extract_json_recovers_embedded_object() {
        let text = "Sure, here you go:\n{\"assumed_inputs\": [{\"property\": \"amount\"}]}\nThanks!";
        let value = extract_json(text).expect("should parse");
        assert_eq!(value["assumed_inputs"][0]["property"], "amount");
    }

    #[test]
    fn extract_json_returns_none_on_garbage() {
        assert!(extract_json("not json at all").is_none());
    }

    #[test]
    fn parse_assumed_inputs_defaults_missing_source_type_to_policy() {
        let text = r#"{"assumed_inputs": [{"property": "amount", "justification": "j", "source_ref": "r", "evidence_id": "e"}]}"#;
        let parsed = parse_assumed_inputs(text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].source_type, "policy");
    }

    #[test]
    fn empty_text_yields_no_assumptions() {
        assert!(parse_assumed_inputs("").is_empty());
    }
}
