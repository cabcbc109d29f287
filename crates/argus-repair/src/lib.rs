//! Bounded LLM-driven repair loop. A `VULNERABLE` verdict is not itself
//! trusted to improve the code — every attempt this engine produces still
//! has to go back through the full pipeline (translation, guard,
//! verification) before anything downstream may treat it as fixed.

use argus_core::Obligation;
use tracing::warn;

const DEFAULT_MODEL: &str = "gemini-2.5-pro";
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const FALLBACK_PROMPT: &str = "Fix the Python code so all obligations are satisfied. Return code only.";

#[derive(Debug, Clone)]
pub struct RepairAttempt {
    pub attempt: u32,
    pub fixed_code: String,
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct RepairResult {
    pub attempts: Vec<RepairAttempt>,
    pub fixed_code: Option<String>,
    pub success: bool,
}

pub struct RepairEngine {
    model: String,
    max_attempts: u32,
    api_key: Option<String>,
    prompt_override: Option<String>,
    client: reqwest::Client,
}

impl RepairEngine {
    pub fn new(model: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            model: model.into(),
            max_attempts,
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            prompt_override: None,
            client: reqwest::Client::new(),
        }
    }

    pub async fn repair(
        &self,
        python_code: &str,
        error_message: &str,
        obligations: &[Obligation],
    ) -> RepairResult {
        let mut attempts = Vec::new();
        let mut context = error_message.to_string();

        for attempt in 1..=self.max_attempts {
            let (fixed, err) = self.generate_fix(python_code, &context, obligations).await;
            let ok = fixed.is_some() && err.is_empty();
            attempts.push(RepairAttempt {
                attempt,
                fixed_code: fixed.clone().unwrap_or_default(),
                success: ok,
                error: err.clone(),
            });

            if ok {
                return RepairResult {
                    attempts,
                    fixed_code: fixed,
                    success: true,
                };
            }
            context = format!("{context}\nPrevious attempt failed: {err}");
        }

        RepairResult {
            attempts,
            fixed_code: None,
            success: false,
        }
    }

    async fn generate_fix(
        &self,
        python_code: &str,
        error_message: &str,
        obligations: &[Obligation],
    ) -> (Option<String>, String) {
        let Some(api_key) = self.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return (None, "GEMINI_API_KEY is not configured".to_string());
        };

        let obligations_text = if obligations.is_empty() {
            "- none".to_string()
        } else {
            obligations
                .iter()
                .map(|o| format!("- {}", o.property))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let prompt = self
            .prompt_override
            .clone()
            .unwrap_or_else(|| FALLBACK_PROMPT.to_string());
        let contents = format!(
            "{prompt}\n\nObligations:\n{obligations_text}\n\nVerification error:\n{error_message}\n\nPython code:\n{python_code}"
        );

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": contents }] }],
        });

        let response = match self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return (None, e.to_string()),
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "repair attempt LLM call returned non-2xx");
            return (None, format!("Gemini HTTP {}", response.status()));
        }

        let payload: serde_json::Value = match response.json().await {
            Ok(payload) => payload,
            Err(e) => return (None, e.to_string()),
        };

        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .trim()
            .to_string();

        if text.is_empty() {
            return (None, "Gemini returned empty fix".to_string());
        }
        (Some(text), String::new())
    }
}

impl Default for RepairEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL, DEFAULT_MAX_ATTEMPTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exhausts_attempts_without_api_key() {
        let mut engine = RepairEngine::new(DEFAULT_MODEL, 3);
        engine.api_key = None;
        let result = engine.repair("def f():\n    return -1\n", "balance went negative", &[]).await;
        assert!(!result.success);
        assert_eq!(result.attempts.len(), 3);
        assert!(result.attempts.iter().all(|a| !a.success));
    }
}
