//! LLM-fallback translator. Only reached when the deterministic AST
//! translator declines a file; its output still has to survive the
//! semantic guard and the verifier like anything else.

use argus_core::{AssumedInput, Obligation, ProofLanguage, TranslationOutcome, TranslatorKind};
use async_trait::async_trait;
use tracing::warn;

use crate::base::Translator;

const DEFAULT_MODEL: &str = "gemini-2.5-pro";
const FALLBACK_PROMPT: &str = "Translate Python to Lean 4. Return code only.";

pub struct LlmTranslator {
    model: String,
    api_key: Option<String>,
    prompt_override: Option<String>,
    client: reqwest::Client,
}

impl LlmTranslator {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            prompt_override: None,
            client: reqwest::Client::new(),
        }
    }
}

impl Default for LlmTranslator {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

fn failure(error: impl Into<String>) -> TranslationOutcome {
    TranslationOutcome {
        success: false,
        language: ProofLanguage::Lean,
        code: String::new(),
        translator: TranslatorKind::Llm,
        used_llm: true,
        error: error.into(),
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(
        &self,
        python_code: &str,
        obligations: &[Obligation],
        assumptions: &[AssumedInput],
    ) -> TranslationOutcome {
        let Some(api_key) = self.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return failure("GEMINI_API_KEY is not configured");
        };

        let prompt = self
            .prompt_override
            .clone()
            .unwrap_or_else(|| FALLBACK_PROMPT.to_string());

        let obligations_text = if obligations.is_empty() {
            "- none".to_string()
        } else {
            obligations
                .iter()
                .map(|o| format!("- {}", o.property))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let assumptions_text = if assumptions.is_empty() {
            "- none".to_string()
        } else {
            assumptions
                .iter()
                .map(|a| format!("- {}", a.property))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let contents = format!(
            "{prompt}\n\nObligations:\n{obligations_text}\n\nAssumptions:\n{assumptions_text}\n\nPython Code:\n{python_code}"
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
            Err(e) => return failure(e.to_string()),
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "LLM translation request returned non-2xx");
            return failure(format!("Gemini HTTP {}", response.status()));
        }

        let payload: serde_json::Value = match response.json().await {
            Ok(payload) => payload,
            Err(e) => return failure(e.to_string()),
        };

        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .trim()
            .to_string();

        if text.is_empty() {
            return failure("Gemini returned an empty translation");
        }

        TranslationOutcome {
            success: true,
            language: ProofLanguage::Lean,
            code: text,
            translator: TranslatorKind::Llm,
            used_llm: true,
            error: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_api_key_fails_closed() {
        let mut translator = LlmTranslator::new(DEFAULT_MODEL);
        translator.api_key = None;
        let outcome = translator.translate("def f():\n    return 1\n", &[], &[]).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error, "GEMINI_API_KEY is not configured");
        assert!(outcome.used_llm);
    }
}
