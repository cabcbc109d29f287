//! Shared translator contract. Every translator is handed the same three
//! inputs and returns the same outcome shape regardless of which proof
//! language it targets.

use argus_core::{AssumedInput, Obligation, TranslationOutcome};
use async_trait::async_trait;

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        python_code: &str,
        obligations: &[Obligation],
        assumptions: &[AssumedInput],
    ) -> TranslationOutcome;
}
