//! Insight generation with a static fallback.

use thiserror::Error;

use crate::prompts::build_full_prompt;
use crate::snapshot::PatientSnapshot;

/// Returned in place of an insight when the provider fails.
pub const INSIGHT_UNAVAILABLE: &str =
    "Unable to generate insight at this time due to a service error.";

/// Returned when the provider answers with empty text.
pub const NO_INSIGHT: &str = "No insight generated.";

/// Insight provider errors.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Insight endpoint not configured")]
    NotConfigured,

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Provider request failed: {0}")]
    Request(String),
}

/// A text-generation backend.
pub trait InsightProvider {
    /// Generate free-text markdown for a prompt.
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Generate an advisory summary for a patient.
///
/// Never fails: provider errors are logged and replaced with
/// [`INSIGHT_UNAVAILABLE`].
pub fn generate_insight<P: InsightProvider + ?Sized>(
    provider: &P,
    snapshot: &PatientSnapshot,
) -> String {
    let prompt = build_full_prompt(snapshot);
    match provider.generate(&prompt) {
        Ok(text) if text.trim().is_empty() => NO_INSIGHT.to_string(),
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, patient = %snapshot.name, "insight generation failed");
            INSIGHT_UNAVAILABLE.to_string()
        }
    }
}

/// Provider that returns a canned response (for testing and demo shells).
pub struct MockProvider {
    response: Option<String>,
}

impl MockProvider {
    /// Always answer with `text`.
    pub fn answering(text: impl Into<String>) -> Self {
        Self {
            response: Some(text.into()),
        }
    }

    /// Always fail.
    pub fn failing() -> Self {
        Self { response: None }
    }
}

impl InsightProvider for MockProvider {
    fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        match &self.response {
            Some(text) => Ok(text.clone()),
            None => Err(InsightError::Request("mock provider offline".into()).into()),
        }
    }
}

/// Provider used when no endpoint is configured.
pub struct DisabledProvider;

impl InsightProvider for DisabledProvider {
    fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        Err(InsightError::NotConfigured.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> PatientSnapshot {
        PatientSnapshot {
            name: "Tomas Ferreira".into(),
            age: 70,
            gender: "Male".into(),
            diagnosis: "Prostate Adenocarcinoma".into(),
            stage: "Stage II".into(),
            status: "Stable".into(),
            radiation: None,
            chemo: None,
            latest_vitals: None,
        }
    }

    #[test]
    fn test_successful_insight() {
        let provider = MockProvider::answering("## Overview\nStable.");
        assert_eq!(generate_insight(&provider, &snapshot()), "## Overview\nStable.");
    }

    #[test]
    fn test_failure_is_replaced() {
        let provider = MockProvider::failing();
        assert_eq!(generate_insight(&provider, &snapshot()), INSIGHT_UNAVAILABLE);
    }

    #[test]
    fn test_disabled_provider() {
        assert_eq!(generate_insight(&DisabledProvider, &snapshot()), INSIGHT_UNAVAILABLE);
    }

    #[test]
    fn test_blank_response() {
        let provider = MockProvider::answering("   ");
        assert_eq!(generate_insight(&provider, &snapshot()), NO_INSIGHT);
    }
}
