//! Structuring service boundary.
//!
//! The orchestrator depends only on [`StructuringService`]: a single request/response
//! call taking `{ resumeText }` and returning the raw JSON reply. Schema validation of
//! that reply belongs to the caller (`record::validation::validate_response`), so a
//! stub and the real model are held to the same contract.

pub mod prompts;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError, MODEL};
use crate::record::schema::RECOMMENDED_MAX_LIST_ITEMS;
use crate::structuring::prompts::{RESUME_PARSE_PROMPT, RESUME_PARSE_SYSTEM};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuringRequest<'a> {
    pub resume_text: &'a str,
}

#[derive(Debug, Error)]
pub enum StructuringError {
    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[async_trait]
pub trait StructuringService: Send + Sync {
    async fn structure(&self, request: StructuringRequest<'_>) -> Result<Value, StructuringError>;
}

/// Structuring backed by the Anthropic model through [`LlmClient`].
pub struct LlmStructurer {
    llm: LlmClient,
}

impl LlmStructurer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl StructuringService for LlmStructurer {
    async fn structure(&self, request: StructuringRequest<'_>) -> Result<Value, StructuringError> {
        info!(
            model = MODEL,
            chars = request.resume_text.len(),
            "structuring resume text"
        );
        let prompt = build_prompt(request.resume_text);
        let system = format!("{RESUME_PARSE_SYSTEM} {JSON_ONLY_SYSTEM}");
        Ok(self.llm.call_json::<Value>(&prompt, &system).await?)
    }
}

fn build_prompt(resume_text: &str) -> String {
    RESUME_PARSE_PROMPT
        .replace("{max_items}", &RECOMMENDED_MAX_LIST_ITEMS.to_string())
        .replace("{resume_text}", resume_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text_and_item_cap() {
        let prompt = build_prompt("Jane Roe, Nurse");
        assert!(prompt.ends_with("Jane Roe, Nurse"));
        assert!(prompt.contains("at most 5 bullet points"));
        assert!(!prompt.contains("{max_items}"));
    }

    #[test]
    fn test_prompt_lists_all_schema_keys() {
        let prompt = build_prompt("");
        for key in [
            "\"name\"",
            "\"designation\"",
            "\"nationality\"",
            "\"totalExperience\"",
            "\"relevantExperience\"",
            "\"education\"",
            "\"keyCompetencies\"",
            "\"personalScorecard\"",
            "\"professionalExperiences\"",
            "\"projectExperiences\"",
        ] {
            assert!(prompt.contains(key), "missing {key}");
        }
    }

    #[test]
    fn test_prompt_forbids_empty_values() {
        let prompt = build_prompt("Jane Roe, Nurse");
        assert!(prompt.contains("MUST be non-empty"));
        assert!(prompt.contains("use \"Not specified\""));
        assert!(prompt.contains("return [] rather than [\"\"]"));
        let rules = prompt.find("MISSING INFORMATION").unwrap();
        assert!(rules < prompt.find("RESUME TEXT").unwrap());
    }

    #[test]
    fn test_request_serializes_as_resume_text() {
        let json = serde_json::to_value(StructuringRequest {
            resume_text: "hello",
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "resumeText": "hello" }));
    }
}
