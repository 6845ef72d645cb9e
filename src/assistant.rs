//! Question answering over a loaded repository.
//!
//! [`Assistant::answer`] runs the full pipeline for one question: intent
//! analysis, rendering, validation, and (when enabled) count correction
//! followed by a second validation pass. Validation problems are logged
//! and reported alongside the text; they never fail the call.

use serde::Serialize;
use std::sync::Arc;

use ainstein_core::intent::{analyze_query_intent, QueryIntent};
use ainstein_core::repository::ModelRepository;

use crate::config::{Config, ResponsesConfig, TraversalConfig};
use crate::response::ResponseBuilder;
use crate::validate::{ResponseValidator, ValidationReport};

/// A rendered answer with the analysis behind it.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantResponse {
    pub text: String,
    pub intent: QueryIntent,
    /// Result of validating the first rendering.
    pub validation: ValidationReport,
    /// True when wrong counts were rewritten before returning.
    pub corrected: bool,
}

/// Shared, read-only question answerer. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Assistant {
    repo: Arc<ModelRepository>,
    traversal: TraversalConfig,
    responses: ResponsesConfig,
}

impl Assistant {
    /// An assistant with default traversal and response settings.
    pub fn new(repo: Arc<ModelRepository>) -> Self {
        Self {
            repo,
            traversal: TraversalConfig::default(),
            responses: ResponsesConfig::default(),
        }
    }

    pub fn from_config(repo: Arc<ModelRepository>, config: &Config) -> Self {
        Self {
            repo,
            traversal: config.traversal.clone(),
            responses: config.responses.clone(),
        }
    }

    pub fn repository(&self) -> &ModelRepository {
        &self.repo
    }

    /// Answer `query` as Markdown text.
    pub fn generate_response(&self, query: &str) -> String {
        self.answer(query).text
    }

    pub fn answer(&self, query: &str) -> AssistantResponse {
        let intent = analyze_query_intent(query);
        let text = ResponseBuilder::new(&self.repo, self.traversal.max_depth).render(query, &intent);
        self.check(query, intent, text)
    }

    /// Validate a rendered answer and correct its counts when allowed.
    fn check(&self, query: &str, intent: QueryIntent, text: String) -> AssistantResponse {
        let validator = ResponseValidator::new(&self.repo, self.responses.count_only_max_lines);
        let validation = validator.validate(&intent, &text);
        if validation.is_valid {
            return AssistantResponse {
                text,
                intent,
                validation,
                corrected: false,
            };
        }

        for issue in &validation.issues {
            tracing::warn!(query = %query, issue = %issue, "response failed validation");
        }

        let mut text = text;
        let mut corrected = false;
        if self.responses.auto_correct && validation.count_mismatches() > 0 {
            text = validator.correct_counts(&text);
            corrected = true;
            let recheck = validator.validate(&intent, &text);
            if recheck.count_mismatches() > 0 {
                tracing::warn!(query = %query, "count correction left mismatches in place");
            } else {
                tracing::info!(query = %query, "corrected counts in response");
            }
        }

        AssistantResponse {
            text,
            intent,
            validation,
            corrected,
        }
    }
}
