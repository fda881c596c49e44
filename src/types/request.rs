//! Inbound question type

use serde::{Deserialize, Serialize};

use super::GenerationConfig;
use crate::{AskError, Result};

/// Shortest accepted query, in characters.
pub const MIN_QUERY_CHARS: usize = 3;
/// Longest accepted query, in characters.
pub const MAX_QUERY_CHARS: usize = 2000;

/// A single question for the RAG provider.
///
/// Constructed per inbound call and never mutated afterwards. The client
/// forwards `query` as given; length limits are checked by [`validate`](Self::validate)
/// at the HTTP boundary, not by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, alias = "generation", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl RagRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Continue an existing conversation.
    pub fn conversation(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn generation(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    /// Check query length and generation ranges.
    ///
    /// Length is counted in characters, not bytes.
    pub fn validate(&self) -> Result<()> {
        let len = self.query.chars().count();
        if !(MIN_QUERY_CHARS..=MAX_QUERY_CHARS).contains(&len) {
            return Err(AskError::bad_request(format!(
                "query must be between {MIN_QUERY_CHARS} and {MAX_QUERY_CHARS} characters"
            )));
        }
        if let Some(generation) = &self.generation_config {
            generation.validate()?;
        }
        Ok(())
    }
}
