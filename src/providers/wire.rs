//! Provider wire formats.
//!
//! Each upstream API version is one [`WireFormat`] implementation. The
//! format is picked when the transport is built ([`ApiVersion::format`]) and
//! never switched per call. Response parsing is shared: [`parse_reply`]
//! accepts either version's field names and substitutes defaults for
//! anything missing.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::Result;
use crate::types::{GenerationConfig, RagRequest, RagResponse, Source};

/// Prefix of provider-issued conversation ids.
pub const CHAT_ID_PREFIX: &str = "cht_";

/// Default number of search results fed to generation.
pub const DEFAULT_MAX_RESULTS: u32 = 5;

const UNTITLED: &str = "Untitled";

/// Provider API version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// Legacy query-only endpoint.
    V1,
    /// Chat endpoint with conversation continuation.
    #[default]
    V2,
}

impl ApiVersion {
    /// Build the wire format for this version.
    pub fn format(self, settings: WireSettings) -> Box<dyn WireFormat> {
        match self {
            ApiVersion::V1 => Box::new(LegacyQuery::new(settings)),
            ApiVersion::V2 => Box::new(ChatTurns::new(settings)),
        }
    }
}

/// Corpus and generation settings shared by both formats.
#[derive(Debug, Clone, Default)]
pub struct WireSettings {
    /// Corpus identifier (v1 `corpus_id`, v2 `corpus_key`).
    pub corpus: String,
    /// Customer id header, v1 only.
    pub customer_id: Option<String>,
    pub max_results: u32,
    /// Base generation config; request fields override it.
    pub generation: GenerationConfig,
}

impl WireSettings {
    pub fn new(corpus: impl Into<String>) -> Self {
        Self {
            corpus: corpus.into(),
            customer_id: None,
            max_results: DEFAULT_MAX_RESULTS,
            generation: GenerationConfig::default(),
        }
    }

    pub fn customer_id(mut self, id: impl Into<String>) -> Self {
        self.customer_id = Some(id.into());
        self
    }

    pub fn max_results(mut self, n: u32) -> Self {
        self.max_results = n;
        self
    }

    pub fn generation(mut self, config: GenerationConfig) -> Self {
        self.generation = config;
        self
    }
}

/// Request shape for one provider API version.
pub trait WireFormat: Send + Sync + fmt::Debug {
    /// Short name for logs and metric labels.
    fn name(&self) -> &'static str;

    /// Endpoint path (joined onto the provider base URL).
    fn path(&self, request: &RagRequest) -> String;

    /// JSON request body.
    fn body(&self, request: &RagRequest) -> Result<Value>;

    /// Headers beyond the API key.
    fn headers(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Decode a success body.
    fn parse(&self, body: &[u8]) -> Result<RagResponse> {
        parse_reply(body)
    }
}

// ============================================================================
// v1: legacy query
// ============================================================================

/// `POST /v1/query` with `{query, corpus_id, conversation_id?, max_results}`.
///
/// Generation settings are not part of this shape and are ignored.
#[derive(Debug, Clone)]
pub struct LegacyQuery {
    settings: WireSettings,
}

impl LegacyQuery {
    pub fn new(settings: WireSettings) -> Self {
        Self { settings }
    }
}

impl WireFormat for LegacyQuery {
    fn name(&self) -> &'static str {
        "vectara_v1"
    }

    fn path(&self, _request: &RagRequest) -> String {
        "/v1/query".to_string()
    }

    fn body(&self, request: &RagRequest) -> Result<Value> {
        let mut body = json!({
            "query": request.query,
            "corpus_id": self.settings.corpus,
            "max_results": self.settings.max_results,
        });
        if let Some(id) = &request.conversation_id {
            body["conversation_id"] = json!(id);
        }
        Ok(body)
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        self.settings
            .customer_id
            .iter()
            .map(|id| ("x-customer-id", id.clone()))
            .collect()
    }
}

// ============================================================================
// v2: chat turns
// ============================================================================

/// `POST /v2/chats` to start a conversation, `POST /v2/chats/{id}/turns` to
/// continue one whose id carries the provider prefix.
#[derive(Debug, Clone)]
pub struct ChatTurns {
    settings: WireSettings,
}

impl ChatTurns {
    pub fn new(settings: WireSettings) -> Self {
        Self { settings }
    }
}

#[derive(Serialize)]
struct ChatBody<'a> {
    query: &'a str,
    search: SearchSpec<'a>,
    generation: GenerationSpec<'a>,
    chat: ChatSpec,
    stream_response: bool,
}

#[derive(Serialize)]
struct SearchSpec<'a> {
    corpora: [CorpusRef<'a>; 1],
    limit: u32,
}

#[derive(Serialize)]
struct CorpusRef<'a> {
    corpus_key: &'a str,
}

#[derive(Serialize)]
struct GenerationSpec<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_preset_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_name: Option<&'a str>,
    max_used_search_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_response_characters: Option<u32>,
    model_parameters: ModelParameters,
    citations: Citations,
}

#[derive(Serialize)]
struct ModelParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f64>,
}

#[derive(Serialize)]
struct Citations {
    style: &'static str,
}

#[derive(Serialize)]
struct ChatSpec {
    store: bool,
}

impl WireFormat for ChatTurns {
    fn name(&self) -> &'static str {
        "vectara_v2"
    }

    fn path(&self, request: &RagRequest) -> String {
        match request.conversation_id.as_deref() {
            Some(id) if is_chat_id(id) => format!("/v2/chats/{id}/turns"),
            _ => "/v2/chats".to_string(),
        }
    }

    fn body(&self, request: &RagRequest) -> Result<Value> {
        let generation = match &request.generation_config {
            Some(overrides) => overrides.merged_over(&self.settings.generation),
            None => self.settings.generation.clone(),
        };
        let body = ChatBody {
            query: &request.query,
            search: SearchSpec {
                corpora: [CorpusRef {
                    corpus_key: &self.settings.corpus,
                }],
                limit: self.settings.max_results,
            },
            generation: GenerationSpec {
                generation_preset_name: generation.generation_preset_name.as_deref(),
                prompt_name: generation.prompt_name.as_deref(),
                max_used_search_results: self.settings.max_results,
                max_response_characters: generation.max_response_chars(),
                model_parameters: ModelParameters {
                    temperature: generation.temperature,
                    frequency_penalty: generation.frequency_penalty,
                    presence_penalty: generation.presence_penalty,
                },
                citations: Citations { style: "none" },
            },
            chat: ChatSpec { store: true },
            stream_response: false,
        };
        Ok(serde_json::to_value(body)?)
    }
}

/// Whether `id` looks like a provider-issued conversation id.
///
/// Anything else (client-side ids, empty strings) starts a new chat. The
/// character check also keeps the id safe to splice into a URL path.
pub fn is_chat_id(id: &str) -> bool {
    id.strip_prefix(CHAT_ID_PREFIX).is_some_and(|rest| {
        !rest.is_empty()
            && rest
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    })
}

// ============================================================================
// Response parsing
// ============================================================================

/// Decode a provider success body into a [`RagResponse`].
///
/// Accepts both shapes:
///
/// - answer text from `answer`, falling back to `summary`
/// - citations from `sources` (`{title, url, id}`) or, when absent or
///   empty, from `search_results` (document metadata)
/// - optional `chat_id` / `turn_id`
///
/// Missing or mistyped fields default. Only a body that is not JSON fails.
pub fn parse_reply(body: &[u8]) -> Result<RagResponse> {
    let value: Value = serde_json::from_slice(body)?;

    let answer = ["answer", "summary"]
        .iter()
        .find_map(|field| str_field(&value, field))
        .unwrap_or_default();

    let sources = match value.get("sources").and_then(Value::as_array) {
        Some(items) if !items.is_empty() => items.iter().filter_map(legacy_source).collect(),
        _ => value
            .get("search_results")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(search_result_source).collect())
            .unwrap_or_default(),
    };

    Ok(RagResponse {
        answer,
        sources,
        chat_id: str_field(&value, "chat_id"),
        turn_id: str_field(&value, "turn_id"),
    })
}

fn str_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_owned)
}

fn legacy_source(item: &Value) -> Option<Source> {
    item.as_object()?;
    Some(Source {
        title: str_field(item, "title").unwrap_or_else(|| UNTITLED.to_string()),
        url: str_field(item, "url"),
        id: str_field(item, "id"),
    })
}

fn search_result_source(item: &Value) -> Option<Source> {
    item.as_object()?;
    let document_id = str_field(item, "document_id");
    let title = item
        .get("document_metadata")
        .and_then(|m| str_field(m, "title"))
        .or_else(|| item.get("part_metadata").and_then(|m| str_field(m, "title")))
        .or_else(|| document_id.clone())
        .unwrap_or_else(|| UNTITLED.to_string());
    Some(Source {
        title,
        url: item
            .get("document_metadata")
            .and_then(|m| str_field(m, "url")),
        id: document_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_id_requires_prefix_and_body() {
        assert!(is_chat_id("cht_abc123"));
        assert!(is_chat_id("cht_a-b_c"));
        assert!(!is_chat_id("cht_"));
        assert!(!is_chat_id("conv-123"));
        assert!(!is_chat_id("cht_../../admin"));
        assert!(!is_chat_id(""));
    }

    #[test]
    fn summary_is_accepted_as_answer() {
        let parsed = parse_reply(br#"{"summary":"from summary"}"#).unwrap();
        assert_eq!(parsed.answer, "from summary");
    }

    #[test]
    fn answer_wins_over_summary() {
        let parsed = parse_reply(br#"{"answer":"a","summary":"s"}"#).unwrap();
        assert_eq!(parsed.answer, "a");
    }

    #[test]
    fn non_object_body_defaults() {
        let parsed = parse_reply(b"[1,2,3]").unwrap();
        assert_eq!(parsed, RagResponse::default());
    }

    #[test]
    fn mistyped_fields_default() {
        let parsed = parse_reply(br#"{"answer":42,"sources":"nope","chat_id":7}"#).unwrap();
        assert_eq!(parsed.answer, "");
        assert!(parsed.sources.is_empty());
        assert!(parsed.chat_id.is_none());
    }

    #[test]
    fn search_result_title_fallbacks() {
        let body = br#"{
            "answer": "x",
            "search_results": [
                {"document_id": "d1", "document_metadata": {"title": "Doc One", "url": "https://a"}},
                {"document_id": "d2", "part_metadata": {"title": "Part Two"}},
                {"document_id": "d3"},
                {}
            ]
        }"#;
        let parsed = parse_reply(body).unwrap();
        let titles: Vec<_> = parsed.sources.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Doc One", "Part Two", "d3", "Untitled"]);
        assert_eq!(parsed.sources[0].url.as_deref(), Some("https://a"));
        assert_eq!(parsed.sources[1].id.as_deref(), Some("d2"));
    }

    #[test]
    fn legacy_body_omits_missing_conversation() {
        let format = LegacyQuery::new(WireSettings::new("corpus-1"));
        let body = format.body(&RagRequest::new("hi there")).unwrap();
        assert_eq!(body["corpus_id"], "corpus-1");
        assert_eq!(body["max_results"], 5);
        assert!(body.get("conversation_id").is_none());
    }

    #[test]
    fn chat_body_merges_request_generation() {
        let settings = WireSettings::new("resume")
            .generation(GenerationConfig::default().temperature(0.7).prompt_name("p"));
        let format = ChatTurns::new(settings);
        let request = RagRequest::new("q?")
            .generation(GenerationConfig::default().temperature(0.2).presence_penalty(1.0));
        let body = format.body(&request).unwrap();

        assert_eq!(body["search"]["corpora"][0]["corpus_key"], "resume");
        assert_eq!(body["generation"]["prompt_name"], "p");
        assert_eq!(body["generation"]["model_parameters"]["temperature"], 0.2);
        assert_eq!(body["generation"]["model_parameters"]["presence_penalty"], 1.0);
        assert!(body["generation"]["model_parameters"].get("frequency_penalty").is_none());
        assert_eq!(body["stream_response"], false);
    }

    #[test]
    fn chat_path_depends_on_conversation_id() {
        let format = ChatTurns::new(WireSettings::new("c"));
        assert_eq!(format.path(&RagRequest::new("q")), "/v2/chats");
        assert_eq!(
            format.path(&RagRequest::new("q").conversation("conv-123")),
            "/v2/chats"
        );
        assert_eq!(
            format.path(&RagRequest::new("q").conversation("cht_42")),
            "/v2/chats/cht_42/turns"
        );
    }
}
