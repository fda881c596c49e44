//! Provider trait.

use async_trait::async_trait;

use crate::Result;
use crate::types::{RagRequest, RagResponse};

/// A remote retrieval-augmented generation service.
///
/// Implementations perform exactly one upstream attempt per call and report
/// failures as typed [`AskError`](crate::AskError)s:
///
/// - `Upstream { status }` for a non-success HTTP status
/// - `Timeout` / `Network` when the call never produced a status
/// - `Decode` when the body is not JSON at all
///
/// Missing fields in an otherwise valid body are not errors; they default.
#[async_trait]
pub trait RagProvider: Send + Sync {
    /// Provider name for logging/metrics.
    fn name(&self) -> &str;

    /// Answer a single question. No retries.
    async fn ask(&self, request: &RagRequest) -> Result<RagResponse>;
}
