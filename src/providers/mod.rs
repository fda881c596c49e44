//! RAG provider seam and the Vectara implementation.
//!
//! [`RagProvider`] is a single-attempt call to a remote retrieval-augmented
//! generation service. It knows nothing about caching, breakers or retries;
//! those live in [`RagClient`](crate::gateway::RagClient) and the HTTP
//! handler respectively.
//!
//! [`VectaraClient`] is the HTTP transport. The request/response shape it
//! speaks is a [`WireFormat`] chosen once at construction:
//!
//! - [`LegacyQuery`]: the v1 query-only endpoint
//! - [`ChatTurns`]: the v2 chat endpoint with conversation continuation

pub mod traits;
pub mod vectara;
pub mod wire;

pub use traits::RagProvider;
pub use vectara::VectaraClient;
pub use wire::{ApiVersion, ChatTurns, LegacyQuery, WireFormat, parse_reply};
