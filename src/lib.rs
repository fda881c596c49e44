//! askme - resilient "ask about me" RAG service
//!
//! This crate wraps a remote retrieval-augmented generation provider
//! (Vectara) in a small resilience layer: a short-lived request
//! de-duplication cache, a circuit breaker, and a single-retry HTTP handler.
//!
//! ```text
//! POST /api/rag ─▶ handler (validate, timeout, retry once on 5xx)
//!                    └─▶ RagClient::ask
//!                          ├─ TtlCache hit ─▶ answer
//!                          └─ miss ─▶ CircuitBreaker::execute ─▶ provider HTTP call
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use askme::{RagClient, RagRequest};
//!
//! #[tokio::main]
//! async fn main() -> askme::Result<()> {
//!     let client = RagClient::builder()
//!         .vectara("zqk_your_key")
//!         .corpus("resume")
//!         .build()?;
//!
//!     let answer = client.ask(&RagRequest::new("What is your experience?")).await?;
//!     println!("{}", answer.answer);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod resilience;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use error::{AskError, Result};
pub use gateway::{RagClient, RagClientBuilder};
pub use providers::{ApiVersion, RagProvider, VectaraClient};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitOpen, CircuitState};

pub use types::{GenerationConfig, GenerationPreset, RagRequest, RagResponse, Source};
