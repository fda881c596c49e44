//! Public types for the askme API.

mod generation;
mod request;
mod response;

pub use generation::{GenerationConfig, GenerationPreset};
pub use request::{MAX_QUERY_CHARS, MIN_QUERY_CHARS, RagRequest};
pub use response::{RagResponse, Source};
