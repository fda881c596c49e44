//! Client composition: cache, breaker and provider behind one `ask`.

mod builder;
mod client;

pub use builder::RagClientBuilder;
pub use client::{NO_CONVERSATION, RagClient, cache_key};
