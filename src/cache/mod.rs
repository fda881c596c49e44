//! Caching subsystem.
//!
//! [`TtlCache`] is the short-lived request de-duplication store that sits in
//! front of the RAG provider. Bursts of identical questions (UI double
//! submits, rapid client retries) inside the TTL window are answered from
//! memory without touching the circuit breaker or the network.

pub mod ttl;

pub use ttl::{CacheConfig, TtlCache};
