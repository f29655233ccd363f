//! Context retrieval — the optional preflight that enriches an outgoing
//! message list with prior context fetched from the memory backend.
//!
//! Retrieval is an enhancement, never a dependency: every failure path
//! degrades to the original messages with a warning log.

pub mod client;
pub mod extract;
pub mod inject;
pub mod retriever;
pub mod types;

pub use client::MemoryClient;
pub use retriever::ContextRetriever;
