//! Shared domain types for the MemGate proxy: configuration, errors,
//! the chat message model, and structured trace events.

pub mod chat;
pub mod config;
pub mod error;
pub mod trace;

pub use error::{Error, Result};
