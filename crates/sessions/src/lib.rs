//! User identity resolution and persistent upstream HTTP sessions.

pub mod identity;
pub mod pool;

pub use identity::{MatchKind, PatternMatch, ResolvedUser, UserResolver};
pub use pool::{from_reqwest, SessionPool, UpstreamSession};
