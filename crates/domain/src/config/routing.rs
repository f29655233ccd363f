use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// User routing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Controls how a request is mapped to a memory-routing user id.
///
/// Resolution order: the custom header (literal value, non-empty) wins,
/// then the patterns in declaration order (first match), then
/// `default_user_id`. Resolution never fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Header whose literal value short-circuits pattern matching.
    /// `None` disables the short-circuit.
    #[serde(default = "d_custom_header")]
    pub custom_header: Option<String>,

    /// Header set on every forwarded request, carrying the resolved id.
    /// Overrides any client-supplied value of the same name.
    #[serde(default = "d_user_id_header")]
    pub user_id_header: String,

    /// Id assigned when neither the custom header nor a pattern matches.
    #[serde(default = "d_default_user_id")]
    pub default_user_id: String,

    /// Ordered match rules; earlier entries take priority.
    #[serde(default)]
    pub patterns: Vec<UserPatternConfig>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            custom_header: d_custom_header(),
            user_id_header: d_user_id_header(),
            default_user_id: d_default_user_id(),
            patterns: Vec::new(),
        }
    }
}

/// One header-match rule: if `header`'s value matches `pattern`
/// (unanchored regex search), assign `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPatternConfig {
    /// Header name, matched case-insensitively.
    pub header: String,
    /// Regular expression tested against the full header value.
    pub pattern: String,
    /// Id assigned on match.
    pub user_id: String,
}

fn d_custom_header() -> Option<String> {
    Some("x-sm-user-id".into())
}
fn d_user_id_header() -> String {
    "x-sm-user-id".into()
}
fn d_default_user_id() -> String {
    "default-user".into()
}
