//! User identity resolution — map request headers to a memory-routing id.
//!
//! Resolution is a pure function of the headers and the immutable routing
//! config, and it never fails: the custom header (literal value) wins,
//! then the configured patterns in declaration order, then the default id.
//! Patterns whose regex fails to compile are discarded when the resolver
//! is built, so request-time matching cannot error.

use regex::Regex;
use reqwest::header::HeaderMap;
use serde::Serialize;

use mg_domain::config::RoutingConfig;
use mg_domain::trace::TraceEvent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Match record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How the user id was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    CustomHeader,
    Pattern,
    Default,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::CustomHeader => "custom-header",
            MatchKind::Pattern => "pattern",
            MatchKind::Default => "default",
        }
    }
}

/// The pattern that produced a [`MatchKind::Pattern`] resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    pub header: String,
    pub pattern: String,
    pub user_id: String,
}

/// Outcome of a resolution. This record is what the diagnostics endpoint
/// reports, so it carries everything needed to explain the decision.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedUser {
    pub user_id: String,
    pub matched: MatchKind,
    pub pattern: Option<PatternMatch>,
    /// Whether the custom header appeared in the request at all
    /// (an empty value counts as present but does not short-circuit).
    pub custom_header_present: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Resolver
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A compiled match rule. Only successfully compiled patterns make it in.
struct UserPattern {
    header: String,
    source: String,
    regex: Regex,
    user_id: String,
}

/// Resolves request headers to a memory-routing user id.
///
/// Built once at startup from [`RoutingConfig`]; immutable afterwards.
pub struct UserResolver {
    custom_header: Option<String>,
    patterns: Vec<UserPattern>,
    default_user_id: String,
}

impl UserResolver {
    /// Build a resolver, compiling each pattern and discarding the ones
    /// that fail with a warning.
    pub fn from_config(config: &RoutingConfig) -> Self {
        let mut patterns = Vec::with_capacity(config.patterns.len());

        for p in &config.patterns {
            match Regex::new(&p.pattern) {
                Ok(regex) => patterns.push(UserPattern {
                    header: p.header.to_ascii_lowercase(),
                    source: p.pattern.clone(),
                    regex,
                    user_id: p.user_id.clone(),
                }),
                Err(e) => {
                    tracing::warn!(
                        header = %p.header,
                        pattern = %p.pattern,
                        error = %e,
                        "discarding routing pattern with invalid regex"
                    );
                }
            }
        }

        let custom_header = config
            .custom_header
            .as_ref()
            .filter(|h| !h.is_empty())
            .map(|h| h.to_ascii_lowercase());

        Self {
            custom_header,
            patterns,
            default_user_id: config.default_user_id.clone(),
        }
    }

    /// Resolve the user id for a set of request headers. Never fails.
    pub fn resolve(&self, headers: &HeaderMap) -> ResolvedUser {
        let custom_header_present = self
            .custom_header
            .as_deref()
            .is_some_and(|name| headers.contains_key(name));

        // 1. Custom header short-circuit (non-empty literal value).
        if let Some(name) = self.custom_header.as_deref() {
            if let Some(value) = joined_header_value(headers, name) {
                if !value.is_empty() {
                    let resolved = ResolvedUser {
                        user_id: value,
                        matched: MatchKind::CustomHeader,
                        pattern: None,
                        custom_header_present,
                    };
                    self.emit(&resolved);
                    return resolved;
                }
            }
        }

        // 2. Ordered pattern scan — first match wins.
        for p in &self.patterns {
            if let Some(value) = joined_header_value(headers, &p.header) {
                if p.regex.is_match(&value) {
                    let resolved = ResolvedUser {
                        user_id: p.user_id.clone(),
                        matched: MatchKind::Pattern,
                        pattern: Some(PatternMatch {
                            header: p.header.clone(),
                            pattern: p.source.clone(),
                            user_id: p.user_id.clone(),
                        }),
                        custom_header_present,
                    };
                    self.emit(&resolved);
                    return resolved;
                }
            }
        }

        // 3. Default.
        let resolved = ResolvedUser {
            user_id: self.default_user_id.clone(),
            matched: MatchKind::Default,
            pattern: None,
            custom_header_present,
        };
        self.emit(&resolved);
        resolved
    }

    fn emit(&self, resolved: &ResolvedUser) {
        TraceEvent::UserResolved {
            user_id: resolved.user_id.clone(),
            matched: resolved.matched.as_str().to_owned(),
        }
        .emit();
    }

    /// Number of compiled patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// All values of `name`, joined with `", "` (the HTTP list separator).
/// `None` when the header is absent or holds no decodable value.
fn joined_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mg_domain::config::UserPatternConfig;
    use reqwest::header::{HeaderName, HeaderValue};

    fn config_with_patterns(patterns: Vec<UserPatternConfig>) -> RoutingConfig {
        RoutingConfig {
            custom_header: Some("x-sm-user-id".into()),
            user_id_header: "x-sm-user-id".into(),
            default_user_id: "default-user".into(),
            patterns,
        }
    }

    fn jetbrains_pattern() -> UserPatternConfig {
        UserPatternConfig {
            header: "user-agent".into(),
            pattern: "OpenAIClientImpl/Java".into(),
            user_id: "pycharm-ai".into(),
        }
    }

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                name.parse::<HeaderName>().unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn custom_header_wins_over_pattern() {
        let resolver = UserResolver::from_config(&config_with_patterns(vec![
            jetbrains_pattern(),
        ]));
        let resolved = resolver.resolve(&headers(&[
            ("x-sm-user-id", "alice"),
            ("user-agent", "OpenAIClientImpl/Java 2024.1"),
        ]));
        assert_eq!(resolved.user_id, "alice");
        assert_eq!(resolved.matched, MatchKind::CustomHeader);
        assert!(resolved.custom_header_present);
    }

    #[test]
    fn empty_custom_header_falls_through() {
        let resolver = UserResolver::from_config(&config_with_patterns(vec![
            jetbrains_pattern(),
        ]));
        let resolved = resolver.resolve(&headers(&[
            ("x-sm-user-id", ""),
            ("user-agent", "OpenAIClientImpl/Java 2024.1"),
        ]));
        assert_eq!(resolved.user_id, "pycharm-ai");
        assert_eq!(resolved.matched, MatchKind::Pattern);
        assert!(resolved.custom_header_present);
    }

    #[test]
    fn pattern_match_is_a_search_not_anchored() {
        let resolver = UserResolver::from_config(&config_with_patterns(vec![
            jetbrains_pattern(),
        ]));
        let resolved =
            resolver.resolve(&headers(&[("user-agent", "prefix OpenAIClientImpl/Java 2024.1")]));
        assert_eq!(resolved.user_id, "pycharm-ai");
        let pattern = resolved.pattern.unwrap();
        assert_eq!(pattern.header, "user-agent");
        assert_eq!(pattern.pattern, "OpenAIClientImpl/Java");
    }

    #[test]
    fn first_matching_pattern_wins() {
        let resolver = UserResolver::from_config(&config_with_patterns(vec![
            UserPatternConfig {
                header: "user-agent".into(),
                pattern: "Client".into(),
                user_id: "first".into(),
            },
            UserPatternConfig {
                header: "user-agent".into(),
                pattern: "ClientImpl".into(),
                user_id: "second".into(),
            },
        ]));
        let resolved = resolver.resolve(&headers(&[("user-agent", "SomeClientImpl/1.0")]));
        assert_eq!(resolved.user_id, "first");
    }

    #[test]
    fn no_match_returns_default() {
        let resolver = UserResolver::from_config(&config_with_patterns(vec![
            jetbrains_pattern(),
        ]));
        let resolved = resolver.resolve(&headers(&[("user-agent", "curl/8.4")]));
        assert_eq!(resolved.user_id, "default-user");
        assert_eq!(resolved.matched, MatchKind::Default);
        assert!(resolved.pattern.is_none());
        assert!(!resolved.custom_header_present);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut config = config_with_patterns(vec![jetbrains_pattern()]);
        config.patterns[0].header = "User-Agent".into();
        let resolver = UserResolver::from_config(&config);
        let resolved =
            resolver.resolve(&headers(&[("user-agent", "OpenAIClientImpl/Java")]));
        assert_eq!(resolved.user_id, "pycharm-ai");
    }

    #[test]
    fn invalid_regex_discarded_at_build() {
        let resolver = UserResolver::from_config(&config_with_patterns(vec![
            UserPatternConfig {
                header: "user-agent".into(),
                pattern: "(unclosed".into(),
                user_id: "broken".into(),
            },
            jetbrains_pattern(),
        ]));
        assert_eq!(resolver.len(), 1);
        let resolved =
            resolver.resolve(&headers(&[("user-agent", "OpenAIClientImpl/Java")]));
        assert_eq!(resolved.user_id, "pycharm-ai");
    }

    #[test]
    fn repeated_headers_joined_before_matching() {
        let resolver = UserResolver::from_config(&config_with_patterns(vec![
            UserPatternConfig {
                header: "x-tags".into(),
                pattern: "^alpha, beta$".into(),
                user_id: "tagged".into(),
            },
        ]));
        let resolved = resolver.resolve(&headers(&[("x-tags", "alpha"), ("x-tags", "beta")]));
        assert_eq!(resolved.user_id, "tagged");
    }

    #[test]
    fn resolver_without_custom_header() {
        let mut config = config_with_patterns(vec![]);
        config.custom_header = None;
        let resolver = UserResolver::from_config(&config);
        let resolved = resolver.resolve(&headers(&[("x-sm-user-id", "alice")]));
        assert_eq!(resolved.user_id, "default-user");
        assert!(!resolved.custom_header_present);
    }
}
