//! Query extraction — pull the search query out of a message list
//! according to the configured strategy.

use mg_domain::chat::ChatMessage;
use mg_domain::config::QueryStrategy;

/// Extract the retrieval query from `messages`.
///
/// Returns `None` when the strategy has nothing to work with (no user
/// message for the user strategies, no assistant message for
/// `LastAssistantMessage`), in which case retrieval is skipped entirely.
pub fn extract_query(strategy: QueryStrategy, messages: &[ChatMessage]) -> Option<String> {
    match strategy {
        QueryStrategy::LastUserMessage => messages
            .iter()
            .rev()
            .find(|m| m.is_user())
            .and_then(ChatMessage::content_text),
        QueryStrategy::FirstUserMessage => messages
            .iter()
            .find(|m| m.is_user())
            .and_then(ChatMessage::content_text),
        QueryStrategy::AllUserMessagesJoined => {
            let parts: Vec<String> = messages
                .iter()
                .filter(|m| m.is_user())
                .filter_map(ChatMessage::content_text)
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" | "))
            }
        }
        QueryStrategy::LastAssistantMessage => messages
            .iter()
            .rev()
            .find(|m| m.is_assistant())
            .and_then(ChatMessage::content_text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Vec<ChatMessage> {
        vec![
            ChatMessage::text("system", "be helpful"),
            ChatMessage::text("user", "first question"),
            ChatMessage::text("assistant", "first answer"),
            ChatMessage::text("user", "second question"),
        ]
    }

    #[test]
    fn last_user() {
        let query = extract_query(QueryStrategy::LastUserMessage, &conversation());
        assert_eq!(query.as_deref(), Some("second question"));
    }

    #[test]
    fn first_user() {
        let query = extract_query(QueryStrategy::FirstUserMessage, &conversation());
        assert_eq!(query.as_deref(), Some("first question"));
    }

    #[test]
    fn all_users_joined() {
        let query = extract_query(QueryStrategy::AllUserMessagesJoined, &conversation());
        assert_eq!(query.as_deref(), Some("first question | second question"));
    }

    #[test]
    fn last_assistant() {
        let query = extract_query(QueryStrategy::LastAssistantMessage, &conversation());
        assert_eq!(query.as_deref(), Some("first answer"));
    }

    #[test]
    fn empty_messages_yield_none() {
        for strategy in [
            QueryStrategy::LastUserMessage,
            QueryStrategy::FirstUserMessage,
            QueryStrategy::AllUserMessagesJoined,
            QueryStrategy::LastAssistantMessage,
        ] {
            assert!(extract_query(strategy, &[]).is_none());
        }
    }

    #[test]
    fn no_assistant_message_yields_none() {
        let messages = vec![ChatMessage::text("user", "hi")];
        assert!(extract_query(QueryStrategy::LastAssistantMessage, &messages).is_none());
    }
}
