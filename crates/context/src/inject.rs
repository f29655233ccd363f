//! Context injection — place retrieved context into the message list.
//!
//! Whatever the strategy, only the targeted message is touched: order is
//! preserved, no other message is altered, and pre-existing system
//! messages are never merged into.

use mg_domain::chat::ChatMessage;
use mg_domain::config::InjectionStrategy;

/// Concatenate retrieved entries with `separator`, taking at most
/// `max_entries` and stopping before the entry that would push the total
/// past `max_chars`.
pub fn assemble_context(
    entries: &[String],
    max_entries: usize,
    max_chars: usize,
    separator: &str,
) -> String {
    let mut out = String::new();

    for entry in entries.iter().take(max_entries) {
        let addition = if out.is_empty() {
            entry.len()
        } else {
            separator.len() + entry.len()
        };
        if out.len() + addition > max_chars {
            break;
        }
        if !out.is_empty() {
            out.push_str(separator);
        }
        out.push_str(entry);
    }

    out
}

/// Apply the injection strategy, returning the new message list.
///
/// `context` must be non-empty; callers skip injection otherwise. For the
/// prefix/suffix strategies a missing user message degrades to a no-op.
pub fn inject(
    strategy: InjectionStrategy,
    mut messages: Vec<ChatMessage>,
    context: &str,
) -> Vec<ChatMessage> {
    match strategy {
        InjectionStrategy::PrependAsSystemMessage => {
            messages.insert(0, ChatMessage::text("system", context));
            messages
        }
        InjectionStrategy::PrefixFirstUserMessage => {
            if let Some(msg) = messages.iter_mut().find(|m| m.is_user()) {
                let original = msg.content_text().unwrap_or_default();
                msg.set_text(format!("{context}\n\n{original}"));
            }
            messages
        }
        InjectionStrategy::SuffixLastUserMessage => {
            if let Some(msg) = messages.iter_mut().rev().find(|m| m.is_user()) {
                let original = msg.content_text().unwrap_or_default();
                msg.set_text(format!("{original}\n\n{context}"));
            }
            messages
        }
    }
}
