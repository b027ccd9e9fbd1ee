use log::debug;

use crate::models::chat::ChatMessage;

pub const MAX_HISTORY_MESSAGES: usize = 5;
pub const MAX_HISTORY_TOKENS: usize = 12_000;

/// Bounds on the conversation suffix sent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub max_messages: usize,
    pub max_tokens: usize,
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self {
            max_messages: MAX_HISTORY_MESSAGES,
            max_tokens: MAX_HISTORY_TOKENS,
        }
    }
}

/// Rough token count: four UTF-16 code units per token, rounded up. Browser
/// clients measure text the same way.
pub fn estimate_tokens(text: &str) -> usize {
    text.encode_utf16().count().div_ceil(4)
}

fn total_tokens(messages: &[ChatMessage]) -> usize {
    messages
        .iter()
        .map(|m| estimate_tokens(&m.content))
        .sum()
}

impl HistoryWindow {
    /// Keeps the last `max_messages` messages, then drops the oldest while
    /// the estimate is over `max_tokens`. The newest message always
    /// survives, even when it alone is over budget.
    pub fn trim<'a>(&self, messages: &'a [ChatMessage]) -> &'a [ChatMessage] {
        let start = messages.len().saturating_sub(self.max_messages);
        let mut window = &messages[start..];
        let mut tokens = total_tokens(window);

        while tokens > self.max_tokens && window.len() > 1 {
            tokens -= estimate_tokens(&window[0].content);
            window = &window[1..];
        }

        debug!(
            "History window: {} of {} messages, ~{} tokens",
            window.len(),
            messages.len(),
            tokens
        );
        window
    }
}
