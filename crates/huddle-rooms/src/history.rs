//! Bounded per-room chat retention.

use std::collections::VecDeque;

use huddle_core::ChatMessage;

/// Retained chat messages for one room, oldest first.
///
/// Bounded by a message count; appending past the cap evicts the oldest
/// entry. A limit of `0` disables the cap.
#[derive(Debug)]
pub struct HistoryBuffer {
    messages: VecDeque<ChatMessage>,
    limit: usize,
}

impl HistoryBuffer {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            limit,
        }
    }

    /// Append a message, evicting the oldest when at capacity.
    pub fn push(&mut self, message: ChatMessage) {
        if self.limit > 0 && self.messages.len() == self.limit {
            let _ = self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Copy of the retained messages, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(n: usize) -> ChatMessage {
        ChatMessage::new("user", format!("msg-{n}"))
    }

    #[test]
    fn snapshot_preserves_append_order() {
        let mut history = HistoryBuffer::new(10);
        for n in 0..3 {
            history.push(message(n));
        }
        let texts: Vec<_> = history.snapshot().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["msg-0", "msg-1", "msg-2"]);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut history = HistoryBuffer::new(3);
        for n in 0..5 {
            history.push(message(n));
        }
        assert_eq!(history.len(), 3);
        let texts: Vec<_> = history.snapshot().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["msg-2", "msg-3", "msg-4"]);
    }

    #[test]
    fn exact_capacity_keeps_everything() {
        let mut history = HistoryBuffer::new(3);
        for n in 0..3 {
            history.push(message(n));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.snapshot()[0].text, "msg-0");
    }

    #[test]
    fn zero_limit_is_unbounded() {
        let mut history = HistoryBuffer::new(0);
        for n in 0..500 {
            history.push(message(n));
        }
        assert_eq!(history.len(), 500);
        assert_eq!(history.snapshot()[0].text, "msg-0");
    }

    #[test]
    fn starts_empty() {
        let history = HistoryBuffer::new(5);
        assert!(history.is_empty());
        assert!(history.snapshot().is_empty());
    }
}
