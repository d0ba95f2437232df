//! The ordered message log of one chat session.

use crate::types::Message;

/// Position of a message in a [`ConversationLog`], captured when the message
/// is appended.
///
/// The log is append-only between reseeds, so a handle keeps pointing at the
/// same entry no matter how many messages follow it.  Handles from before a
/// reseed must not be used; the session controller guards that with its
/// generation check.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MessageHandle(usize);

impl MessageHandle {
    /// Index of the message in the log.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Ordered sequence of messages for the active universe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole log with a single intro message.
    pub fn seed_intro(&mut self, intro: impl Into<String>) {
        self.messages.clear();
        self.messages.push(Message::intro(intro));
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Removes the intro at the head of the log, if there is one.
    pub fn drop_leading_intro(&mut self) {
        if self.messages.first().is_some_and(Message::is_intro) {
            self.messages.remove(0);
        }
    }

    /// Appends a message and returns its handle.
    pub fn push(&mut self, message: Message) -> MessageHandle {
        self.messages.push(message);
        MessageHandle(self.messages.len() - 1)
    }

    /// Returns the message behind `handle`.
    pub fn get(&self, handle: MessageHandle) -> Option<&Message> {
        self.messages.get(handle.0)
    }

    /// Appends `text` to the message behind `handle`.
    ///
    /// Returns false if the handle no longer points into the log.
    pub fn append_to(&mut self, handle: MessageHandle, text: &str) -> bool {
        match self.messages.get_mut(handle.0) {
            Some(message) => {
                message.content.push_str(text);
                true
            }
            None => false,
        }
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages in the log.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the log has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_survives_later_appends() {
        let mut log = ConversationLog::new();
        log.push(Message::user("How was my run?"));
        let reply = log.push(Message::assistant(""));
        assert!(log.append_to(reply, "Great"));
        log.push(Message::user("and tomorrow?"));
        assert!(log.append_to(reply, " job"));
        assert_eq!(log.get(reply).unwrap().content, "Great job");
        assert_eq!(log.last().unwrap().content, "and tomorrow?");
    }

    #[test]
    fn drop_leading_intro_only_touches_head() {
        let mut log = ConversationLog::new();
        log.seed_intro("Hi");
        log.drop_leading_intro();
        assert!(log.is_empty());

        log.push(Message::user("hello"));
        log.drop_leading_intro();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn seed_replaces_everything() {
        let mut log = ConversationLog::new();
        log.push(Message::user("a"));
        log.push(Message::assistant("b"));
        log.seed_intro("Welcome back");
        assert_eq!(log.messages(), &[Message::intro("Welcome back")]);
    }

    #[test]
    fn append_to_missing_handle() {
        let mut log = ConversationLog::new();
        let handle = log.push(Message::assistant(""));
        log.clear();
        assert!(!log.append_to(handle, "late"));
        assert!(log.get(handle).is_none());
    }
}
