#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    origin: Origin,
    text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        ChatMessage { origin: Origin::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        ChatMessage { origin: Origin::Assistant, text: text.into() }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ordered transcript of a chat session. Messages can only be appended or
/// dropped all at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_order() {
        let mut log = Conversation::default();
        log.push(ChatMessage::user("first"));
        log.push(ChatMessage::assistant("second"));
        log.push(ChatMessage::user("third"));

        let texts: Vec<&str> = log.iter().map(ChatMessage::text).collect();
        assert_eq!(texts, ["first", "second", "third"]);
        assert_eq!(log.iter().nth(1).map(ChatMessage::origin), Some(Origin::Assistant));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut log = Conversation::default();
        log.push(ChatMessage::user("hello"));
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
    }
}
