use ragent_core::Message;

/// Messages handed to the loop from an ongoing conversation.
pub const DEFAULT_HISTORY_TURNS: usize = 6;

/// Running conversation, of which only the most recent messages reach the model.
pub struct ConversationWindow {
    messages: Vec<Message>,
    max_messages: usize,
}

impl ConversationWindow {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_messages,
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Every message since the last [`ConversationWindow::clear`].
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The last `max_messages` messages.
    pub fn recent(&self) -> &[Message] {
        let start = self.messages.len().saturating_sub(self.max_messages);
        &self.messages[start..]
    }

    /// Drop a trailing user turn, e.g. after its question failed.
    pub fn pop_user(&mut self) -> Option<Message> {
        match self.messages.last() {
            Some(Message::User { .. }) => self.messages.pop(),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for ConversationWindow {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_TURNS)
    }
}
