/// Gates prompt submissions and keeps the draft of an in-flight send so a
/// failure can hand it back.
#[derive(Debug, Default)]
pub struct MessageInput {
    is_sending: bool,
    in_flight: Option<String>,
    restored: Option<String>,
}

impl MessageInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_sending(&self) -> bool {
        self.is_sending
    }

    /// Draft handed back by a failed send, if any.
    pub fn restored_draft(&self) -> Option<&str> {
        self.restored.as_deref()
    }

    /// Returns the trimmed text to send, or `None` while a send is in flight
    /// or when there is nothing to send. An empty line resubmits a restored
    /// draft.
    pub fn submit(&mut self, content: &str) -> Option<String> {
        if self.is_sending {
            return None;
        }

        let trimmed = content.trim();
        let text = if trimmed.is_empty() {
            self.restored.take()?
        } else {
            self.restored = None;
            trimmed.to_string()
        };

        self.is_sending = true;
        self.in_flight = Some(text.clone());
        Some(text)
    }

    pub fn finish_sent(&mut self) {
        self.is_sending = false;
        self.in_flight = None;
    }

    pub fn finish_failed(&mut self) {
        self.is_sending = false;
        self.restored = self.in_flight.take();
    }
}
