use std::collections::HashSet;

use doodle_api::{CreatedAt, Message, MessageId};

/// What the last mutation did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionChange {
    /// Contents were swapped wholesale (initial load or reload).
    Replaced { len: usize },
    /// `added` messages were appended at the tail.
    Appended { added: usize, len: usize },
}

impl CollectionChange {
    pub fn len(&self) -> usize {
        match self {
            Self::Replaced { len } | Self::Appended { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered, id-unique message sequence in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageCollection {
    messages: Vec<Message>,
    ids: HashSet<MessageId>,
}

impl MessageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from a store listing, keeping the first
    /// occurrence of any repeated id.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        let mut collection = Self::new();
        collection.append_unique(messages);
        collection
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.ids.contains(id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn last_created_at(&self) -> Option<&CreatedAt> {
        self.messages.last().map(|message| &message.created_at)
    }

    /// Appends one message unless its id is already present.
    pub fn push_unique(&mut self, message: Message) -> bool {
        if !self.ids.insert(message.id.clone()) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Appends every message whose id is new, in the given order.
    /// Returns how many were appended.
    pub fn append_unique<I>(&mut self, batch: I) -> usize
    where
        I: IntoIterator<Item = Message>,
    {
        batch
            .into_iter()
            .map(|message| self.push_unique(message))
            .filter(|appended| *appended)
            .count()
    }
}

impl<'a> IntoIterator for &'a MessageCollection {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
