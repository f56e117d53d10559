use std::fmt;
use std::sync::Arc;

use doodle_api::{ApiError, CreatedAt, Message};

use crate::collection::{CollectionChange, MessageCollection};

/// Why the initial fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailureKind {
    /// The store rejected the bearer credential.
    Unauthorized,
    /// Any other transport or status failure.
    Unavailable,
}

impl LoadFailureKind {
    pub fn from_api_error(error: &ApiError) -> Self {
        if error.is_unauthorized() {
            Self::Unauthorized
        } else {
            Self::Unavailable
        }
    }
}

/// User-visible failure kept in shared state. Poll failures never land here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncFailure {
    Load { kind: LoadFailureKind },
    Send,
}

impl SyncFailure {
    pub fn is_load(&self) -> bool {
        matches!(self, Self::Load { .. })
    }

    pub fn is_send(&self) -> bool {
        matches!(self, Self::Send)
    }
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { .. } => formatter.write_str("Failed to load messages"),
            Self::Send => formatter.write_str("Failed to send message"),
        }
    }
}

/// Coarse engine state, derived from the snapshot flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Loading,
    Polling,
    Sending,
    Error(SyncFailure),
}

/// Identifies one activation of an engine. Completions carrying an older
/// token are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SessionToken(pub u64);

impl SessionToken {
    pub(crate) fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Read-only view of the engine published to the presentation layer.
#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    pub(crate) collection: Arc<MessageCollection>,
    pub(crate) cursor: Option<CreatedAt>,
    pub(crate) loading: bool,
    pub(crate) polling: bool,
    pub(crate) sending: bool,
    pub(crate) error: Option<SyncFailure>,
    pub(crate) revision: u64,
    pub(crate) last_change: Option<CollectionChange>,
    pub(crate) session: SessionToken,
    pub(crate) active: bool,
}

impl Default for SyncSnapshot {
    fn default() -> Self {
        Self {
            collection: Arc::new(MessageCollection::new()),
            cursor: None,
            loading: false,
            polling: false,
            sending: false,
            error: None,
            revision: 0,
            last_change: None,
            session: SessionToken::default(),
            active: true,
        }
    }
}

impl SyncSnapshot {
    pub fn messages(&self) -> &[Message] {
        self.collection.as_slice()
    }

    pub fn collection(&self) -> &MessageCollection {
        &self.collection
    }

    pub fn cursor(&self) -> Option<&CreatedAt> {
        self.cursor.as_ref()
    }

    /// True only while the initial (or retried) load is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn error(&self) -> Option<SyncFailure> {
        self.error
    }

    /// Bumped once per collection mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_change(&self) -> Option<CollectionChange> {
        self.last_change
    }

    pub fn session(&self) -> SessionToken {
        self.session
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> SyncState {
        if let Some(failure) = self.error {
            SyncState::Error(failure)
        } else if self.loading {
            SyncState::Loading
        } else if self.sending {
            SyncState::Sending
        } else if self.polling {
            SyncState::Polling
        } else {
            SyncState::Idle
        }
    }

    pub(crate) fn accepts(&self, session: SessionToken) -> bool {
        self.active && self.session == session
    }

    pub(crate) fn replace_collection(&mut self, collection: MessageCollection) {
        let len = collection.len();
        self.cursor = collection.last_created_at().cloned();
        self.collection = Arc::new(collection);
        self.record_change(CollectionChange::Replaced { len });
    }

    /// Appends unseen messages and returns how many landed.
    pub(crate) fn append_unique(&mut self, batch: Vec<Message>) -> usize {
        if batch.iter().all(|message| self.collection.contains(&message.id)) {
            return 0;
        }
        let added = Arc::make_mut(&mut self.collection).append_unique(batch);
        if added > 0 {
            let len = self.collection.len();
            self.record_change(CollectionChange::Appended { added, len });
        }
        added
    }

    /// Moves the cursor forward; an older candidate leaves it in place.
    pub(crate) fn advance_cursor(&mut self, candidate: &CreatedAt) {
        let should_advance = match &self.cursor {
            Some(current) => candidate.is_after(current),
            None => true,
        };
        if should_advance {
            self.cursor = Some(candidate.clone());
        }
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
        self.session = self.session.next();
        self.loading = false;
        self.polling = false;
        self.sending = false;
    }

    pub(crate) fn activate(&mut self) -> SessionToken {
        self.active = true;
        self.session
    }

    fn record_change(&mut self, change: CollectionChange) {
        self.revision = self.revision.saturating_add(1);
        self.last_change = Some(change);
    }
}
