//! Message synchronization engine.
//!
//! The engine owns the canonical message collection and the sync cursor and is
//! the only writer of either. Every mutation runs inside one
//! `watch::Sender::send_if_modified` closure against the *current* snapshot, so
//! a poll completion and a send completion can never build on the same stale
//! base. Completions also carry the [`SessionToken`] captured when the request
//! was issued; anything from a deactivated session is dropped on the floor.
//!
//! # Operations
//!
//! - [`SyncEngine::initial_load`]: replace the collection wholesale.
//! - [`SyncEngine::poll_incremental`]: fetch strictly after the cursor, dedup by id, append.
//! - [`SyncEngine::send_message`]: post, then append the confirmed message.
//! - [`SyncEngine::retry`]: clear a load failure and load again.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use doodle_api::{CreatedAt, ListQuery, Message, MessageStore, NewMessage};
use snafu::ensure;
use tokio::sync::watch;

use crate::collection::MessageCollection;
use crate::error::{EmptyTextSnafu, InactiveSnafu, SendError, SendResult};
use crate::snapshot::{LoadFailureKind, SessionToken, SyncFailure, SyncSnapshot};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);
pub const DEFAULT_AUTHOR: &str = "User";
/// Lower bound applied to configured poll intervals.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub author: String,
    pub poll_interval: Duration,
    /// Page size for the initial load; `None` uses the store default.
    pub initial_limit: Option<u32>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            initial_limit: None,
        }
    }
}

impl SyncConfig {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_initial_limit(mut self, limit: u32) -> Self {
        self.initial_limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { count: usize },
    Failed(LoadFailureKind),
    /// The engine was deactivated before the response was applied.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No cursor yet; nothing was requested.
    NoCursor,
    UpToDate,
    Applied { fetched: usize, appended: usize },
    /// Swallowed; the next tick is the retry.
    Failed,
    Discarded,
}

enum PollStart {
    Inactive,
    NoCursor,
    Started(SessionToken, CreatedAt),
}

#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn MessageStore>,
    state: Arc<watch::Sender<SyncSnapshot>>,
    author: Arc<ArcSwap<String>>,
    poll_interval: Duration,
    initial_limit: Option<u32>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn MessageStore>, config: SyncConfig) -> Self {
        let (state, _) = watch::channel(SyncSnapshot::default());
        Self {
            store,
            state: Arc::new(state),
            author: Arc::new(ArcSwap::from_pointee(config.author)),
            poll_interval: config.poll_interval.max(MIN_POLL_INTERVAL),
            initial_limit: config.initial_limit,
        }
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.state.borrow().clone()
    }

    /// Change notifications for every visible state transition.
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.state.subscribe()
    }

    /// Local user identity; the presentation layer uses it for alignment.
    pub fn current_user(&self) -> Arc<String> {
        self.author.load_full()
    }

    pub fn set_current_user(&self, author: impl Into<String>) {
        self.author.store(Arc::new(author.into()));
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn is_sending(&self) -> bool {
        self.state.borrow().is_sending()
    }

    pub fn error(&self) -> Option<SyncFailure> {
        self.state.borrow().error()
    }

    /// Reopens the engine for mutation under its current session token.
    pub fn activate(&self) -> SessionToken {
        let mut session = SessionToken::default();
        self.state.send_if_modified(|snapshot| {
            let was_active = snapshot.is_active();
            session = snapshot.activate();
            !was_active
        });
        session
    }

    /// Stops accepting completions; in-flight responses become no-ops.
    pub fn deactivate(&self) {
        self.state.send_if_modified(|snapshot| {
            if !snapshot.is_active() {
                return false;
            }
            snapshot.deactivate();
            true
        });
        tracing::debug!("sync engine deactivated");
    }

    /// Flags the upcoming initial load before its task first runs, so the
    /// first frame already shows the loading state.
    pub(crate) fn mark_loading(&self) {
        self.state.send_if_modified(|snapshot| {
            if !snapshot.is_active() || snapshot.loading {
                return false;
            }
            snapshot.loading = true;
            true
        });
    }

    pub async fn initial_load(&self) -> LoadOutcome {
        let mut started = None;
        self.state.send_if_modified(|snapshot| {
            if !snapshot.is_active() {
                return false;
            }
            started = Some(snapshot.session());
            snapshot.loading = true;
            true
        });
        let Some(session) = started else {
            tracing::debug!("skipping initial load on inactive engine");
            return LoadOutcome::Discarded;
        };

        let query = match self.initial_limit {
            Some(limit) => ListQuery::new().with_limit(limit),
            None => ListQuery::new(),
        };
        let result = self.store.list(query).await;

        let mut outcome = LoadOutcome::Discarded;
        self.state.send_if_modified(|snapshot| {
            if !snapshot.accepts(session) {
                return false;
            }
            snapshot.loading = false;
            outcome = match result {
                Ok(messages) => {
                    let collection = MessageCollection::from_messages(messages);
                    let count = collection.len();
                    snapshot.replace_collection(collection);
                    snapshot.error = None;
                    tracing::info!(count, cursor = ?snapshot.cursor(), "loaded message history");
                    LoadOutcome::Loaded { count }
                }
                Err(error) => {
                    let kind = LoadFailureKind::from_api_error(&error);
                    tracing::warn!(
                        stage = error.stage(),
                        kind = ?kind,
                        error = %error,
                        "failed to load message history"
                    );
                    snapshot.error = Some(SyncFailure::Load { kind });
                    LoadOutcome::Failed(kind)
                }
            };
            true
        });

        if outcome == LoadOutcome::Discarded {
            tracing::debug!(session = session.0, "discarded stale load response");
        }
        outcome
    }

    pub async fn poll_incremental(&self) -> PollOutcome {
        let mut start = PollStart::Inactive;
        // The polling flag is bookkeeping only; toggling it does not notify
        // subscribers, so a quiet stream causes no redraws.
        self.state.send_if_modified(|snapshot| {
            if !snapshot.is_active() {
                return false;
            }
            start = match snapshot.cursor().cloned() {
                Some(cursor) => {
                    snapshot.polling = true;
                    PollStart::Started(snapshot.session(), cursor)
                }
                None => PollStart::NoCursor,
            };
            false
        });

        let (session, cursor) = match start {
            PollStart::Inactive => return PollOutcome::Discarded,
            PollStart::NoCursor => return PollOutcome::NoCursor,
            PollStart::Started(session, cursor) => (session, cursor),
        };

        let result = self.store.list(ListQuery::after(cursor)).await;

        let mut outcome = PollOutcome::Discarded;
        self.state.send_if_modified(|snapshot| {
            if !snapshot.accepts(session) {
                return false;
            }
            snapshot.polling = false;
            match result {
                Ok(batch) if batch.is_empty() => {
                    outcome = PollOutcome::UpToDate;
                    false
                }
                Ok(batch) => {
                    let fetched = batch.len();
                    let newest_fetched = batch.last().map(|message| message.created_at.clone());
                    let appended = snapshot.append_unique(batch);
                    // The cursor tracks server progress, even when every
                    // fetched message was already known locally.
                    let cursor_before = snapshot.cursor().cloned();
                    if let Some(newest_fetched) = newest_fetched {
                        snapshot.advance_cursor(&newest_fetched);
                    }
                    outcome = PollOutcome::Applied { fetched, appended };
                    appended > 0 || snapshot.cursor() != cursor_before.as_ref()
                }
                Err(error) => {
                    tracing::warn!(
                        stage = error.stage(),
                        error = %error,
                        "incremental poll failed; waiting for next tick"
                    );
                    outcome = PollOutcome::Failed;
                    false
                }
            }
        });

        match outcome {
            PollOutcome::Applied { fetched, appended } => {
                tracing::debug!(fetched, appended, "applied incremental poll");
            }
            PollOutcome::Discarded => {
                tracing::debug!(session = session.0, "discarded stale poll response");
            }
            PollOutcome::NoCursor | PollOutcome::UpToDate | PollOutcome::Failed => {}
        }
        outcome
    }

    /// Posts `text` as the local user.
    pub async fn send_message(&self, text: &str) -> SendResult<Message> {
        let author = self.current_user();
        self.send_message_as(text, author.as_str()).await
    }

    /// Posts `text` and appends the store-confirmed message.
    ///
    /// Overlapping sends are not refused here; callers gate input on
    /// [`SyncSnapshot::is_sending`].
    pub async fn send_message_as(&self, text: &str, author: &str) -> SendResult<Message> {
        ensure!(
            !text.trim().is_empty(),
            EmptyTextSnafu {
                stage: "send-message-validate",
            }
        );

        let mut started = None;
        self.state.send_if_modified(|snapshot| {
            if !snapshot.is_active() {
                return false;
            }
            started = Some(snapshot.session());
            snapshot.sending = true;
            true
        });
        let Some(session) = started else {
            return InactiveSnafu {
                stage: "send-message-begin",
            }
            .fail();
        };

        let result = self.store.create(NewMessage::new(text, author)).await;

        let mut applied = false;
        self.state.send_if_modified(|snapshot| {
            if !snapshot.accepts(session) {
                return false;
            }
            applied = true;
            snapshot.sending = false;
            match &result {
                Ok(message) => {
                    snapshot.append_unique(vec![message.clone()]);
                    snapshot.advance_cursor(&message.created_at);
                    if snapshot.error().is_some_and(|failure| failure.is_send()) {
                        snapshot.error = None;
                    }
                }
                Err(_) => snapshot.error = Some(SyncFailure::Send),
            }
            true
        });

        if !applied {
            tracing::debug!(session = session.0, "discarded stale send response");
        }

        match result {
            Ok(message) => {
                tracing::info!(id = %message.id, created_at = %message.created_at, "message sent");
                Ok(message)
            }
            Err(source) => {
                tracing::warn!(stage = source.stage(), error = %source, "failed to send message");
                Err(SendError::Store {
                    stage: "send-message-create",
                    source,
                })
            }
        }
    }

    /// Clears a load failure and loads again. Returns `None` when there is no
    /// load failure to retry; send failures are never resubmitted.
    pub async fn retry(&self) -> Option<LoadOutcome> {
        let mut cleared = false;
        self.state.send_if_modified(|snapshot| {
            if !snapshot.is_active() || !snapshot.error().is_some_and(|failure| failure.is_load()) {
                return false;
            }
            snapshot.error = None;
            cleared = true;
            true
        });

        if !cleared {
            tracing::debug!("retry requested without a pending load failure");
            return None;
        }
        Some(self.initial_load().await)
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SyncEngine")
            .field("author", &self.author.load().as_str())
            .field("poll_interval", &self.poll_interval)
            .field("initial_limit", &self.initial_limit)
            .finish_non_exhaustive()
    }
}
