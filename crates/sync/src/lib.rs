#![deny(unsafe_code)]

//! Keeps a local message list consistent with the remote stream and decides
//! when the transcript should follow new messages.

pub mod collection;
pub mod engine;
pub mod error;
pub mod poller;
pub mod scroll;
pub mod snapshot;

#[cfg(test)]
mod testing;

pub use collection::{CollectionChange, MessageCollection};
pub use engine::{
    DEFAULT_AUTHOR, DEFAULT_POLL_INTERVAL, LoadOutcome, MIN_POLL_INTERVAL, PollOutcome,
    SyncConfig, SyncEngine,
};
pub use error::{SendError, SendResult};
pub use poller::SyncHandle;
pub use scroll::{NEAR_BOTTOM_THRESHOLD, ScrollFollow, ScrollIntent, ViewportMetrics};
pub use snapshot::{LoadFailureKind, SessionToken, SyncFailure, SyncSnapshot, SyncState};
