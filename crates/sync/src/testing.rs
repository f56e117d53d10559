//! Scripted in-memory store used by the engine tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use doodle_api::{ApiError, ApiResult, BoxFuture, ListQuery, Message, MessageStore, NewMessage};
use tokio::sync::oneshot;

pub(crate) fn message(id: &str, created_at: &str) -> Message {
    Message::new(id, "Alice", format!("message {id}"), created_at)
}

pub(crate) fn status_error(status: u16) -> ApiError {
    ApiError::Status {
        stage: "scripted-store",
        status,
    }
}

pub(crate) fn unauthorized() -> ApiError {
    ApiError::Unauthorized {
        stage: "scripted-store",
    }
}

/// Replays queued responses in order; an exhausted queue answers with an
/// empty listing (or a 500 for creates).
#[derive(Default)]
pub(crate) struct ScriptedStore {
    lists: Mutex<VecDeque<ApiResult<Vec<Message>>>>,
    creates: Mutex<VecDeque<ApiResult<Message>>>,
    list_queries: Mutex<Vec<ListQuery>>,
    drafts: Mutex<Vec<NewMessage>>,
    list_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl ScriptedStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_list(&self, response: ApiResult<Vec<Message>>) {
        self.lists.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_create(&self, response: ApiResult<Message>) {
        self.creates.lock().unwrap().push_back(response);
    }

    /// Holds the next `list` response until the returned sender fires.
    pub(crate) fn gate_next_list(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        *self.list_gate.lock().unwrap() = Some(gate);
        release
    }

    pub(crate) fn list_queries(&self) -> Vec<ListQuery> {
        self.list_queries.lock().unwrap().clone()
    }

    pub(crate) fn drafts(&self) -> Vec<NewMessage> {
        self.drafts.lock().unwrap().clone()
    }
}

impl MessageStore for ScriptedStore {
    fn list<'a>(&'a self, query: ListQuery) -> BoxFuture<'a, ApiResult<Vec<Message>>> {
        self.list_queries.lock().unwrap().push(query);
        let response = self
            .lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()));
        let gate = self.list_gate.lock().unwrap().take();

        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            response
        })
    }

    fn create<'a>(&'a self, draft: NewMessage) -> BoxFuture<'a, ApiResult<Message>> {
        self.drafts.lock().unwrap().push(draft);
        let response = self
            .creates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(status_error(500)));

        Box::pin(async move { response })
    }
}
