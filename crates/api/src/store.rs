use std::future::Future;
use std::pin::Pin;

use crate::error::ApiResult;
use crate::message::{Message, NewMessage};
use crate::query::ListQuery;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Remote, append-only message stream ordered by server creation time.
pub trait MessageStore: Send + Sync {
    fn list<'a>(&'a self, query: ListQuery) -> BoxFuture<'a, ApiResult<Vec<Message>>>;
    fn create<'a>(&'a self, draft: NewMessage) -> BoxFuture<'a, ApiResult<Message>>;
}
