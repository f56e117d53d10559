#![deny(unsafe_code)]

//! Message model and remote store access for the chat stream.

pub mod error;
pub mod http;
pub mod message;
pub mod query;
pub mod store;

pub use error::{ApiError, ApiResult};
pub use http::{HttpMessageStore, MESSAGES_PATH, StoreConfig};
pub use message::{CreatedAt, Message, MessageId, NewMessage};
pub use query::ListQuery;
pub use store::{BoxFuture, MessageStore};
