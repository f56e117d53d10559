#![deny(unsafe_code)]

//! Terminal chat client that keeps a transcript in sync with a Doodle chat
//! server and follows new messages while the reader is at the bottom.
pub mod app;
/// Transcript rendering, prompt input and the scrolling viewport.
pub mod chat;
pub mod error;
/// Layered settings and their persistence.
pub mod settings;

pub use app::run;
pub use error::AppError;
