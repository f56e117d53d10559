pub mod entities;
pub mod events;
pub mod message_input;
pub mod message_list;
pub mod transcript;

pub use events::InputCommand;
pub use message_input::MessageInput;
pub use message_list::{Align, LineKind, TranscriptLine, render_transcript};
pub use transcript::TranscriptViewport;
