use doodle_api::ApiError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SendError {
    #[snafu(display("message text is empty"))]
    EmptyText { stage: &'static str },
    #[snafu(display("sync engine is not active"))]
    Inactive { stage: &'static str },
    #[snafu(display("store rejected message on `{stage}`: {source}"))]
    Store {
        stage: &'static str,
        source: ApiError,
    },
}

impl SendError {
    /// True when nothing was sent over the network.
    pub fn is_local_rejection(&self) -> bool {
        matches!(self, Self::EmptyText { .. } | Self::Inactive { .. })
    }
}

pub type SendResult<T> = Result<T, SendError>;
