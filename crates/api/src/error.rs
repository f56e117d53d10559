use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("invalid message store URL '{raw}'"))]
    InvalidBaseUrl {
        stage: &'static str,
        raw: String,
        source: url::ParseError,
    },
    #[snafu(display("failed to build http client on `{stage}`, {source}"))]
    BuildClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("Unauthorized"))]
    Unauthorized { stage: &'static str },
    #[snafu(display("API error: {status}"))]
    Status { stage: &'static str, status: u16 },
    #[snafu(display("request failed on `{stage}`, {source}"))]
    Transport {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("failed to decode response on `{stage}`, {source}"))]
    Decode {
        stage: &'static str,
        source: reqwest::Error,
    },
}

impl ApiError {
    /// True when the store rejected the bearer credential (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// HTTP status for status-class failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::InvalidBaseUrl { .. }
            | Self::BuildClient { .. }
            | Self::Transport { .. }
            | Self::Decode { .. } => None,
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidBaseUrl { stage, .. }
            | Self::BuildClient { stage, .. }
            | Self::Unauthorized { stage }
            | Self::Status { stage, .. }
            | Self::Transport { stage, .. }
            | Self::Decode { stage, .. } => stage,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
