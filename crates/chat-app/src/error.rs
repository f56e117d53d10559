use doodle_api::ApiError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AppError {
    #[snafu(display("failed to build message store on `{stage}`: {source}"))]
    BuildStore {
        stage: &'static str,
        source: ApiError,
    },
    #[snafu(display("failed to read prompt input on `{stage}`: {source}"))]
    ReadInput {
        stage: &'static str,
        source: std::io::Error,
    },
    #[snafu(display("failed to draw the transcript on `{stage}`: {source}"))]
    Draw {
        stage: &'static str,
        source: std::io::Error,
    },
}
