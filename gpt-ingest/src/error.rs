use event_common::pgevents::InsertError;
use thiserror::Error;

/// Enumeration of errors that can occur while requesting a chat completion.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("could not build the http client: {0}")]
    ClientError(reqwest::Error),
    #[error("chat completion request could not be sent: {0}")]
    RequestError(reqwest::Error),
    #[error("chat completion request failed with status {status}: {error}")]
    StatusError {
        status: reqwest::StatusCode,
        error: reqwest::Error,
    },
    #[error("chat completion response is not valid json: {0}")]
    ParseError(serde_json::Error),
}

/// Enumeration of errors that stop a pipeline run, split by the step that failed.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to fetch event data: {0}")]
    FetchError(#[from] FetchError),
    #[error("failed to insert event: {0}")]
    InsertError(#[from] InsertError),
}
