//! Gateway errors.

use thiserror::Error;

/// Errors that can occur when talking to the generative model service.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP transport or serialization failure; the service is treated as
    /// unavailable.
    #[error("model service unavailable: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status or an unexpected
    /// body.
    #[error("unexpected response from the model service: {0}")]
    UnexpectedResponse(String),

    /// The response carried neither text nor inline media to use.
    #[error("model response contained no usable output")]
    EmptyModelOutput,

    /// The polling budget ran out before the video job finished.
    #[error("video generation timed out after {attempts} status polls")]
    TimedOut {
        /// Number of status polls performed before giving up.
        attempts: u32,
    },

    /// The caller cancelled while waiting between status polls.
    #[error("video generation was cancelled")]
    Cancelled,
}
