//! Error types for AI providers and post-processing

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    /// Provider has no API key configured
    #[error("{0} API key not configured")]
    NotConfigured(String),

    /// Transport failure talking to a provider
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    /// Provider answered without any content
    #[error("{0} returned an empty response")]
    EmptyResponse(String),

    /// Model output could not be turned into valid JSON
    #[error("Invalid JSON from AI: {0}")]
    InvalidJson(String),

    /// Search produced no results
    #[error("{0}")]
    NoResults(String),

    /// Both providers of a fallback chain failed
    #[error("{primary} | fallback error: {fallback}")]
    Exhausted { primary: String, fallback: String },
}
