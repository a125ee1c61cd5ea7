//! # Newsdesk AI assistance
//!
//! Newsroom assistants built on third-party APIs:
//! - Research, article drafting and fact-checking through an OpenAI → Groq
//!   fallback chain
//! - Editorial review, captions and source credibility through OpenAI
//! - Image sourcing through Unsplash search and DALL·E generation
//!
//! Model output is post-processed by [`cleanup`] before it is returned.

pub mod agents;
pub mod cleanup;
pub mod error;
pub mod fallback;
pub mod images;
pub mod prompts;
pub mod provider;

pub use agents::{
    AgentResponse, AgentService, CaptionOutput, FactCheckVerdict, ImageSearchOutput, TextOutput,
};
pub use error::AiError;
pub use fallback::FallbackChain;
pub use images::{
    DallEClient, GeneratedImage, ImageGenerator, ImageHit, ImageSearch, ImageSearchPage,
    UnsplashClient,
};
pub use prompts::{EditorialGuidelines, WritingSource};
pub use provider::{
    ChatRequest, Completion, LlmProvider, OpenAiCompatibleProvider, ProviderConfig, Usage,
};
