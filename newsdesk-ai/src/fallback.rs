//! Primary → fallback provider chain

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AiError;
use crate::provider::{ChatRequest, LlmProvider, Usage};

/// Two providers tried in order
///
/// A run fails over when the primary errors at the transport or API level
/// or when its output fails post-processing.
#[derive(Clone)]
pub struct FallbackChain {
    primary: Arc<dyn LlmProvider>,
    fallback: Arc<dyn LlmProvider>,
}

impl FallbackChain {
    pub fn new(primary: Arc<dyn LlmProvider>, fallback: Arc<dyn LlmProvider>) -> Self {
        Self { primary, fallback }
    }

    pub fn primary(&self) -> &Arc<dyn LlmProvider> {
        &self.primary
    }

    /// Complete `request` and post-process the text with `postprocess`
    pub async fn run<T, F>(&self, request: &ChatRequest, postprocess: F) -> Result<(T, Usage), AiError>
    where
        F: Fn(&str) -> Result<T, AiError>,
    {
        let primary_error = match attempt(self.primary.as_ref(), request, &postprocess).await {
            Ok(served) => return Ok(served),
            Err(e) => e,
        };

        warn!(
            primary = %self.primary.name(),
            fallback = %self.fallback.name(),
            error = %primary_error,
            "Primary provider failed, trying fallback"
        );

        match attempt(self.fallback.as_ref(), request, &postprocess).await {
            Ok(served) => Ok(served),
            Err(fallback_error) => Err(AiError::Exhausted {
                primary: primary_error.to_string(),
                fallback: fallback_error.to_string(),
            }),
        }
    }
}

async fn attempt<T, F>(
    provider: &dyn LlmProvider,
    request: &ChatRequest,
    postprocess: &F,
) -> Result<(T, Usage), AiError>
where
    F: Fn(&str) -> Result<T, AiError>,
{
    let completion = provider.complete(request).await?;
    let value = postprocess(&completion.text)?;
    debug!(provider = %provider.name(), "Completion served");
    Ok((value, completion.usage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Completion;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        name: &'static str,
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &'static str, reply: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self { name, reply, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        async fn complete(&self, _request: &ChatRequest) -> Result<Completion, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(text) => Ok(Completion {
                    text: text.to_string(),
                    usage: Usage::provider_only(self.name),
                }),
                None => Err(AiError::Api {
                    provider: self.name.to_string(),
                    status: 500,
                    body: "down".to_string(),
                }),
            }
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    fn request() -> ChatRequest {
        ChatRequest::new("gpt-4", "sys", "prompt".to_string())
    }

    fn passthrough(text: &str) -> Result<String, AiError> {
        Ok(text.to_string())
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let primary = Scripted::new("openai", Some("from primary"));
        let fallback = Scripted::new("groq", Some("from fallback"));
        let chain = FallbackChain::new(primary.clone(), fallback.clone());

        let (text, usage) = chain.run(&request(), passthrough).await.unwrap();
        assert_eq!(text, "from primary");
        assert_eq!(usage.provider, "openai");
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_uses_fallback() {
        let chain = FallbackChain::new(
            Scripted::new("openai", None),
            Scripted::new("groq", Some("from fallback")),
        );

        let (text, usage) = chain.run(&request(), passthrough).await.unwrap();
        assert_eq!(text, "from fallback");
        assert_eq!(usage.provider, "groq");
    }

    #[tokio::test]
    async fn test_postprocess_failure_triggers_fallback() {
        let chain = FallbackChain::new(
            Scripted::new("openai", Some("not json")),
            Scripted::new("groq", Some("{\"ok\":true}")),
        );

        let (value, _) = chain
            .run(&request(), |text| {
                serde_json::from_str::<serde_json::Value>(text)
                    .map_err(|e| AiError::InvalidJson(e.to_string()))
            })
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_both_failing_reports_both_errors() {
        let chain = FallbackChain::new(Scripted::new("openai", None), Scripted::new("groq", None));

        let err = chain.run(&request(), passthrough).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("openai API error (500)"), "{}", message);
        assert!(message.contains("fallback error: groq API error (500)"), "{}", message);
    }
}
