//! Image sourcing: Unsplash search and DALL·E generation

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::AiError;
use crate::provider::ProviderConfig;

/// Unsplash API base URL
pub const UNSPLASH_BASE_URL: &str = "https://api.unsplash.com";

/// Default timeout for image API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Photo returned by a search, with attribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageHit {
    pub url: String,
    pub thumbnail: String,
    pub full_size: String,
    pub photographer: String,
    pub photographer_url: String,
    pub description: Option<String>,
    pub unsplash_link: String,
    pub download_location: String,
}

/// One page of search results
#[derive(Debug, Clone, Default)]
pub struct ImageSearchPage {
    pub hits: Vec<ImageHit>,
    pub total: u64,
}

/// Generated illustration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub url: String,
    pub revised_prompt: Option<String>,
}

/// Stock photo search
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// First page of landscape photos matching `query`
    async fn search(&self, query: &str, per_page: u32) -> Result<ImageSearchPage, AiError>;
}

/// Text-to-image generation
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, AiError>;
}

/// Search keywords for a free-text description
///
/// Keeps words longer than three characters, at most five of them. Falls
/// back to the whole description when no word qualifies.
pub fn search_keywords(description: &str) -> String {
    let keywords = description
        .split(' ')
        .filter(|word| word.chars().count() > 3)
        .take(5)
        .collect::<Vec<_>>()
        .join(" ");

    if keywords.is_empty() {
        description.to_string()
    } else {
        keywords
    }
}

#[derive(Debug, Deserialize)]
struct UnsplashSearchResponse {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    description: Option<String>,
    alt_description: Option<String>,
    urls: UnsplashUrls,
    user: UnsplashUser,
    links: UnsplashPhotoLinks,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    regular: String,
    small: String,
    full: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashUser {
    name: String,
    links: UnsplashUserLinks,
}

#[derive(Debug, Deserialize)]
struct UnsplashUserLinks {
    html: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhotoLinks {
    html: String,
    download_location: String,
}

impl From<UnsplashPhoto> for ImageHit {
    fn from(photo: UnsplashPhoto) -> Self {
        Self {
            url: photo.urls.regular,
            thumbnail: photo.urls.small,
            full_size: photo.urls.full,
            photographer: photo.user.name,
            photographer_url: photo.user.links.html,
            description: photo.description.or(photo.alt_description),
            unsplash_link: photo.links.html,
            download_location: photo.links.download_location,
        }
    }
}

/// Unsplash photo search client
pub struct UnsplashClient {
    http_client: Client,
    base_url: String,
    access_key: Option<String>,
}

impl UnsplashClient {
    pub fn new(access_key: Option<String>) -> Result<Self, AiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert("Accept-Version", header::HeaderValue::from_static("v1"));

        Ok(Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .default_headers(headers)
                .build()?,
            base_url: UNSPLASH_BASE_URL.to_string(),
            access_key: access_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ImageSearch for UnsplashClient {
    async fn search(&self, query: &str, per_page: u32) -> Result<ImageSearchPage, AiError> {
        let access_key = self
            .access_key
            .as_deref()
            .ok_or_else(|| AiError::NotConfigured("unsplash".to_string()))?;

        debug!(query = %query, per_page, "Searching Unsplash");

        let per_page = per_page.to_string();
        let response = self
            .http_client
            .get(format!("{}/search/photos", self.base_url))
            .header(header::AUTHORIZATION, format!("Client-ID {}", access_key))
            .query(&[
                ("query", query),
                ("page", "1"),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                provider: "unsplash".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UnsplashSearchResponse = response.json().await?;
        Ok(ImageSearchPage {
            total: parsed.total,
            hits: parsed.results.into_iter().map(ImageHit::from).collect(),
        })
    }
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'static str,
    prompt: &'a str,
    n: u32,
    size: &'static str,
    quality: &'static str,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageGenerationData>,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationData {
    url: Option<String>,
    revised_prompt: Option<String>,
}

/// DALL·E 3 client (OpenAI images API)
pub struct DallEClient {
    config: ProviderConfig,
    client: Client,
}

impl DallEClient {
    pub fn new(config: ProviderConfig) -> Result<Self, AiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl ImageGenerator for DallEClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, AiError> {
        let api_key = self.config.require_key()?;

        let body = ImageGenerationRequest {
            model: "dall-e-3",
            prompt,
            n: 1,
            size: "1792x1024",
            quality: "standard",
        };

        let response = self
            .client
            .post(format!("{}/images/generations", self.config.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                provider: self.config.name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ImageGenerationResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .and_then(|image| {
                image.url.map(|url| GeneratedImage {
                    url,
                    revised_prompt: image.revised_prompt,
                })
            })
            .ok_or_else(|| AiError::EmptyResponse(self.config.name.clone()))
    }
}
