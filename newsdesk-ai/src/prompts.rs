//! Prompt templates for the newsroom agents

use serde::{Deserialize, Serialize};

pub const RESEARCH_SYSTEM: &str =
    "You are an expert research journalist specializing in fact-finding and source verification.";

pub const WRITING_SYSTEM: &str = "You are an award-winning journalist and content writer.";

pub const FACT_CHECK_SYSTEM: &str = "You are a fact-checker for a major news organization. \
     Be thorough and cite sources. Always respond with valid JSON only, no markdown.";

pub const EDITORIAL_SYSTEM: &str = "You are a senior editor at a prestigious news publication.";

pub const CAPTION_SYSTEM: &str = "You are a photo editor writing captions for news images.";

pub const CREDIBILITY_SYSTEM: &str = "You are a media literacy expert assessing source credibility.";

/// Source handed to the writing agent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WritingSource {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

/// House style for editorial review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorialGuidelines {
    pub tone: String,
    pub target_audience: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl Default for EditorialGuidelines {
    fn default() -> Self {
        Self {
            tone: "professional".to_string(),
            target_audience: "general".to_string(),
            max_length: None,
        }
    }
}

pub fn research(topic: &str, keywords: &[String]) -> String {
    let focus = if keywords.is_empty() {
        String::new()
    } else {
        format!("Focus on these aspects: {}", keywords.join(", "))
    };

    format!(
        r#"As a research journalist, provide comprehensive research about: "{topic}"
{focus}

Provide PLAIN TEXT research report with:

KEY FACTS AND STATISTICS:
- List important facts and data points

DIFFERENT PERSPECTIVES:
- Present various viewpoints on the topic

IMPORTANT CONTEXT:
- Background information and context

SUGGESTED CREDIBLE SOURCES:
- List reputable sources to investigate further

Format as PLAIN TEXT ONLY (no JSON, no code blocks). Write it as a readable research report."#
    )
}

/// Numbered reference list, one `"<n>. <title> - <summary>"` line per source
pub fn render_sources(sources: &[WritingSource]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {} - {}", i + 1, s.title, s.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn writing(brief: &str, sources: &[WritingSource], style: &str) -> String {
    let sources_context = if sources.is_empty() {
        String::new()
    } else {
        format!("\n\nReference these sources:\n{}", render_sources(sources))
    };

    format!(
        r#"Write a complete news article based on this brief: "{brief}"{sources_context}

Style: {style}

Requirements:
- Start with a clear, engaging headline on the first line
- Write a strong lead paragraph
- Include well-structured body with multiple paragraphs (at least 5-6 paragraphs)
- Use **bold text** for section headings and subheadings
- Add relevant quotes if sources are provided
- Maintain journalistic objectivity and fact-based reporting
- Make it comprehensive and detailed

Format as PLAIN TEXT with markdown-style formatting:
- First line: **Bold Headline**
- Blank line
- Lead paragraph (2-3 sentences)
- Blank line
- **Bold Subheading 1**
- Body paragraphs (2-3 paragraphs)
- Blank line
- **Bold Subheading 2**
- More body paragraphs (2-3 paragraphs)
- Include quotes in "double quotes"
- Separate all paragraphs with blank lines for readability

Use **bold** for headings by wrapping text in double asterisks. Write a detailed, well-structured article with clear sections."#
    )
}

/// `claim` is expected to be truncated already
pub fn fact_check(claim: &str, context: &str) -> String {
    let context = if context.is_empty() {
        String::new()
    } else {
        format!("\nContext: {context}")
    };

    format!(
        r#"Fact-check this claim: "{claim}"
{context}

Provide:
1. Verdict (true/false/partially-true/unverified)
2. Explanation (detailed)
3. Confidence level (0-1)
4. Sources for verification
5. Any caveats or nuances

Format as JSON with fields: verdict, explanation, confidence, sources, caveats"#
    )
}

pub fn editorial(content: &str, guidelines: &EditorialGuidelines) -> String {
    let length = guidelines
        .max_length
        .map(|words| format!("- Target Length: ~{words} words"))
        .unwrap_or_default();

    format!(
        r#"Review and improve this article content:

{content}

Guidelines:
- Tone: {tone}
- Target Audience: {audience}
{length}

Provide:
1. Overall quality score (0-10)
2. Specific improvements needed
3. Revised content (if applicable)
4. SEO suggestions
5. Readability score

Format as JSON."#,
        tone = guidelines.tone,
        audience = guidelines.target_audience,
    )
}

pub fn caption(image_description: &str, article_context: &str) -> String {
    let context = if article_context.is_empty() {
        String::new()
    } else {
        format!("\nArticle context: {article_context}")
    };

    format!(
        r#"Generate a professional news photo caption for this image: "{image_description}"
{context}

Keep it concise (1-2 sentences), informative, and journalistic."#
    )
}

/// `content_sample` is expected to be truncated already
pub fn credibility(url: &str, content_sample: &str) -> String {
    format!(
        r#"Assess the credibility of this news source:
URL: {url}
Content Sample: {content_sample}

Evaluate:
1. Publisher reputation
2. Author expertise
3. Citation quality
4. Bias indicators
5. Overall credibility score (0-1)

Format as JSON."#
    )
}

pub fn dalle(description: &str, style: &str) -> String {
    format!("{description}. Style: {style}, news photography, high quality, professional")
}
