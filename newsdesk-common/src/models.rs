//! Domain models
//!
//! Records serialize with camelCase field names, which is the shape the
//! editor frontend consumes. Enum values use their upper-case wire names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Newsroom role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Writer,
    Editor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Writer => "WRITER",
            Role::Editor => "EDITOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WRITER" => Ok(Role::Writer),
            "EDITOR" => Ok(Role::Editor),
            "ADMIN" => Ok(Role::Admin),
            other => Err(Error::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

/// Editorial workflow state
///
/// Normal flow: DRAFT → IN_REVIEW → PUBLISHED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArticleStatus {
    #[default]
    Draft,
    InReview,
    Published,
    Archived,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "DRAFT",
            ArticleStatus::InReview => "IN_REVIEW",
            ArticleStatus::Published => "PUBLISHED",
            ArticleStatus::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(ArticleStatus::Draft),
            "IN_REVIEW" => Ok(ArticleStatus::InReview),
            "PUBLISHED" => Ok(ArticleStatus::Published),
            "ARCHIVED" => Ok(ArticleStatus::Archived),
            other => Err(Error::InvalidInput(format!("Unknown article status: {}", other))),
        }
    }
}

/// Kind of AI assistant recorded in agent logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentType {
    Research,
    Writing,
    FactChecking,
    Editorial,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Research => "RESEARCH",
            AgentType::Writing => "WRITING",
            AgentType::FactChecking => "FACT_CHECKING",
            AgentType::Editorial => "EDITORIAL",
        }
    }
}

impl FromStr for AgentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESEARCH" => Ok(AgentType::Research),
            "WRITING" => Ok(AgentType::Writing),
            "FACT_CHECKING" => Ok(AgentType::FactChecking),
            "EDITORIAL" => Ok(AgentType::Editorial),
            other => Err(Error::InvalidInput(format!("Unknown agent type: {}", other))),
        }
    }
}

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Review,
    Comment,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Review => "review",
            NotificationKind::Comment => "comment",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "review" => Ok(NotificationKind::Review),
            "comment" => Ok(NotificationKind::Comment),
            other => Err(Error::InvalidInput(format!("Unknown notification kind: {}", other))),
        }
    }
}

/// Full profile of the signed-in user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// User reference embedded in comments and versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
}

/// Author reference embedded in articles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub status: ArticleStatus,
    pub tags: Vec<String>,
    pub featured_image: Option<String>,
    pub author_id: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub author: Option<AuthorSummary>,
}

/// Related-row counts shown in article listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleCounts {
    pub comments: i64,
    pub versions: i64,
}

/// Article as returned by the listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleListItem {
    #[serde(flatten)]
    pub article: Article,
    #[serde(rename = "_count")]
    pub counts: ArticleCounts,
}

/// Article with every related collection, as returned by the detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    pub sources: Vec<Source>,
    pub citations: Vec<Citation>,
    pub images: Vec<ArticleImage>,
    pub comments: Vec<Comment>,
    pub fact_checks: Vec<FactCheck>,
    pub agent_logs: Vec<AgentLog>,
}

/// Snapshot of an article taken before its content changed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleVersion {
    pub id: String,
    pub article_id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub version_number: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub article_id: String,
    pub user_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<UserSummary>,
    /// Present when listed as part of a thread
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub replies: Option<Vec<Comment>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: String,
    pub article_id: String,
    pub url: String,
    pub title: String,
    pub publisher: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub credibility_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub citations: Option<Vec<Citation>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub id: String,
    pub article_id: String,
    pub source_id: String,
    pub quote: String,
    pub context: Option<String>,
    pub position: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<Source>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleImage {
    pub id: String,
    pub article_id: String,
    pub url: String,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    pub credit: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCheck {
    pub id: String,
    pub article_id: String,
    pub claim: String,
    pub verdict: String,
    pub explanation: String,
    pub confidence: f64,
    pub sources: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Audit record of one AI assistant run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentLog {
    pub id: String,
    pub article_id: String,
    pub agent_type: AgentType,
    pub input: String,
    pub output: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_value(ArticleStatus::InReview).unwrap(), json!("IN_REVIEW"));
        assert_eq!("PUBLISHED".parse::<ArticleStatus>().unwrap(), ArticleStatus::Published);
        assert!("published".parse::<ArticleStatus>().is_err());
    }

    #[test]
    fn test_role_defaults_to_writer() {
        assert_eq!(Role::default(), Role::Writer);
        assert_eq!("EDITOR".parse::<Role>().unwrap(), Role::Editor);
        assert_eq!(Role::Admin.to_string(), "ADMIN");
    }

    #[test]
    fn test_list_item_flattens_article_with_count() {
        let item = ArticleListItem {
            article: Article {
                id: "a1".to_string(),
                title: "Budget vote".to_string(),
                content: String::new(),
                summary: None,
                status: ArticleStatus::Draft,
                tags: vec!["politics".to_string()],
                featured_image: None,
                author_id: "u1".to_string(),
                published_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                author: None,
            },
            counts: ArticleCounts { comments: 2, versions: 1 },
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["authorId"], "u1");
        assert_eq!(value["_count"]["comments"], 2);
        assert!(value.get("author").is_none());
    }

    #[test]
    fn test_notification_kind_serializes_as_type() {
        let n = Notification {
            id: "n1".to_string(),
            user_id: "u1".to_string(),
            kind: NotificationKind::Review,
            title: "t".to_string(),
            message: "m".to_string(),
            link: None,
            read: false,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["type"], "review");
        assert_eq!(value["read"], false);
    }
}
