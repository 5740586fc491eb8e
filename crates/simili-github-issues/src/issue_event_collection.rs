use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bot_identity::is_bot_login;
use crate::issue_comment::is_triage_report;
use crate::issue_filter::label_names_match;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Public struct `GithubUser` used across Simili components.
pub struct GithubUser {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Public struct `GithubIssueLabel` used across Simili components.
pub struct GithubIssueLabel {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Public struct `GithubIssue` used across Simili components.
pub struct GithubIssue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub labels: Vec<GithubIssueLabel>,
    #[serde(default)]
    pub pull_request: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Public struct `GithubIssueComment` used across Simili components.
pub struct GithubIssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<GithubUser>,
}

impl GithubIssueComment {
    pub fn author_login(&self) -> &str {
        self.user
            .as_ref()
            .map(|user| user.login.as_str())
            .unwrap_or_default()
    }

    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
/// Reaction content values reported by the GitHub reactions API.
pub enum ReactionContent {
    #[serde(rename = "+1")]
    ThumbsUp,
    #[serde(rename = "-1")]
    ThumbsDown,
    #[serde(rename = "laugh")]
    Laugh,
    #[serde(rename = "confused")]
    Confused,
    #[serde(rename = "heart")]
    Heart,
    #[serde(rename = "hooray")]
    Hooray,
    #[serde(rename = "rocket")]
    Rocket,
    #[serde(rename = "eyes")]
    Eyes,
    #[serde(other)]
    Other,
}

impl ReactionContent {
    /// Negative reactions contest a duplicate determination.
    pub fn is_negative(&self) -> bool {
        matches!(self, Self::ThumbsDown | Self::Confused)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Public struct `GithubReaction` used across Simili components.
pub struct GithubReaction {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub user: Option<GithubUser>,
    pub content: ReactionContent,
    pub created_at: DateTime<Utc>,
}

/// A reaction tagged with the comment it was placed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentReaction {
    pub comment_id: u64,
    pub content: ReactionContent,
    pub author_login: String,
    pub created_at: DateTime<Utc>,
}

impl CommentReaction {
    pub fn from_github(comment_id: u64, reaction: GithubReaction) -> Self {
        Self {
            comment_id,
            content: reaction.content,
            author_login: reaction.user.map(|user| user.login).unwrap_or_default(),
            created_at: reaction.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
/// Enumerates the timeline event kinds the auto-close runtime inspects.
pub enum TimelineEventKind {
    Labeled,
    Unlabeled,
    Reopened,
    Closed,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Public struct `GithubTimelineEvent` used across Simili components.
pub struct GithubTimelineEvent {
    #[serde(default)]
    pub event: TimelineEventKind,
    #[serde(default)]
    pub actor: Option<GithubUser>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub label: Option<GithubIssueLabel>,
}

impl GithubTimelineEvent {
    pub fn actor_login(&self) -> &str {
        self.actor
            .as_ref()
            .map(|actor| actor.login.as_str())
            .unwrap_or_default()
    }
}

/// Return when `label` was most recently applied, per the issue timeline.
pub fn latest_label_applied_at(
    events: &[GithubTimelineEvent],
    label: &str,
) -> Option<DateTime<Utc>> {
    events
        .iter()
        .filter(|event| event.event == TimelineEventKind::Labeled)
        .filter(|event| {
            event
                .label
                .as_ref()
                .is_some_and(|applied| label_names_match(&applied.name, label))
        })
        .filter_map(|event| event.created_at)
        .max()
}

/// Ids of bot-authored comments that carry a triage report.
pub fn triage_comment_ids(comments: &[GithubIssueComment], bot_users: &[String]) -> Vec<u64> {
    comments
        .iter()
        .filter(|comment| is_bot_login(comment.author_login(), bot_users))
        .filter(|comment| is_triage_report(comment.body_text()))
        .map(|comment| comment.id)
        .collect()
}
