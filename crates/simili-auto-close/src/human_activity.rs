//! Human-activity detection for issues awaiting auto-close.
//!
//! Signals are checked in a fixed order and the first one found is returned:
//! a negative reaction on a triage comment, a reopen by a human after
//! labeling, then a human comment after labeling.

use chrono::{DateTime, Utc};
use simili_github_issues::bot_identity::is_bot_login;
use simili_github_issues::issue_comment::is_triage_report;
use simili_github_issues::issue_event_collection::{
    triage_comment_ids, CommentReaction, GithubIssueComment, GithubTimelineEvent,
    ReactionContent, TimelineEventKind,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Disqualifying human activity found on an issue.
pub enum HumanActivity {
    NegativeReaction {
        login: String,
        content: ReactionContent,
        comment_id: u64,
    },
    ReopenedByHuman {
        login: String,
        at: DateTime<Utc>,
    },
    HumanComment {
        login: String,
        comment_id: u64,
        at: DateTime<Utc>,
    },
}

impl HumanActivity {
    pub fn signal(&self) -> &'static str {
        match self {
            Self::NegativeReaction { .. } => "negative_reaction",
            Self::ReopenedByHuman { .. } => "reopened_by_human",
            Self::HumanComment { .. } => "human_comment",
        }
    }

    pub fn actor(&self) -> &str {
        match self {
            Self::NegativeReaction { login, .. }
            | Self::ReopenedByHuman { login, .. }
            | Self::HumanComment { login, .. } => login,
        }
    }
}

#[derive(Debug, Clone, Copy)]
/// Evidence fetched for one issue. Reactions must be tagged with the comment
/// they were placed on.
pub struct ActivityEvidence<'a> {
    pub reactions: &'a [CommentReaction],
    pub comments: &'a [GithubIssueComment],
    pub timeline: &'a [GithubTimelineEvent],
}

/// Negative reactions count at any time, but only on triage comments.
pub fn negative_reaction_on_triage_comment(
    evidence: &ActivityEvidence<'_>,
    bot_users: &[String],
) -> Option<HumanActivity> {
    let triage_ids = triage_comment_ids(evidence.comments, bot_users);
    evidence
        .reactions
        .iter()
        .filter(|reaction| triage_ids.contains(&reaction.comment_id))
        .filter(|reaction| reaction.content.is_negative())
        .find(|reaction| !is_bot_login(&reaction.author_login, bot_users))
        .map(|reaction| HumanActivity::NegativeReaction {
            login: reaction.author_login.clone(),
            content: reaction.content,
            comment_id: reaction.comment_id,
        })
}

pub fn reopened_by_human(
    labeled_at: DateTime<Utc>,
    evidence: &ActivityEvidence<'_>,
    bot_users: &[String],
) -> Option<HumanActivity> {
    evidence
        .timeline
        .iter()
        .filter(|event| event.event == TimelineEventKind::Reopened)
        .filter(|event| !is_bot_login(event.actor_login(), bot_users))
        .find_map(|event| {
            let at = event.created_at.filter(|at| *at > labeled_at)?;
            Some(HumanActivity::ReopenedByHuman {
                login: event.actor_login().to_string(),
                at,
            })
        })
}

/// Human comments posted after labeling, excluding anything that carries a
/// triage report marker.
pub fn human_comment_after_label(
    labeled_at: DateTime<Utc>,
    evidence: &ActivityEvidence<'_>,
    bot_users: &[String],
) -> Option<HumanActivity> {
    evidence
        .comments
        .iter()
        .filter(|comment| comment.created_at > labeled_at)
        .filter(|comment| !is_bot_login(comment.author_login(), bot_users))
        .find(|comment| !is_triage_report(comment.body_text()))
        .map(|comment| HumanActivity::HumanComment {
            login: comment.author_login().to_string(),
            comment_id: comment.id,
            at: comment.created_at,
        })
}

pub fn find_human_activity(
    labeled_at: DateTime<Utc>,
    evidence: &ActivityEvidence<'_>,
    bot_users: &[String],
) -> Option<HumanActivity> {
    negative_reaction_on_triage_comment(evidence, bot_users)
        .or_else(|| reopened_by_human(labeled_at, evidence, bot_users))
        .or_else(|| human_comment_after_label(labeled_at, evidence, bot_users))
}

pub fn has_human_activity(
    labeled_at: DateTime<Utc>,
    evidence: &ActivityEvidence<'_>,
    bot_users: &[String],
) -> bool {
    find_human_activity(labeled_at, evidence, bot_users).is_some()
}
