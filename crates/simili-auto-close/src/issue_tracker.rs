use std::fmt;

use anyhow::{anyhow, bail, Result};
use simili_github_issues::issue_event_collection::{
    GithubIssue, GithubIssueComment, GithubReaction, GithubTimelineEvent,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Repository addressed as `owner/name`.
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| anyhow!("invalid repository '{raw}', expected owner/name"))?;
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            bail!("invalid repository '{raw}', expected owner/name");
        }
        Ok(Self::new(owner, name))
    }

    pub fn as_slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// `state_reason` sent when closing an issue.
pub enum CloseReason {
    NotPlanned,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotPlanned => "not_planned",
        }
    }
}

/// Issue-tracker capabilities the auto-close runtime depends on.
///
/// Calls are blocking. Timeouts and retries belong to the implementation.
pub trait IssueTracker {
    fn list_open_issues_with_label(&self, repo: &RepoRef, label: &str)
        -> Result<Vec<GithubIssue>>;

    fn list_issue_timeline(
        &self,
        repo: &RepoRef,
        issue_number: u64,
    ) -> Result<Vec<GithubTimelineEvent>>;

    fn list_issue_comments(
        &self,
        repo: &RepoRef,
        issue_number: u64,
    ) -> Result<Vec<GithubIssueComment>>;

    fn list_comment_reactions(
        &self,
        repo: &RepoRef,
        comment_id: u64,
    ) -> Result<Vec<GithubReaction>>;

    fn create_issue_comment(&self, repo: &RepoRef, issue_number: u64, body: &str) -> Result<()>;

    fn close_issue(&self, repo: &RepoRef, issue_number: u64, reason: CloseReason) -> Result<()>;
}

impl<T: IssueTracker + ?Sized> IssueTracker for &T {
    fn list_open_issues_with_label(
        &self,
        repo: &RepoRef,
        label: &str,
    ) -> Result<Vec<GithubIssue>> {
        (**self).list_open_issues_with_label(repo, label)
    }

    fn list_issue_timeline(
        &self,
        repo: &RepoRef,
        issue_number: u64,
    ) -> Result<Vec<GithubTimelineEvent>> {
        (**self).list_issue_timeline(repo, issue_number)
    }

    fn list_issue_comments(
        &self,
        repo: &RepoRef,
        issue_number: u64,
    ) -> Result<Vec<GithubIssueComment>> {
        (**self).list_issue_comments(repo, issue_number)
    }

    fn list_comment_reactions(
        &self,
        repo: &RepoRef,
        comment_id: u64,
    ) -> Result<Vec<GithubReaction>> {
        (**self).list_comment_reactions(repo, comment_id)
    }

    fn create_issue_comment(&self, repo: &RepoRef, issue_number: u64, body: &str) -> Result<()> {
        (**self).create_issue_comment(repo, issue_number, body)
    }

    fn close_issue(&self, repo: &RepoRef, issue_number: u64, reason: CloseReason) -> Result<()> {
        (**self).close_issue(repo, issue_number, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::{CloseReason, RepoRef};

    #[test]
    fn unit_repo_ref_parse_accepts_owner_name_shape() {
        let repo = RepoRef::parse(" similigh/simili-bot ").expect("valid repo");
        assert_eq!(repo, RepoRef::new("similigh", "simili-bot"));
        assert_eq!(repo.as_slug(), "similigh/simili-bot");
        assert_eq!(repo.to_string(), "similigh/simili-bot");
    }

    #[test]
    fn regression_repo_ref_parse_rejects_malformed_values() {
        for raw in ["", "owner", "/name", "owner/", "owner/name/extra"] {
            assert!(RepoRef::parse(raw).is_err(), "expected error for {raw:?}");
        }
    }

    #[test]
    fn unit_close_reason_serializes_github_values() {
        assert_eq!(CloseReason::NotPlanned.as_str(), "not_planned");
    }
}
