//! Auto-close run loop.
//!
//! Issues are processed one at a time. A failure on one issue is recorded in
//! the [`AutoCloseResult`] and the run moves on; only failing to enumerate
//! the labeled issues aborts the run.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use simili_config::{AutoCloseSettings, MergedPolicy};
use simili_github_issues::issue_comment::render_auto_close_notice;
use simili_github_issues::issue_event_collection::{
    latest_label_applied_at, triage_comment_ids, CommentReaction, GithubIssue,
};

use crate::grace_period::{is_expired, resolve_grace_period};
use crate::human_activity::{find_human_activity, ActivityEvidence, HumanActivity};
use crate::issue_tracker::{CloseReason, IssueTracker, RepoRef};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Inputs for one auto-close run.
pub struct AutoCloseRuntimeConfig {
    pub triage_label: String,
    /// Configured grace in hours. `None` or zero falls back to the default.
    pub grace_period_hours: Option<u64>,
    /// Per-run override in minutes. Wins over the configured hours when positive.
    pub grace_period_minutes_override: Option<u64>,
    pub bot_users: Vec<String>,
    pub dry_run: bool,
}

impl Default for AutoCloseRuntimeConfig {
    fn default() -> Self {
        Self::from_settings(&AutoCloseSettings::default(), &[])
    }
}

impl AutoCloseRuntimeConfig {
    pub fn from_settings(settings: &AutoCloseSettings, bot_users: &[String]) -> Self {
        Self {
            triage_label: settings.triage_label.clone(),
            grace_period_hours: Some(settings.grace_period_hours),
            grace_period_minutes_override: None,
            bot_users: bot_users.to_vec(),
            dry_run: false,
        }
    }

    pub fn from_policy(policy: &MergedPolicy) -> Self {
        Self::from_settings(&policy.auto_close, &policy.bot_users)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Counters for one run. Every processed issue lands in exactly one bucket.
pub struct AutoCloseResult {
    pub processed: usize,
    pub closed: usize,
    pub skipped_grace: usize,
    pub skipped_human: usize,
    pub errors: Vec<String>,
}

impl AutoCloseResult {
    pub fn record(&mut self, issue_number: u64, outcome: &Result<IssueOutcome>) {
        self.processed = self.processed.saturating_add(1);
        match outcome {
            Ok(IssueOutcome::Closed { .. }) => self.closed = self.closed.saturating_add(1),
            Ok(IssueOutcome::SkippedGrace { .. }) => {
                self.skipped_grace = self.skipped_grace.saturating_add(1)
            }
            Ok(IssueOutcome::SkippedHuman(_)) => {
                self.skipped_human = self.skipped_human.saturating_add(1)
            }
            Err(error) => self.errors.push(format!("#{issue_number}: {error:#}")),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.closed
            .saturating_add(self.skipped_grace)
            .saturating_add(self.skipped_human)
            .saturating_add(self.errors.len())
            == self.processed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    /// `simulated` is set in dry-run mode, where nothing was written.
    Closed { simulated: bool },
    SkippedGrace { deadline: DateTime<Utc> },
    SkippedHuman(HumanActivity),
}

/// Drives the auto-close decision for every labeled issue in a repository.
pub struct AutoCloser<T> {
    tracker: T,
    config: AutoCloseRuntimeConfig,
}

impl<T: IssueTracker> AutoCloser<T> {
    pub fn new(tracker: T, config: AutoCloseRuntimeConfig) -> Self {
        Self { tracker, config }
    }

    pub fn run(&self, repo: &RepoRef) -> Result<AutoCloseResult> {
        self.run_at(repo, Utc::now())
    }

    /// Run against a fixed clock. Fails only when the issue list cannot be
    /// fetched.
    pub fn run_at(&self, repo: &RepoRef, now: DateTime<Utc>) -> Result<AutoCloseResult> {
        let issues = self
            .tracker
            .list_open_issues_with_label(repo, &self.config.triage_label)
            .map_err(|error| {
                error.context(format!(
                    "failed to list open issues labeled '{}' in {}",
                    self.config.triage_label,
                    repo.as_slug()
                ))
            })?;
        tracing::debug!(
            repo = %repo,
            label = %self.config.triage_label,
            issues = issues.len(),
            dry_run = self.config.dry_run,
            "auto-close scan started"
        );

        let mut result = AutoCloseResult::default();
        for issue in &issues {
            let outcome = self.evaluate_issue(repo, issue, now);
            if let Err(error) = &outcome {
                tracing::warn!(
                    repo = %repo,
                    issue = issue.number,
                    error = %format!("{error:#}"),
                    "auto-close evaluation failed"
                );
            }
            result.record(issue.number, &outcome);
        }
        tracing::debug!(
            repo = %repo,
            processed = result.processed,
            closed = result.closed,
            skipped_grace = result.skipped_grace,
            skipped_human = result.skipped_human,
            errors = result.errors.len(),
            "auto-close scan finished"
        );
        Ok(result)
    }

    pub fn evaluate_issue(
        &self,
        repo: &RepoRef,
        issue: &GithubIssue,
        now: DateTime<Utc>,
    ) -> Result<IssueOutcome> {
        let timeline = self
            .tracker
            .list_issue_timeline(repo, issue.number)
            .context("failed to fetch timeline")?;
        let labeled_at = latest_label_applied_at(&timeline, &self.config.triage_label)
            .ok_or_else(|| anyhow!("triage label event not found"))?;

        let grace = resolve_grace_period(
            self.config.grace_period_minutes_override,
            self.config.grace_period_hours,
        );
        let due = grace.deadline(labeled_at);
        if !is_expired(now, due) {
            tracing::debug!(
                issue = issue.number,
                labeled_at = %labeled_at,
                deadline = %due,
                grace_source = grace.source.as_str(),
                "grace period still running"
            );
            return Ok(IssueOutcome::SkippedGrace { deadline: due });
        }

        let comments = self
            .tracker
            .list_issue_comments(repo, issue.number)
            .context("failed to fetch comments")?;
        let mut reactions = Vec::new();
        for comment_id in triage_comment_ids(&comments, &self.config.bot_users) {
            let fetched = self
                .tracker
                .list_comment_reactions(repo, comment_id)
                .with_context(|| format!("failed to fetch reactions for comment {comment_id}"))?;
            reactions.extend(
                fetched
                    .into_iter()
                    .map(|reaction| CommentReaction::from_github(comment_id, reaction)),
            );
        }

        let evidence = ActivityEvidence {
            reactions: &reactions,
            comments: &comments,
            timeline: &timeline,
        };
        if let Some(activity) = find_human_activity(labeled_at, &evidence, &self.config.bot_users)
        {
            tracing::debug!(
                issue = issue.number,
                signal = activity.signal(),
                actor = activity.actor(),
                "human activity keeps issue open"
            );
            return Ok(IssueOutcome::SkippedHuman(activity));
        }

        if self.config.dry_run {
            tracing::info!(
                repo = %repo,
                issue = issue.number,
                "dry run: would close issue"
            );
            return Ok(IssueOutcome::Closed { simulated: true });
        }

        // The notice is only ever posted on an issue that is already closed.
        self.tracker
            .close_issue(repo, issue.number, CloseReason::NotPlanned)
            .context("failed to close issue")?;
        tracing::info!(repo = %repo, issue = issue.number, "closed issue");
        let notice = render_auto_close_notice(&self.config.triage_label, &grace.describe());
        self.tracker
            .create_issue_comment(repo, issue.number, &notice)
            .context("issue closed but failed to post auto-close notice")?;
        Ok(IssueOutcome::Closed { simulated: false })
    }
}
