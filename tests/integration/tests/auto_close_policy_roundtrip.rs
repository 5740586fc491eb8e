use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    fs,
};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use simili_auto_close::{
    AutoCloseRuntimeConfig, AutoCloser, CloseReason, IssueTracker, RepoRef,
};
use simili_config::{load_with_inheritance, ConfigError, ExtendsRef};
use simili_github_issues::issue_comment::TRIAGE_REPORT_MARKER;
use simili_github_issues::issue_event_collection::{
    GithubIssue, GithubIssueComment, GithubIssueLabel, GithubReaction, GithubTimelineEvent,
    GithubUser, ReactionContent, TimelineEventKind,
};
use tempfile::tempdir;

const ORG_POLICY: &str = r#"
qdrant:
  url: https://qdrant.example.test
  api_key: org-qdrant-key
  collection: org-issues
embedding:
  api_key: org-embed-key
llm:
  api_key: org-llm-key
auto_close:
  grace_period_hours: 48
  triage_label: needs-dedupe
bot_users:
  - triage-helper
"#;

const TEAM_POLICY: &str = r#"
extends: acme/org-policy@main
qdrant:
  collection: team-issues
auto_close:
  grace_period_hours: 24
"#;

const REPO_POLICY: &str = r#"
extends: acme/team-policy@stable:policies/simili.yaml
defaults:
  similarity_threshold: 0.8
"#;

/// Remote documents keyed by canonical `org/repo@branch:path`.
struct RemotePolicies {
    documents: BTreeMap<String, String>,
    fetched: RefCell<Vec<String>>,
}

impl RemotePolicies {
    fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            documents: entries
                .iter()
                .map(|(key, body)| (key.to_string(), body.to_string()))
                .collect(),
            fetched: RefCell::new(Vec::new()),
        }
    }

    fn fetch(&self, reference: &ExtendsRef) -> Result<Vec<u8>> {
        let key = reference.to_string();
        self.fetched.borrow_mut().push(key.clone());
        self.documents
            .get(&key)
            .map(|body| body.as_bytes().to_vec())
            .ok_or_else(|| anyhow!("no document at {key}"))
    }
}

#[derive(Default)]
struct InMemoryTracker {
    issues: Vec<GithubIssue>,
    timelines: HashMap<u64, Vec<GithubTimelineEvent>>,
    comments: HashMap<u64, Vec<GithubIssueComment>>,
    reactions: HashMap<u64, Vec<GithubReaction>>,
    notices: RefCell<Vec<u64>>,
    closed: RefCell<Vec<(u64, CloseReason)>>,
}

impl InMemoryTracker {
    fn add_issue(&mut self, number: u64, label: &str, labeled_at: DateTime<Utc>) {
        self.issues.push(GithubIssue {
            number,
            title: format!("Issue {number}"),
            state: "open".to_string(),
            labels: vec![GithubIssueLabel {
                name: label.to_string(),
            }],
            pull_request: None,
        });
        self.timelines.insert(
            number,
            vec![GithubTimelineEvent {
                event: TimelineEventKind::Labeled,
                actor: Some(user("github-actions[bot]")),
                created_at: Some(labeled_at),
                label: Some(GithubIssueLabel {
                    name: label.to_string(),
                }),
            }],
        );
    }

    fn add_comment(&mut self, issue: u64, id: u64, login: &str, body: &str, at: DateTime<Utc>) {
        self.comments.entry(issue).or_default().push(GithubIssueComment {
            id,
            body: Some(body.to_string()),
            created_at: at,
            user: Some(user(login)),
        });
    }

    fn add_reaction(&mut self, comment_id: u64, login: &str, content: ReactionContent) {
        self.reactions.entry(comment_id).or_default().push(GithubReaction {
            id: comment_id + 1_000,
            user: Some(user(login)),
            content,
            created_at: base_time(),
        });
    }
}

impl IssueTracker for InMemoryTracker {
    fn list_open_issues_with_label(&self, _repo: &RepoRef, label: &str) -> Result<Vec<GithubIssue>> {
        Ok(self
            .issues
            .iter()
            .filter(|issue| {
                issue
                    .labels
                    .iter()
                    .any(|applied| applied.name.eq_ignore_ascii_case(label))
            })
            .cloned()
            .collect())
    }

    fn list_issue_timeline(
        &self,
        _repo: &RepoRef,
        issue_number: u64,
    ) -> Result<Vec<GithubTimelineEvent>> {
        Ok(self.timelines.get(&issue_number).cloned().unwrap_or_default())
    }

    fn list_issue_comments(
        &self,
        _repo: &RepoRef,
        issue_number: u64,
    ) -> Result<Vec<GithubIssueComment>> {
        Ok(self.comments.get(&issue_number).cloned().unwrap_or_default())
    }

    fn list_comment_reactions(
        &self,
        _repo: &RepoRef,
        comment_id: u64,
    ) -> Result<Vec<GithubReaction>> {
        Ok(self.reactions.get(&comment_id).cloned().unwrap_or_default())
    }

    fn create_issue_comment(&self, _repo: &RepoRef, issue_number: u64, _body: &str) -> Result<()> {
        self.notices.borrow_mut().push(issue_number);
        Ok(())
    }

    fn close_issue(&self, _repo: &RepoRef, issue_number: u64, reason: CloseReason) -> Result<()> {
        self.closed.borrow_mut().push((issue_number, reason));
        Ok(())
    }
}

fn user(login: &str) -> GithubUser {
    GithubUser {
        login: login.to_string(),
    }
}

fn base_time() -> DateTime<Utc> {
    "2026-06-01T00:00:00Z".parse().expect("valid timestamp")
}

fn remote_chain() -> RemotePolicies {
    RemotePolicies::new(&[
        ("acme/org-policy@main:.github/simili.yaml", ORG_POLICY),
        ("acme/team-policy@stable:policies/simili.yaml", TEAM_POLICY),
    ])
}

#[test]
fn integration_policy_chain_drives_auto_close_run() {
    let workspace = tempdir().expect("tempdir");
    let path = workspace.path().join("simili.yaml");
    fs::write(&path, REPO_POLICY).expect("write repo policy");

    let remote = remote_chain();
    let policy =
        load_with_inheritance(&path, |reference| remote.fetch(reference)).expect("load chain");
    assert_eq!(
        remote.fetched.borrow().as_slice(),
        &[
            "acme/team-policy@stable:policies/simili.yaml".to_string(),
            "acme/org-policy@main:.github/simili.yaml".to_string(),
        ]
    );
    assert_eq!(policy.qdrant.collection, "team-issues");
    assert_eq!(policy.qdrant.url, "https://qdrant.example.test");
    assert_eq!(policy.defaults.similarity_threshold, 0.8);
    assert_eq!(policy.defaults.max_similar_to_show, 5);
    assert_eq!(policy.auto_close.grace_period_hours, 24);
    assert_eq!(policy.auto_close.triage_label, "needs-dedupe");
    assert_eq!(policy.bot_users, vec!["triage-helper".to_string()]);

    let labeled_at = base_time();
    let mut tracker = InMemoryTracker::default();
    // Expired, only bot chatter: closes.
    tracker.add_issue(1, "needs-dedupe", labeled_at);
    tracker.add_comment(
        1,
        100,
        "github-actions[bot]",
        &format!("{TRIAGE_REPORT_MARKER}\n## Simili Triage Report"),
        labeled_at - Duration::seconds(3),
    );
    tracker.add_comment(
        1,
        101,
        "triage-helper",
        "Cross-linked to #12.",
        labeled_at + Duration::hours(1),
    );
    tracker.add_reaction(100, "github-actions[bot]", ReactionContent::Confused);
    // Expired, maintainer disagreed on the triage report: stays open.
    tracker.add_issue(2, "needs-dedupe", labeled_at);
    tracker.add_comment(
        2,
        200,
        "github-actions[bot]",
        TRIAGE_REPORT_MARKER,
        labeled_at - Duration::seconds(3),
    );
    tracker.add_reaction(200, "maintainer", ReactionContent::ThumbsDown);
    // Labeled recently: still in grace.
    tracker.add_issue(3, "needs-dedupe", labeled_at + Duration::hours(20));
    // Different label: never enumerated.
    tracker.add_issue(4, "potential-duplicate", labeled_at - Duration::days(30));

    let closer = AutoCloser::new(&tracker, AutoCloseRuntimeConfig::from_policy(&policy));
    let result = closer
        .run_at(
            &RepoRef::new("acme", "widgets"),
            labeled_at + Duration::hours(24),
        )
        .expect("run succeeds");

    assert_eq!(result.processed, 3);
    assert_eq!(result.closed, 1);
    assert_eq!(result.skipped_human, 1);
    assert_eq!(result.skipped_grace, 1);
    assert!(result.errors.is_empty());
    assert!(result.is_consistent());
    assert_eq!(tracker.notices.borrow().as_slice(), &[1]);
    assert_eq!(
        tracker.closed.borrow().as_slice(),
        &[(1, CloseReason::NotPlanned)]
    );

    let rendered = serde_json::to_value(&result).expect("serialize result");
    assert_eq!(rendered["processed"], 3);
    assert_eq!(rendered["skipped_human"], 1);
}

#[test]
fn integration_broken_chain_aborts_before_any_issue_is_touched() {
    let workspace = tempdir().expect("tempdir");
    let path = workspace.path().join("simili.yaml");
    fs::write(&path, REPO_POLICY).expect("write repo policy");

    let remote = RemotePolicies::new(&[(
        "acme/team-policy@stable:policies/simili.yaml",
        TEAM_POLICY,
    )]);
    let error = load_with_inheritance(&path, |reference| remote.fetch(reference))
        .expect_err("missing org policy must fail");
    match error {
        ConfigError::Fetch { reference, .. } => {
            assert_eq!(reference, "acme/org-policy@main:.github/simili.yaml")
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[test]
fn integration_dry_run_with_minutes_override_reports_without_closing() {
    let workspace = tempdir().expect("tempdir");
    let path = workspace.path().join("simili.yaml");
    fs::write(&path, REPO_POLICY).expect("write repo policy");
    let remote = remote_chain();
    let policy =
        load_with_inheritance(&path, |reference| remote.fetch(reference)).expect("load chain");

    let labeled_at = base_time();
    let mut tracker = InMemoryTracker::default();
    tracker.add_issue(7, "needs-dedupe", labeled_at);

    let mut config = AutoCloseRuntimeConfig::from_policy(&policy);
    config.grace_period_minutes_override = Some(1);
    config.dry_run = true;
    let result = AutoCloser::new(&tracker, config)
        .run_at(&RepoRef::new("acme", "widgets"), labeled_at + Duration::minutes(1))
        .expect("run succeeds");

    assert_eq!(result.closed, 1);
    assert!(result.is_consistent());
    assert!(tracker.notices.borrow().is_empty());
    assert!(tracker.closed.borrow().is_empty());
}
