//! Auto-close runtime for issues flagged as potential duplicates.
//!
//! For every open issue carrying the triage label the runtime checks the
//! grace period, then looks for human activity since the label was applied,
//! and closes the issue only when the period has expired and nobody
//! intervened.

pub mod auto_close_runtime;
pub mod github_api_client;
pub mod github_retry;
pub mod grace_period;
pub mod human_activity;
pub mod issue_tracker;

pub use auto_close_runtime::{AutoCloseResult, AutoCloseRuntimeConfig, AutoCloser, IssueOutcome};
pub use github_api_client::GithubApiClient;
pub use grace_period::{deadline, is_expired, resolve_grace_period, GracePeriod, GraceSource};
pub use human_activity::{find_human_activity, has_human_activity, ActivityEvidence, HumanActivity};
pub use issue_tracker::{CloseReason, IssueTracker, RepoRef};
