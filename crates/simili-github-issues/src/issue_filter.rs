use crate::issue_event_collection::{GithubIssue, GithubIssueLabel};

/// Normalize issue label names for case-insensitive matching.
pub fn normalize_issue_label(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Return true when two label names refer to the same label.
pub fn label_names_match(left: &str, right: &str) -> bool {
    let left = normalize_issue_label(left);
    !left.is_empty() && left == normalize_issue_label(right)
}

/// Return true when any of the labels matches `required`.
pub fn issue_labels_contain<'a>(
    labels: impl IntoIterator<Item = &'a GithubIssueLabel>,
    required: &str,
) -> bool {
    labels
        .into_iter()
        .any(|label| label_names_match(&label.name, required))
}

/// Keep open issues that carry `label`, dropping pull requests the issues API
/// reports alongside them.
pub fn retain_labeled_issues(issues: Vec<GithubIssue>, label: &str) -> Vec<GithubIssue> {
    issues
        .into_iter()
        .filter(|issue| issue.pull_request.is_none())
        .filter(|issue| issue_labels_contain(&issue.labels, label))
        .collect()
}
