use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use simili_config::ExtendsRef;
use simili_github_issues::issue_event_collection::{
    GithubIssue, GithubIssueComment, GithubReaction, GithubTimelineEvent,
};
use simili_github_issues::issue_filter::retain_labeled_issues;

use crate::github_retry::{
    error_body_excerpt, is_transient_status, is_transient_transport_error, server_retry_hint,
    RetryPolicy,
};
use crate::issue_tracker::{CloseReason, IssueTracker, RepoRef};

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_PAGE_SIZE: usize = 100;
const GITHUB_RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";
const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Clone)]
/// Connection settings for [`GithubApiClient`].
pub struct GithubApiClientConfig {
    pub api_base: String,
    pub token: String,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

impl GithubApiClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            token: token.into(),
            request_timeout_ms: 30_000,
            retry_max_attempts: 3,
            retry_base_delay_ms: 500,
        }
    }
}

#[derive(Clone)]
/// Blocking GitHub REST client implementing [`IssueTracker`].
pub struct GithubApiClient {
    http: reqwest::blocking::Client,
    api_base: String,
    retry: RetryPolicy,
}

impl GithubApiClient {
    pub fn new(config: GithubApiClientConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("simili-auto-close"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", config.token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid github authorization header")?,
        );

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("failed to create github api client")?;
        Ok(Self {
            http: client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            retry: RetryPolicy::new(config.retry_max_attempts, config.retry_base_delay_ms),
        })
    }

    /// Fetch raw file bytes at `path` on `branch` of `org/repo`.
    pub fn fetch_file_content(
        &self,
        org: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Vec<u8>> {
        let url = format!(
            "{}/repos/{org}/{repo}/contents/{}",
            self.api_base,
            path.trim_start_matches('/')
        );
        self.request_bytes("fetch file content", || {
            self.http
                .get(url.as_str())
                .header(reqwest::header::ACCEPT, GITHUB_RAW_MEDIA_TYPE)
                .query(&[("ref", branch)])
        })
    }

    /// Fetch the policy document an extends reference points at.
    pub fn fetch_extends_ref(&self, reference: &ExtendsRef) -> Result<Vec<u8>> {
        self.fetch_file_content(
            &reference.org,
            &reference.repo,
            &reference.path,
            &reference.branch,
        )
        .with_context(|| format!("failed to fetch {reference}"))
    }

    fn list_paginated<T>(
        &self,
        operation: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut page = 1_u32;
        let mut rows = Vec::new();
        let per_page = GITHUB_PAGE_SIZE.to_string();
        loop {
            let page_value = page.to_string();
            let chunk: Vec<T> = self.request_json(operation, || {
                self.http.get(url).query(query).query(&[
                    ("per_page", per_page.as_str()),
                    ("page", page_value.as_str()),
                ])
            })?;
            let chunk_len = chunk.len();
            rows.extend(chunk);
            if chunk_len < GITHUB_PAGE_SIZE {
                break;
            }
            page = page.saturating_add(1);
        }
        Ok(rows)
    }

    fn request_bytes<F>(&self, operation: &str, request_builder: F) -> Result<Vec<u8>>
    where
        F: Fn() -> reqwest::blocking::RequestBuilder,
    {
        let response = self.send_with_retry(operation, request_builder)?;
        let bytes = response
            .bytes()
            .with_context(|| format!("failed to read github {operation} body"))?;
        Ok(bytes.to_vec())
    }

    fn request_json<T, F>(&self, operation: &str, request_builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::blocking::RequestBuilder,
    {
        let response = self.send_with_retry(operation, request_builder)?;
        response
            .json::<T>()
            .with_context(|| format!("failed to decode github {operation}"))
    }

    fn send_with_retry<F>(
        &self,
        operation: &str,
        request_builder: F,
    ) -> Result<reqwest::blocking::Response>
    where
        F: Fn() -> reqwest::blocking::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = request_builder()
                .header(
                    "x-simili-retry-attempt",
                    attempt.saturating_sub(1).to_string(),
                )
                .send();
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let transient = is_transient_status(status, response.headers());
                    let hint = server_retry_hint(response.headers(), Utc::now());
                    let body = response.text().unwrap_or_default();
                    if transient && self.retry.allows_retry_after(attempt) {
                        let wait = self.retry.delay(attempt, hint);
                        tracing::debug!(
                            operation,
                            status = status.as_u16(),
                            attempt,
                            wait_ms = wait.as_millis() as u64,
                            "retrying github request"
                        );
                        std::thread::sleep(wait);
                        continue;
                    }

                    bail!(
                        "github api {operation} failed with status {}: {}",
                        status.as_u16(),
                        error_body_excerpt(&body, ERROR_BODY_MAX_CHARS)
                    );
                }
                Err(error) => {
                    if is_transient_transport_error(&error) && self.retry.allows_retry_after(attempt)
                    {
                        std::thread::sleep(self.retry.delay(attempt, None));
                        continue;
                    }
                    return Err(error)
                        .with_context(|| format!("github api {operation} request failed"));
                }
            }
        }
    }
}

impl IssueTracker for GithubApiClient {
    fn list_open_issues_with_label(
        &self,
        repo: &RepoRef,
        label: &str,
    ) -> Result<Vec<GithubIssue>> {
        let url = format!("{}/repos/{}/{}/issues", self.api_base, repo.owner, repo.name);
        let issues = self.list_paginated(
            "list labeled issues",
            &url,
            &[("state", "open"), ("labels", label)],
        )?;
        Ok(retain_labeled_issues(issues, label))
    }

    fn list_issue_timeline(
        &self,
        repo: &RepoRef,
        issue_number: u64,
    ) -> Result<Vec<GithubTimelineEvent>> {
        let url = format!(
            "{}/repos/{}/{}/issues/{issue_number}/timeline",
            self.api_base, repo.owner, repo.name
        );
        self.list_paginated("list issue timeline", &url, &[])
    }

    fn list_issue_comments(
        &self,
        repo: &RepoRef,
        issue_number: u64,
    ) -> Result<Vec<GithubIssueComment>> {
        let url = format!(
            "{}/repos/{}/{}/issues/{issue_number}/comments",
            self.api_base, repo.owner, repo.name
        );
        self.list_paginated(
            "list issue comments",
            &url,
            &[("sort", "created"), ("direction", "asc")],
        )
    }

    fn list_comment_reactions(
        &self,
        repo: &RepoRef,
        comment_id: u64,
    ) -> Result<Vec<GithubReaction>> {
        let url = format!(
            "{}/repos/{}/{}/issues/comments/{comment_id}/reactions",
            self.api_base, repo.owner, repo.name
        );
        self.list_paginated("list comment reactions", &url, &[])
    }

    fn create_issue_comment(&self, repo: &RepoRef, issue_number: u64, body: &str) -> Result<()> {
        let url = format!(
            "{}/repos/{}/{}/issues/{issue_number}/comments",
            self.api_base, repo.owner, repo.name
        );
        let payload = json!({ "body": body });
        let _: Value = self.request_json("create issue comment", || {
            self.http.post(url.as_str()).json(&payload)
        })?;
        Ok(())
    }

    fn close_issue(&self, repo: &RepoRef, issue_number: u64, reason: CloseReason) -> Result<()> {
        let url = format!(
            "{}/repos/{}/{}/issues/{issue_number}",
            self.api_base, repo.owner, repo.name
        );
        let payload = json!({ "state": "closed", "state_reason": reason.as_str() });
        let _: Value = self.request_json("close issue", || {
            self.http.patch(url.as_str()).json(&payload)
        })?;
        Ok(())
    }
}
