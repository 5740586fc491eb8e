use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use simili_auto_close::github_api_client::{GithubApiClient, GithubApiClientConfig};
use simili_auto_close::{AutoCloseResult, AutoCloseRuntimeConfig, AutoCloser, RepoRef};
use simili_config::{find_config_path, load_with_inheritance, ExtendsRef};

/// An explicit zero means "expire immediately", but only positive overrides
/// take effect, so it becomes one minute.
pub(crate) fn normalize_grace_override(minutes: Option<u64>) -> Option<u64> {
    minutes.map(|minutes| minutes.max(1))
}

/// The token is checked before any client is built or request sent.
pub(crate) fn require_token(token: Option<&str>) -> Result<&str> {
    token
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| anyhow!("GITHUB_TOKEN is required"))
}

pub(crate) fn resolve_config_path(explicit: Option<&Path>, root: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_path(root),
    }
}

/// Load runtime settings from the policy file, or fall back to built-in
/// auto-close defaults when there is no file.
pub(crate) fn load_runtime_config<Fetch>(
    config_path: Option<&Path>,
    fetch: Fetch,
) -> Result<AutoCloseRuntimeConfig>
where
    Fetch: FnMut(&ExtendsRef) -> Result<Vec<u8>>,
{
    let Some(path) = config_path else {
        tracing::debug!("no policy file found, using built-in auto-close defaults");
        return Ok(AutoCloseRuntimeConfig::default());
    };
    let policy = load_with_inheritance(path, fetch)
        .with_context(|| format!("failed to load policy {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        triage_label = %policy.auto_close.triage_label,
        grace_period_hours = policy.auto_close.grace_period_hours,
        bot_users = policy.bot_users.len(),
        "loaded policy"
    );
    Ok(AutoCloseRuntimeConfig::from_policy(&policy))
}

pub(crate) fn execute_auto_close(args: &crate::cli_args::AutoCloseArgs) -> Result<AutoCloseResult> {
    let token = require_token(args.token.as_deref())?;
    let repo = RepoRef::parse(&args.repo)?;
    let mut client_config = GithubApiClientConfig::new(token);
    client_config.api_base = args.api_base.clone();
    client_config.request_timeout_ms = args.request_timeout_ms;
    client_config.retry_max_attempts = args.retry_max_attempts;
    let client = GithubApiClient::new(client_config)?;

    let working_dir = std::env::current_dir().context("failed to read working directory")?;
    let config_path = resolve_config_path(args.config.as_deref(), &working_dir);
    let mut runtime_config = load_runtime_config(config_path.as_deref(), |reference| {
        client.fetch_extends_ref(reference)
    })?;
    runtime_config.grace_period_minutes_override =
        normalize_grace_override(args.grace_period_minutes);
    runtime_config.dry_run = args.dry_run;

    AutoCloser::new(&client, runtime_config).run(&repo)
}
