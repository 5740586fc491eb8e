//! Actor classification for GitHub logins.

/// Suffix GitHub appends to app and integration accounts.
pub const GITHUB_APP_LOGIN_SUFFIX: &str = "[bot]";
/// Login prefixes used by Simili's own worker accounts.
pub const SIMILI_WORKER_LOGIN_PREFIXES: &[&str] = &["gh-simili", "simili-bot"];
/// Substring that identifies Simili worker accounts anywhere in the login.
pub const SIMILI_WORKER_LOGIN_MARKER: &str = "simili-bot";

/// Return true when `login` belongs to a bot.
///
/// Matches `[bot]`-suffixed app accounts, Simili's own worker accounts, and
/// any login in `configured_bot_users` (case-insensitive). Blank or unknown
/// logins are treated as humans.
pub fn is_bot_login(login: &str, configured_bot_users: &[String]) -> bool {
    let normalized = login.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return false;
    }
    if normalized.ends_with(GITHUB_APP_LOGIN_SUFFIX) {
        return true;
    }
    if SIMILI_WORKER_LOGIN_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
        || normalized.contains(SIMILI_WORKER_LOGIN_MARKER)
    {
        return true;
    }
    configured_bot_users
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .any(|name| name.eq_ignore_ascii_case(&normalized))
}
