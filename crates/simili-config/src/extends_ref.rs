use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Policy path used when an extends reference omits `:path`.
pub const DEFAULT_POLICY_PATH: &str = ".github/simili.yaml";

/// Parent policy location parsed from `org/repo@branch[:path]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtendsRef {
    pub org: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
}

impl ExtendsRef {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &'static str| ConfigError::InvalidExtendsRef {
            reference: raw.to_string(),
            reason,
        };
        let trimmed = raw.trim();
        let (slug, location) = trimmed
            .split_once('@')
            .ok_or_else(|| invalid("expected org/repo@branch[:path], missing @branch"))?;
        let (org, repo) = slug
            .split_once('/')
            .ok_or_else(|| invalid("expected org/repo@branch[:path], missing /repo"))?;
        let (org, repo) = (org.trim(), repo.trim());
        if org.is_empty() {
            return Err(invalid("org must be non-empty"));
        }
        if repo.is_empty() || repo.contains('/') {
            return Err(invalid("repo must be a single non-empty path segment"));
        }
        let (branch, path) = match location.split_once(':') {
            Some((branch, path)) => {
                let path = path.trim();
                if path.is_empty() {
                    return Err(invalid("path after ':' must be non-empty"));
                }
                (branch.trim(), path)
            }
            None => (location.trim(), DEFAULT_POLICY_PATH),
        };
        if branch.is_empty() {
            return Err(invalid("branch must be non-empty"));
        }
        Ok(Self {
            org: org.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
            path: path.to_string(),
        })
    }
}

impl FromStr for ExtendsRef {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl fmt::Display for ExtendsRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}:{}", self.org, self.repo, self.branch, self.path)
    }
}
