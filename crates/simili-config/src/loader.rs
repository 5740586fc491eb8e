use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::env_expansion::process_env_lookup;
use crate::error::ConfigError;
use crate::extends_ref::ExtendsRef;
use crate::policy::{MergedPolicy, Policy};

/// Maximum number of parent documents followed through `extends`.
pub const MAX_EXTENDS_DEPTH: usize = 5;

/// Locations searched, in order, when no config path is given.
pub const CONFIG_FILE_CANDIDATES: &[&str] = &[
    ".github/simili.yaml",
    ".github/simili.yml",
    "simili.yaml",
    "simili.yml",
];

/// Return the first existing config file under `root`.
pub fn find_config_path(root: &Path) -> Option<PathBuf> {
    CONFIG_FILE_CANDIDATES
        .iter()
        .map(|candidate| root.join(candidate))
        .find(|path| path.is_file())
}

/// Parse one policy document and expand `${NAME}` references in it.
pub fn parse_policy_document<F>(
    content: &str,
    origin: &str,
    lookup: F,
) -> Result<Policy, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if content.trim().is_empty() {
        return Ok(Policy::default());
    }
    let mut policy: Policy =
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;
    policy.expand_env_with(lookup);
    Ok(policy)
}

fn parse_policy_bytes<F>(bytes: &[u8], origin: &str, lookup: F) -> Result<Policy, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let content = std::str::from_utf8(bytes).map_err(|_| ConfigError::NotUtf8 {
        origin: origin.to_string(),
    })?;
    parse_policy_document(content, origin, lookup)
}

/// Follow `root`'s extends chain and merge it, child over parent.
///
/// Defaults are not applied here. The chain is bounded by
/// [`MAX_EXTENDS_DEPTH`] parents and may not revisit a reference.
pub fn resolve_extends_chain<Fetch, Lookup>(
    root: Policy,
    mut fetch: Fetch,
    lookup: Lookup,
) -> Result<Policy, ConfigError>
where
    Fetch: FnMut(&ExtendsRef) -> anyhow::Result<Vec<u8>>,
    Lookup: Fn(&str) -> Option<String>,
{
    let mut next = root.extends.clone();
    let mut chain = vec![root];
    let mut visited = HashSet::new();
    while let Some(raw) = next.take() {
        let reference = ExtendsRef::parse(&raw)?;
        let key = reference.to_string();
        if !visited.insert(key.clone()) {
            return Err(ConfigError::ExtendsCycle { reference: key });
        }
        if visited.len() > MAX_EXTENDS_DEPTH {
            return Err(ConfigError::ExtendsDepthExceeded {
                max_depth: MAX_EXTENDS_DEPTH,
                reference: key,
            });
        }
        tracing::debug!(
            reference = key.as_str(),
            depth = visited.len(),
            "fetching extended config"
        );
        let bytes = fetch(&reference).map_err(|source| ConfigError::Fetch {
            reference: key.clone(),
            source,
        })?;
        let parent = parse_policy_bytes(&bytes, &key, &lookup)?;
        next = parent.extends.clone();
        chain.push(parent);
    }

    let mut documents = chain.into_iter().rev();
    let mut merged = documents.next().unwrap_or_default();
    for child in documents {
        merged = Policy::merge(&merged, &child);
    }
    merged.extends = None;
    Ok(merged)
}

/// Load the policy at `path`, resolve its extends chain through `fetch`,
/// apply defaults once, and validate the result.
pub fn load_with_inheritance<Fetch>(
    path: &Path,
    fetch: Fetch,
) -> Result<MergedPolicy, ConfigError>
where
    Fetch: FnMut(&ExtendsRef) -> anyhow::Result<Vec<u8>>,
{
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let origin = path.display().to_string();
    let root = parse_policy_bytes(&bytes, &origin, process_env_lookup)?;
    let merged = resolve_extends_chain(root, fetch, process_env_lookup)?;
    merged.resolve()
}
