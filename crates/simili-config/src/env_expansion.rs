use std::sync::OnceLock;

use regex::{Captures, Regex};

fn env_reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static env reference pattern")
    })
}

/// Replace `${NAME}` references using `lookup`; unknown names expand to "".
pub fn expand_env_references<F>(raw: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env_reference_pattern()
        .replace_all(raw, |captures: &Captures<'_>| {
            lookup(&captures[1]).unwrap_or_default()
        })
        .into_owned()
}

pub fn process_env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
