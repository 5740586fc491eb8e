//! Policy document model.
//!
//! Every field is optional so a child document can be told apart from one
//! that explicitly sets a zero, `false`, or empty value. Merging keeps the
//! child's value whenever it is present; list fields are replaced wholesale.

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.65;
pub const DEFAULT_MAX_SIMILAR_TO_SHOW: u32 = 5;
pub const DEFAULT_CROSS_REPO_SEARCH: bool = true;
pub const DEFAULT_EMBEDDING_PROVIDER: &str = "gemini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "gemini-embedding-001";
pub const DEFAULT_EMBEDDING_DIMENSIONS: u32 = 768;
pub const DEFAULT_LLM_PROVIDER: &str = "gemini";
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GRACE_PERIOD_HOURS: u64 = 72;
pub const DEFAULT_TRIAGE_LABEL: &str = "potential-duplicate";

fn pick<T: Clone>(child: &Option<T>, parent: &Option<T>) -> Option<T> {
    child.as_ref().or(parent.as_ref()).cloned()
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
/// Vector storage backend section (`qdrant:`).
pub struct QdrantSection {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub collection: Option<String>,
}

impl QdrantSection {
    fn merged_over(&self, parent: &Self) -> Self {
        Self {
            url: pick(&self.url, &parent.url),
            api_key: pick(&self.api_key, &parent.api_key),
            collection: pick(&self.collection, &parent.collection),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
/// Embedding provider section (`embedding:`).
pub struct EmbeddingSection {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub dimensions: Option<u32>,
}

impl EmbeddingSection {
    fn merged_over(&self, parent: &Self) -> Self {
        Self {
            provider: pick(&self.provider, &parent.provider),
            api_key: pick(&self.api_key, &parent.api_key),
            model: pick(&self.model, &parent.model),
            dimensions: pick(&self.dimensions, &parent.dimensions),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
/// Language-model section (`llm:`).
pub struct LlmSection {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl LlmSection {
    fn merged_over(&self, parent: &Self) -> Self {
        Self {
            provider: pick(&self.provider, &parent.provider),
            api_key: pick(&self.api_key, &parent.api_key),
            model: pick(&self.model, &parent.model),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
/// Similarity search defaults (`defaults:`).
pub struct SimilaritySection {
    pub similarity_threshold: Option<f64>,
    pub max_similar_to_show: Option<u32>,
    pub cross_repo_search: Option<bool>,
}

impl SimilaritySection {
    fn merged_over(&self, parent: &Self) -> Self {
        Self {
            similarity_threshold: pick(&self.similarity_threshold, &parent.similarity_threshold),
            max_similar_to_show: pick(&self.max_similar_to_show, &parent.max_similar_to_show),
            cross_repo_search: pick(&self.cross_repo_search, &parent.cross_repo_search),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
/// Auto-close settings (`auto_close:`).
pub struct AutoCloseSection {
    pub grace_period_hours: Option<u64>,
    pub triage_label: Option<String>,
}

impl AutoCloseSection {
    fn merged_over(&self, parent: &Self) -> Self {
        Self {
            grace_period_hours: pick(&self.grace_period_hours, &parent.grace_period_hours),
            triage_label: pick(&self.triage_label, &parent.triage_label),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
/// One parsed policy document, before defaults.
pub struct Policy {
    pub extends: Option<String>,
    pub qdrant: QdrantSection,
    pub embedding: EmbeddingSection,
    pub llm: LlmSection,
    pub defaults: SimilaritySection,
    pub auto_close: AutoCloseSection,
    pub bot_users: Option<Vec<String>>,
}

impl Policy {
    /// Merge `child` over `parent` into a new policy.
    ///
    /// The result no longer extends anything: the chain it came from is
    /// considered resolved.
    pub fn merge(parent: &Policy, child: &Policy) -> Policy {
        Policy {
            extends: None,
            qdrant: child.qdrant.merged_over(&parent.qdrant),
            embedding: child.embedding.merged_over(&parent.embedding),
            llm: child.llm.merged_over(&parent.llm),
            defaults: child.defaults.merged_over(&parent.defaults),
            auto_close: child.auto_close.merged_over(&parent.auto_close),
            bot_users: pick(&child.bot_users, &parent.bot_users),
        }
    }

    /// Expand `${NAME}` references in every string value.
    pub fn expand_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let expand = |value: &mut String| {
            *value = crate::env_expansion::expand_env_references(value, &lookup);
        };
        for field in [
            &mut self.extends,
            &mut self.qdrant.url,
            &mut self.qdrant.api_key,
            &mut self.qdrant.collection,
            &mut self.embedding.provider,
            &mut self.embedding.api_key,
            &mut self.embedding.model,
            &mut self.llm.provider,
            &mut self.llm.api_key,
            &mut self.llm.model,
            &mut self.auto_close.triage_label,
        ] {
            if let Some(value) = field.as_mut() {
                expand(value);
            }
        }
        if let Some(bot_users) = self.bot_users.as_mut() {
            bot_users.iter_mut().for_each(expand);
        }
    }

    /// Fill every unset field with its default. Must only run on the fully
    /// merged policy; explicitly set values, including blanks, are kept.
    pub fn with_defaults(mut self) -> Policy {
        self.defaults
            .similarity_threshold
            .get_or_insert(DEFAULT_SIMILARITY_THRESHOLD);
        self.defaults
            .max_similar_to_show
            .get_or_insert(DEFAULT_MAX_SIMILAR_TO_SHOW);
        self.defaults
            .cross_repo_search
            .get_or_insert(DEFAULT_CROSS_REPO_SEARCH);
        self.embedding
            .provider
            .get_or_insert_with(|| DEFAULT_EMBEDDING_PROVIDER.to_string());
        self.embedding
            .model
            .get_or_insert_with(|| DEFAULT_EMBEDDING_MODEL.to_string());
        self.embedding
            .dimensions
            .get_or_insert(DEFAULT_EMBEDDING_DIMENSIONS);
        self.llm
            .provider
            .get_or_insert_with(|| DEFAULT_LLM_PROVIDER.to_string());
        self.llm
            .model
            .get_or_insert_with(|| DEFAULT_LLM_MODEL.to_string());
        self.auto_close
            .grace_period_hours
            .get_or_insert(DEFAULT_GRACE_PERIOD_HOURS);
        self.auto_close
            .triage_label
            .get_or_insert_with(|| DEFAULT_TRIAGE_LABEL.to_string());
        self.bot_users.get_or_insert_with(Vec::new);
        self
    }

    /// Return every required field that is unset or blank, in a stable order.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        [
            ("qdrant.url", &self.qdrant.url),
            ("qdrant.api_key", &self.qdrant.api_key),
            ("qdrant.collection", &self.qdrant.collection),
            ("embedding.provider", &self.embedding.provider),
            ("embedding.api_key", &self.embedding.api_key),
            ("llm.provider", &self.llm.provider),
            ("llm.api_key", &self.llm.api_key),
        ]
        .into_iter()
        .filter(|(_, value)| is_blank(value))
        .map(|(name, _)| name)
        .collect()
    }

    fn out_of_range_values(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if let Some(threshold) = self.defaults.similarity_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                problems.push(format!(
                    "defaults.similarity_threshold must be within [0, 1] (got {threshold})"
                ));
            }
        }
        if self.defaults.max_similar_to_show == Some(0) {
            problems.push("defaults.max_similar_to_show must be greater than 0".to_string());
        }
        if self.embedding.dimensions == Some(0) {
            problems.push("embedding.dimensions must be greater than 0".to_string());
        }
        if self.auto_close.grace_period_hours == Some(0) {
            problems.push("auto_close.grace_period_hours must be greater than 0".to_string());
        }
        if self
            .auto_close
            .triage_label
            .as_ref()
            .is_some_and(|label| label.trim().is_empty())
        {
            problems.push("auto_close.triage_label must be non-empty".to_string());
        }
        problems
    }

    /// Check required fields, then value ranges. Each check reports every
    /// offending field rather than stopping at the first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = self.missing_required_fields();
        if !fields.is_empty() {
            return Err(ConfigError::MissingRequired { fields });
        }
        let problems = self.out_of_range_values();
        if !problems.is_empty() {
            return Err(ConfigError::InvalidValues { problems });
        }
        Ok(())
    }

    /// Apply defaults, validate, and freeze into a [`MergedPolicy`].
    pub fn resolve(self) -> Result<MergedPolicy, ConfigError> {
        let policy = self.with_defaults();
        policy.validate()?;
        let Policy {
            qdrant,
            embedding,
            llm,
            defaults,
            auto_close,
            bot_users,
            ..
        } = policy;
        Ok(MergedPolicy {
            qdrant: QdrantSettings {
                url: qdrant.url.unwrap_or_default(),
                api_key: qdrant.api_key.unwrap_or_default(),
                collection: qdrant.collection.unwrap_or_default(),
            },
            embedding: EmbeddingSettings {
                provider: embedding.provider.unwrap_or_default(),
                api_key: embedding.api_key.unwrap_or_default(),
                model: embedding.model.unwrap_or_default(),
                dimensions: embedding
                    .dimensions
                    .unwrap_or(DEFAULT_EMBEDDING_DIMENSIONS),
            },
            llm: LlmSettings {
                provider: llm.provider.unwrap_or_default(),
                api_key: llm.api_key.unwrap_or_default(),
                model: llm.model.unwrap_or_default(),
            },
            defaults: SimilaritySettings {
                similarity_threshold: defaults
                    .similarity_threshold
                    .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD),
                max_similar_to_show: defaults
                    .max_similar_to_show
                    .unwrap_or(DEFAULT_MAX_SIMILAR_TO_SHOW),
                cross_repo_search: defaults
                    .cross_repo_search
                    .unwrap_or(DEFAULT_CROSS_REPO_SEARCH),
            },
            auto_close: AutoCloseSettings {
                grace_period_hours: auto_close
                    .grace_period_hours
                    .unwrap_or(DEFAULT_GRACE_PERIOD_HOURS),
                triage_label: auto_close
                    .triage_label
                    .unwrap_or_else(|| DEFAULT_TRIAGE_LABEL.to_string()),
            },
            bot_users: bot_users.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QdrantSettings {
    pub url: String,
    pub api_key: String,
    pub collection: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub dimensions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilaritySettings {
    pub similarity_threshold: f64,
    pub max_similar_to_show: u32,
    pub cross_repo_search: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoCloseSettings {
    pub grace_period_hours: u64,
    pub triage_label: String,
}

impl Default for AutoCloseSettings {
    fn default() -> Self {
        Self {
            grace_period_hours: DEFAULT_GRACE_PERIOD_HOURS,
            triage_label: DEFAULT_TRIAGE_LABEL.to_string(),
        }
    }
}

/// Fully merged, defaulted, and validated policy. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedPolicy {
    pub qdrant: QdrantSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub defaults: SimilaritySettings,
    pub auto_close: AutoCloseSettings,
    pub bot_users: Vec<String>,
}
