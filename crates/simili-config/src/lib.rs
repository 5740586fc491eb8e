//! Policy loading for Simili.
//!
//! A policy document may name a parent with `extends: org/repo@branch[:path]`.
//! The resolver walks that chain through an injected fetch function, merges
//! each child over its parent field by field, applies defaults once to the
//! fully merged result, and validates it into a [`MergedPolicy`].

pub mod env_expansion;
pub mod error;
pub mod extends_ref;
pub mod loader;
pub mod policy;

pub use error::ConfigError;
pub use extends_ref::{ExtendsRef, DEFAULT_POLICY_PATH};
pub use loader::{
    find_config_path, load_with_inheritance, parse_policy_document, resolve_extends_chain,
    CONFIG_FILE_CANDIDATES, MAX_EXTENDS_DEPTH,
};
pub use policy::{
    AutoCloseSection, AutoCloseSettings, EmbeddingSection, EmbeddingSettings, LlmSection,
    LlmSettings, MergedPolicy, Policy, QdrantSection, QdrantSettings, SimilaritySection,
    SimilaritySettings,
};
