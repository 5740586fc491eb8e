//! Shared helpers for the Simili GitHub issues runtime.
//! This crate provides issue-tracker data types, bot identity and triage
//! comment recognition, and label filters consumed by the auto-close runtime.

pub mod bot_identity;
pub mod issue_comment;
pub mod issue_event_collection;
pub mod issue_filter;
