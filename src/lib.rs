//! LLM-backed tab organization for browser sessions.
//!
//! `tabherd` turns a snapshot of open tabs into either a grouping plan
//! (named, colored tab groups) or a cleanup proposal (tabs safe to close),
//! using any of several interchangeable LLM backends. Backends differ only
//! in transport and authentication; prompts, response validation, and the
//! error taxonomy are shared, so callers program against [`llm::TabProvider`]
//! and pick a backend through [`llm::create_provider`].

pub mod domain;
pub mod llm;

pub use domain::{
    CleanProposal, CleanResult, ConfigField, ConfigSchema, ErrorCategory, FieldKind, GroupColor,
    GroupingResult, OrganizerError, ProviderConfig, ProviderKind, TabDetail, TabGroup, TabRecord,
    UNGROUPED_GROUP_ID,
};
pub use llm::{RetryPolicy, TabProvider, create_provider};
