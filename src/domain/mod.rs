mod config;
mod errors;
mod organize;
mod tabs;

pub use config::{ConfigField, ConfigSchema, FieldKind, ProviderConfig, ProviderKind};
pub use errors::{ErrorCategory, OrganizerError};
pub use organize::{CleanProposal, CleanResult, GroupColor, GroupingResult, TabDetail, TabGroup};
pub use tabs::{TabRecord, UNGROUPED_GROUP_ID};
