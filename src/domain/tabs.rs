use serde::{Deserialize, Serialize};

/// Sentinel group identifier for a tab that belongs to no browser tab group.
pub const UNGROUPED_GROUP_ID: i64 = -1;

/// One captured snapshot of a browser tab at invocation time.
///
/// Records are created by the orchestrator when a cycle starts, read-only for
/// the duration of that cycle, and discarded afterwards. They are never
/// persisted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRecord {
    pub id: i64,
    /// Position of the tab within its window.
    pub index: usize,
    pub title: String,
    pub url: String,
    pub window_id: i64,
    /// Browser tab-group membership, [`UNGROUPED_GROUP_ID`] when ungrouped.
    pub group_id: i64,
    pub pinned: bool,
    pub active: bool,
}

impl TabRecord {
    pub fn is_grouped(&self) -> bool {
        self.group_id != UNGROUPED_GROUP_ID
    }
}
