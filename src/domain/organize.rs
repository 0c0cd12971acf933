use serde::{Deserialize, Serialize};

use super::TabRecord;

/// The closed set of colors the browser's tab-grouping feature accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupColor {
    Blue,
    Red,
    Green,
    Yellow,
    Purple,
    Pink,
    Orange,
    Cyan,
}

impl GroupColor {
    pub const ALL: [GroupColor; 8] = [
        GroupColor::Blue,
        GroupColor::Red,
        GroupColor::Green,
        GroupColor::Yellow,
        GroupColor::Purple,
        GroupColor::Pink,
        GroupColor::Orange,
        GroupColor::Cyan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GroupColor::Blue => "blue",
            GroupColor::Red => "red",
            GroupColor::Green => "green",
            GroupColor::Yellow => "yellow",
            GroupColor::Purple => "purple",
            GroupColor::Pink => "pink",
            GroupColor::Orange => "orange",
            GroupColor::Cyan => "cyan",
        }
    }
}

/// One proposed tab group. `tab_indices` reference positions in the tab
/// snapshot that was sent to the model. Out-of-range or duplicated indices
/// are passed through untouched; bounds policy belongs to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabGroup {
    pub name: String,
    pub color: GroupColor,
    pub tab_indices: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Output of a categorize operation: ordered groups plus the snapshot indices
/// the model left ungrouped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingResult {
    pub groups: Vec<TabGroup>,
    pub ungrouped: Vec<usize>,
}

impl GroupingResult {
    /// Domain rules the JSON schema cannot express (whitespace-only names).
    pub fn validate(&self) -> Result<(), String> {
        for (position, group) in self.groups.iter().enumerate() {
            if group.name.trim().is_empty() {
                return Err(format!("group at position {position} has a blank name"));
            }
        }
        Ok(())
    }
}

/// What the model returns for a clean operation, before detail resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanProposal {
    pub tabs_to_close: Vec<usize>,
    pub reasoning: String,
}

impl CleanProposal {
    pub fn validate(&self) -> Result<(), String> {
        if self.reasoning.trim().is_empty() {
            return Err("clean reasoning must not be blank".to_string());
        }
        Ok(())
    }
}

/// Title/URL pair resolved from the original snapshot for user-facing
/// preview and clipboard output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabDetail {
    pub title: String,
    pub url: String,
}

/// Output of a clean operation: close candidates, the model's reasoning, and
/// detail pairs derived from the snapshot (never supplied by the model).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResult {
    pub tabs_to_close: Vec<usize>,
    pub reasoning: String,
    pub tab_details: Vec<TabDetail>,
}

impl CleanResult {
    /// Resolves detail pairs against the snapshot in proposal order.
    /// Out-of-range close indices stay in `tabs_to_close` but produce no
    /// detail pair.
    pub fn resolve(proposal: CleanProposal, tabs: &[TabRecord]) -> Self {
        let tab_details = proposal
            .tabs_to_close
            .iter()
            .filter_map(|&index| tabs.get(index))
            .map(|tab| TabDetail {
                title: tab.title.clone(),
                url: tab.url.clone(),
            })
            .collect();

        Self {
            tabs_to_close: proposal.tabs_to_close,
            reasoning: proposal.reasoning,
            tab_details,
        }
    }
}
