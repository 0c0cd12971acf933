use std::fmt::Write;

use crate::domain::{OrganizerError, TabRecord};

use super::schema_validator::{CLEAN_PROPOSAL_JSON_SCHEMA, GROUPING_RESULT_JSON_SCHEMA};

const ORGANIZE_POLICY: &str = "You are a browser tab organizer. Group the user's open tabs into \
browser tab groups.

Rules:
- Create between 3 and 7 groups.
- Group tabs by topic, project, domain, or purpose.
- Group colors must be one of: blue, red, green, yellow, purple, pink, orange, cyan.
- Tabs that fit no group may be left ungrouped.
- Tab indices refer to the bracketed numbers in the tab list.
- Return exactly one JSON object and nothing else. No markdown fences, prose, or comments.";

const CLEAN_POLICY: &str = "You are a browser tab cleaner. Propose tabs to close based on the \
user's request.

Rules:
- Only propose closing tabs that clearly match the request; when in doubt, keep the tab open.
- Always explain your choice in the reasoning field.
- An empty tabsToClose list is a valid answer.
- Tab indices refer to the bracketed numbers in the tab list.
- Return exactly one JSON object and nothing else. No markdown fences, prose, or comments.";

/// System/user prompt pair ready for a backend's message API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub system: String,
    pub user: String,
}

/// Renders the categorize instruction set. Pure: identical inputs produce
/// byte-identical prompts. Titles and URLs are not truncated; very large
/// snapshots can exceed a backend's context window and surface as an empty
/// or truncated response.
pub fn build_organize_prompt(tabs: &[TabRecord], guidance: Option<&str>) -> BuiltPrompt {
    let mut system = format!(
        "{ORGANIZE_POLICY}\n\nResponse JSON schema:\n{}",
        GROUPING_RESULT_JSON_SCHEMA.trim()
    );
    if let Some(guidance) = guidance
        && !guidance.trim().is_empty()
    {
        write!(system, "\n\nAdditional user guidance:\n{}", guidance.trim())
            .expect("writing to a String cannot fail");
    }

    BuiltPrompt {
        system,
        user: render_tab_list(tabs),
    }
}

/// Renders the clean instruction set. Unlike organize, guidance is the
/// operation's subject and therefore mandatory.
pub fn build_clean_prompt(tabs: &[TabRecord], guidance: &str) -> Result<BuiltPrompt, OrganizerError> {
    let guidance = guidance.trim();
    if guidance.is_empty() {
        return Err(OrganizerError::configuration(
            "clean operations require a non-empty instruction",
        ));
    }

    let system = format!(
        "{CLEAN_POLICY}\n\nResponse JSON schema:\n{}\n\nUser request:\n{guidance}",
        CLEAN_PROPOSAL_JSON_SCHEMA.trim()
    );

    Ok(BuiltPrompt {
        system,
        user: render_tab_list(tabs),
    })
}

/// One block per tab, in snapshot order, blank-line separated. The bracketed
/// number is the tab's position in the snapshot; results reference it.
fn render_tab_list(tabs: &[TabRecord]) -> String {
    let mut rendered = String::new();
    for (position, tab) in tabs.iter().enumerate() {
        if position > 0 {
            rendered.push_str("\n\n");
        }
        write!(rendered, "[{position}] {}\n    URL: {}", tab.title, tab.url)
            .expect("writing to a String cannot fail");
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::{build_clean_prompt, build_organize_prompt};
    use crate::domain::{OrganizerError, TabRecord, UNGROUPED_GROUP_ID};

    fn tabs() -> Vec<TabRecord> {
        vec![
            TabRecord {
                id: 11,
                index: 0,
                title: "Bank".to_string(),
                url: "https://bank.com".to_string(),
                window_id: 1,
                group_id: UNGROUPED_GROUP_ID,
                pinned: false,
                active: true,
            },
            TabRecord {
                id: 12,
                index: 1,
                title: "Recipe".to_string(),
                url: "https://food.com".to_string(),
                window_id: 1,
                group_id: UNGROUPED_GROUP_ID,
                pinned: false,
                active: false,
            },
        ]
    }

    #[test]
    fn organize_prompt_renders_indexed_tab_blocks() {
        let prompt = build_organize_prompt(&tabs(), None);

        assert_eq!(
            prompt.user,
            "[0] Bank\n    URL: https://bank.com\n\n[1] Recipe\n    URL: https://food.com"
        );
        assert!(prompt.system.contains("Create between 3 and 7 groups."));
        assert!(prompt.system.contains("\"tabIndices\""));
    }

    #[test]
    fn organize_prompt_appends_guidance_when_present() {
        let prompt = build_organize_prompt(&tabs(), Some("keep work and personal separate"));
        assert!(
            prompt
                .system
                .ends_with("Additional user guidance:\nkeep work and personal separate")
        );

        let without = build_organize_prompt(&tabs(), Some("   "));
        assert!(!without.system.contains("Additional user guidance"));
    }

    #[test]
    fn organize_prompt_is_deterministic() {
        let first = build_organize_prompt(&tabs(), Some("by project"));
        let second = build_organize_prompt(&tabs(), Some("by project"));

        assert_eq!(first.system, second.system);
        assert_eq!(first.user, second.user);
    }

    #[test]
    fn clean_prompt_requires_guidance() {
        let error = build_clean_prompt(&tabs(), "  ").expect_err("blank guidance should fail");
        assert!(matches!(
            error,
            OrganizerError::Configuration { message }
            if message == "clean operations require a non-empty instruction"
        ));
    }

    #[test]
    fn clean_prompt_embeds_request_and_schema() {
        let prompt =
            build_clean_prompt(&tabs(), "close shopping tabs").expect("guidance is present");

        assert!(prompt.system.contains("User request:\nclose shopping tabs"));
        assert!(prompt.system.contains("\"tabsToClose\""));
        assert!(prompt.system.contains("when in doubt, keep the tab open"));
        assert_eq!(
            prompt.user,
            "[0] Bank\n    URL: https://bank.com\n\n[1] Recipe\n    URL: https://food.com"
        );
    }
}
