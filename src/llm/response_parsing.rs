//! Best-effort isolation of a JSON object inside free-form model text.
//!
//! This path only runs for backends without native structured output. It is
//! heuristic and lossy: prose-wrapped or truncated responses may still fail
//! validation downstream, which is the expected failure mode.

/// Returns the most plausible JSON payload inside `text`: a fenced code
/// block if one exists, else the widest top-level `{...}` span, else the
/// trimmed raw text.
pub(crate) fn extract_json_payload(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(fenced) = fenced_block(trimmed) {
        let fenced = fenced.trim();
        if !fenced.is_empty() {
            return fenced;
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && start <= end
    {
        return &trimmed[start..=end];
    }

    trimmed
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let rest = &text[start + 3..];
    // Skip the info string ("json", "javascript", ...) on the fence line.
    let body = &rest[rest.find('\n')? + 1..];
    let end = body.rfind("```")?;
    Some(&body[..end])
}

pub(crate) fn non_empty_owned(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
