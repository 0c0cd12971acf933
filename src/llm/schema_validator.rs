use jsonschema::JSONSchema;
use serde_json::Value;

use crate::domain::{CleanProposal, GroupingResult, OrganizerError};

use super::response_parsing::extract_json_payload;

/// Shape contract for a categorize response. Extra keys are tolerated;
/// missing required fields or wrong shapes are not. Index bounds are
/// deliberately not checked here (orchestrator policy).
pub const GROUPING_RESULT_JSON_SCHEMA: &str = r#"
{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "type": "object",
  "required": ["groups", "ungrouped"],
  "properties": {
    "groups": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["name", "color", "tabIndices"],
        "properties": {
          "name": {
            "type": "string",
            "minLength": 1
          },
          "color": {
            "enum": ["blue", "red", "green", "yellow", "purple", "pink", "orange", "cyan"]
          },
          "tabIndices": {
            "type": "array",
            "items": {
              "type": "integer",
              "minimum": 0
            }
          },
          "reasoning": {
            "type": "string"
          }
        }
      }
    },
    "ungrouped": {
      "type": "array",
      "items": {
        "type": "integer",
        "minimum": 0
      }
    }
  }
}
"#;

/// Shape contract for a clean response. `tabDetails` is absent on purpose:
/// details are derived from the snapshot afterwards, never model-supplied.
pub const CLEAN_PROPOSAL_JSON_SCHEMA: &str = r#"
{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "type": "object",
  "required": ["tabsToClose", "reasoning"],
  "properties": {
    "tabsToClose": {
      "type": "array",
      "items": {
        "type": "integer",
        "minimum": 0
      }
    },
    "reasoning": {
      "type": "string"
    }
  }
}
"#;

/// Structural gate every provider funnels into, whether the backend enforced
/// the shape natively or the payload came out of heuristic text extraction.
pub struct ResponseSchemaValidator {
    grouping_schema: JSONSchema,
    clean_schema: JSONSchema,
}

impl ResponseSchemaValidator {
    pub fn new() -> Result<Self, OrganizerError> {
        Ok(Self {
            grouping_schema: compile_schema(GROUPING_RESULT_JSON_SCHEMA, "grouping")?,
            clean_schema: compile_schema(CLEAN_PROPOSAL_JSON_SCHEMA, "clean")?,
        })
    }

    /// Extracts and validates a grouping result from raw response text.
    pub fn grouping_from_text(&self, text: &str) -> Result<GroupingResult, OrganizerError> {
        self.validate_grouping_json(extract_json_payload(text))
    }

    pub fn validate_grouping_json(&self, payload: &str) -> Result<GroupingResult, OrganizerError> {
        let value = decode(payload)?;
        self.grouping_schema
            .validate(&value)
            .map_err(|errors| schema_violation(errors, payload))?;

        let result: GroupingResult = serde_json::from_value(value).map_err(|err| {
            OrganizerError::malformed(
                format!("response did not match the grouping contract: {err}"),
                payload,
            )
        })?;

        result
            .validate()
            .map_err(|message| OrganizerError::malformed(message, payload))?;
        Ok(result)
    }

    /// Extracts and validates a clean proposal from raw response text.
    pub fn clean_from_text(&self, text: &str) -> Result<CleanProposal, OrganizerError> {
        self.validate_clean_json(extract_json_payload(text))
    }

    pub fn validate_clean_json(&self, payload: &str) -> Result<CleanProposal, OrganizerError> {
        let value = decode(payload)?;
        self.clean_schema
            .validate(&value)
            .map_err(|errors| schema_violation(errors, payload))?;

        let proposal: CleanProposal = serde_json::from_value(value).map_err(|err| {
            OrganizerError::malformed(
                format!("response did not match the clean contract: {err}"),
                payload,
            )
        })?;

        proposal
            .validate()
            .map_err(|message| OrganizerError::malformed(message, payload))?;
        Ok(proposal)
    }
}

fn compile_schema(schema_text: &str, name: &str) -> Result<JSONSchema, OrganizerError> {
    let schema: Value = serde_json::from_str(schema_text)
        .map_err(|err| OrganizerError::internal(format!("invalid built-in {name} schema: {err}")))?;
    JSONSchema::compile(&schema)
        .map_err(|err| OrganizerError::internal(format!("failed to compile {name} schema: {err}")))
}

fn decode(payload: &str) -> Result<Value, OrganizerError> {
    serde_json::from_str(payload).map_err(|err| {
        OrganizerError::malformed(format!("response JSON decode failed: {err}"), payload)
    })
}

fn schema_violation<'a, I>(errors: I, payload: &str) -> OrganizerError
where
    I: IntoIterator<Item = jsonschema::ValidationError<'a>>,
{
    let details = errors
        .into_iter()
        .map(|err| err.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    OrganizerError::malformed(
        format!("response schema validation failed: {details}"),
        payload,
    )
}
