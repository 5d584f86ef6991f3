//! Per-intent validation applied while loading the catalog.
//!
//! Each catalog entry is validated independently: a hard error drops just
//! that entry (logged as a warning), while a soft issue is logged and the
//! entry is kept with a best-effort default substituted.

use chrono::{DateTime, Utc};
use orc_core::{Intent, IntentStatus, RelatedSpec, RelatedSpecType};
use regex::Regex;
use serde_yaml::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z]+-\d{3,}$").expect("static pattern is valid"))
}

/// Validate one raw YAML mapping into an [`Intent`], or reject it with a
/// human-readable reason.
///
/// `seen_ids` accumulates ids across the whole load so duplicates within the
/// file are rejected.
pub fn validate_intent(value: &Value, seen_ids: &mut HashSet<String>) -> Result<Intent, String> {
    let map = value
        .as_mapping()
        .ok_or_else(|| "intent entry is not a mapping".to_string())?;

    let get = |key: &str| map.get(Value::String(key.to_string()));

    let id = get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing 'id'".to_string())?;
    if !id_pattern().is_match(id) {
        return Err(format!("'id' {id:?} does not match ^[A-Z]+-\\d{{3,}}$"));
    }
    if !seen_ids.insert(id.to_string()) {
        return Err(format!("duplicate id '{id}' within catalog"));
    }

    let name = get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing 'name'".to_string())?;
    if name.len() < 3 || name.len() > 200 {
        return Err(format!(
            "'name' length {} is outside the 3-200 char range",
            name.len()
        ));
    }

    let status_str = get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing 'status'".to_string())?;
    let status = parse_status(status_str).ok_or_else(|| format!("unknown status '{status_str}'"))?;

    let owned_scope = get("owned_scope")
        .and_then(Value::as_sequence)
        .ok_or_else(|| "missing or non-array 'owned_scope'".to_string())?;
    if owned_scope.is_empty() {
        return Err("'owned_scope' must be non-empty".to_string());
    }
    let owned_scope: Vec<String> = owned_scope
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    if owned_scope.is_empty() {
        return Err("'owned_scope' entries must be strings".to_string());
    }

    let constraints = match get("constraints") {
        None => Vec::new(),
        Some(v) => v
            .as_sequence()
            .ok_or_else(|| "'constraints' must be an array".to_string())?
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    };

    let acceptance_criteria = match get("acceptance_criteria") {
        None => Vec::new(),
        Some(v) => v
            .as_sequence()
            .ok_or_else(|| "'acceptance_criteria' must be an array".to_string())?
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    };

    let created_at = get("created_at")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<DateTime<Utc>>().ok())
        .ok_or_else(|| "missing or unparsable 'created_at'".to_string())?;
    let updated_at = get("updated_at")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<DateTime<Utc>>().ok())
        .ok_or_else(|| "missing or unparsable 'updated_at'".to_string())?;

    let version = match get("version") {
        None => 1,
        Some(v) => match v.as_u64().filter(|n| *n > 0) {
            Some(n) => n as u32,
            None => {
                tracing::warn!(id, "bad 'version' value; defaulting to 1");
                1
            }
        },
    };

    let related_specs = get("related_specs").and_then(|v| v.as_sequence()).map(|seq| {
        seq.iter()
            .filter_map(|entry| {
                let m = entry.as_mapping()?;
                let spec_type = m
                    .get(Value::String("type".to_string()))
                    .and_then(Value::as_str)
                    .and_then(parse_related_spec_type);
                let reference = m
                    .get(Value::String("ref".to_string()))
                    .and_then(Value::as_str);
                match (spec_type, reference) {
                    (Some(spec_type), Some(reference)) => Some(RelatedSpec {
                        spec_type,
                        reference: reference.to_string(),
                    }),
                    _ => {
                        tracing::warn!(id, "malformed 'related_specs' entry skipped");
                        None
                    }
                }
            })
            .collect::<Vec<_>>()
    });

    let parent_intent = match get("parent_intent") {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            tracing::warn!(id, "malformed 'parent_intent'; ignoring");
            None
        }
    };

    let tags = match get("tags") {
        None => None,
        Some(v) => match v.as_sequence() {
            Some(seq) => Some(
                seq.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            None => {
                tracing::warn!(id, "non-array 'tags'; ignoring");
                None
            }
        },
    };

    Ok(Intent {
        id: id.to_string(),
        name: name.to_string(),
        status,
        version,
        owned_scope,
        constraints,
        acceptance_criteria,
        related_specs,
        parent_intent,
        tags,
        created_at,
        updated_at,
    })
}

fn parse_status(s: &str) -> Option<IntentStatus> {
    match s {
        "PENDING" => Some(IntentStatus::Pending),
        "IN_PROGRESS" => Some(IntentStatus::InProgress),
        "COMPLETE" => Some(IntentStatus::Complete),
        "BLOCKED" => Some(IntentStatus::Blocked),
        "ARCHIVED" => Some(IntentStatus::Archived),
        _ => None,
    }
}

fn parse_related_spec_type(s: &str) -> Option<RelatedSpecType> {
    match s {
        "speckit" => Some(RelatedSpecType::Speckit),
        "github_issue" => Some(RelatedSpecType::GithubIssue),
        "github_pr" => Some(RelatedSpecType::GithubPr),
        "constitution" => Some(RelatedSpecType::Constitution),
        "external" => Some(RelatedSpecType::External),
        _ => None,
    }
}
