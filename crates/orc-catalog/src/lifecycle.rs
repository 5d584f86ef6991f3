//! Surgical, line-based YAML editing for the two lifecycle mutations.
//!
//! A full parse-modify-reserialize round trip through `serde_yaml` would
//! lose human comments and reorder fields (`serde_yaml::Value` is not
//! order- or comment-preserving once re-emitted). Since §9 requires field
//! ordering and comments to survive a lifecycle write, this module edits
//! the catalog file's text directly: it locates the target item's line
//! span by matching its `id:` line, then rewrites only the one field line
//! that changed (or appends it, if the field was absent), leaving every
//! other byte of the file untouched.

use chrono::{DateTime, Utc};
use orc_core::{IntentStatus, LifecycleError};
use regex::Regex;
use std::sync::OnceLock;

fn id_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^(?P<indent>[ \t]*)-[ \t]*id:[ \t]*"?(?P<id>[A-Za-z0-9_\-]+)"?[ \t]*$"#)
            .expect("static pattern is valid")
    })
}

struct ItemBlock {
    /// Index of the line holding `- id: ...`.
    start_line: usize,
    /// One past the last line belonging to this item.
    end_line: usize,
    /// Column at which this item's fields are indented.
    field_indent: usize,
}

fn locate_item(lines: &[&str], id: &str) -> Option<ItemBlock> {
    let pattern = id_line_pattern();
    for (idx, line) in lines.iter().enumerate() {
        let Some(caps) = pattern.captures(line) else {
            continue;
        };
        if &caps["id"] != id {
            continue;
        }
        let dash_indent = caps["indent"].len();
        let field_indent = dash_indent + 2;
        let mut end = lines.len();
        for (j, later) in lines.iter().enumerate().skip(idx + 1) {
            let later_trim = later.trim_start();
            if later_trim.is_empty() {
                continue;
            }
            let later_indent = later.len() - later_trim.len();
            if later_indent <= dash_indent {
                end = j;
                break;
            }
        }
        return Some(ItemBlock {
            start_line: idx,
            end_line: end,
            field_indent,
        });
    }
    None
}

fn set_field(lines: &mut Vec<String>, block: &ItemBlock, field: &str, value: &str) {
    let pattern = Regex::new(&format!(
        r"^[ \t]{{{}}}{}:[ \t]*.*$",
        block.field_indent,
        regex::escape(field)
    ))
    .expect("dynamic field pattern is valid");
    for idx in block.start_line..block.end_line {
        if pattern.is_match(&lines[idx]) {
            lines[idx] = format!("{}{}: {}", " ".repeat(block.field_indent), field, value);
            return;
        }
    }
    let insert_at = block.end_line;
    lines.insert(
        insert_at,
        format!("{}{}: {}", " ".repeat(block.field_indent), field, value),
    );
}

fn get_field<'a>(lines: &'a [String], block: &ItemBlock, field: &str) -> Option<&'a str> {
    let prefix = format!("{}{}:", " ".repeat(block.field_indent), field);
    for line in &lines[block.start_line..block.end_line] {
        if let Some(rest) = line.strip_prefix(&prefix) {
            return Some(rest.trim());
        }
    }
    None
}

fn status_from_raw(raw: &str) -> Option<IntentStatus> {
    let cleaned = raw.trim_matches('"');
    match cleaned {
        "PENDING" => Some(IntentStatus::Pending),
        "IN_PROGRESS" => Some(IntentStatus::InProgress),
        "COMPLETE" => Some(IntentStatus::Complete),
        "BLOCKED" => Some(IntentStatus::Blocked),
        "ARCHIVED" => Some(IntentStatus::Archived),
        _ => None,
    }
}

fn status_to_raw(status: IntentStatus) -> &'static str {
    match status {
        IntentStatus::Pending => "PENDING",
        IntentStatus::InProgress => "IN_PROGRESS",
        IntentStatus::Complete => "COMPLETE",
        IntentStatus::Blocked => "BLOCKED",
        IntentStatus::Archived => "ARCHIVED",
    }
}

/// Transition `id` to `target`, rewriting `contents` in place.
///
/// Fails with [`LifecycleError::IllegalTransition`] if the transition is
/// not in the allowed set, or [`LifecycleError::NotFound`] if `id` is not
/// present. On success, returns the rewritten file contents; the caller is
/// responsible for persisting them and invalidating the loader cache.
pub fn transition_intent(
    contents: &str,
    id: &str,
    target: IntentStatus,
    now: DateTime<Utc>,
) -> Result<String, LifecycleError> {
    let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();
    let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();
    let block = locate_item(&borrowed, id).ok_or_else(|| LifecycleError::NotFound(id.to_string()))?;

    let current_raw = get_field(&lines, &block, "status").unwrap_or("");
    let current = status_from_raw(current_raw).ok_or_else(|| LifecycleError::NotFound(id.to_string()))?;

    if !current.can_transition_to(target) {
        return Err(LifecycleError::IllegalTransition {
            intent_id: id.to_string(),
            from: current,
            to: target,
        });
    }

    set_field(&mut lines, &block, "status", status_to_raw(target));
    let refreshed = ItemBlock {
        start_line: block.start_line,
        end_line: block.end_line + 1,
        field_indent: block.field_indent,
    };
    set_field(&mut lines, &refreshed, "updated_at", &format!("\"{}\"", now.to_rfc3339()));

    Ok(join_preserving_trailing_newline(contents, &lines))
}

/// Overwrite an arbitrary field on intent `id`, updating `updated_at`
/// alongside it.
pub fn update_intent_field(
    contents: &str,
    id: &str,
    field: &str,
    value: &str,
    now: DateTime<Utc>,
) -> Result<String, LifecycleError> {
    let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();
    let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();
    let block = locate_item(&borrowed, id).ok_or_else(|| LifecycleError::NotFound(id.to_string()))?;

    set_field(&mut lines, &block, field, value);
    let refreshed = ItemBlock {
        start_line: block.start_line,
        end_line: block.end_line + 1,
        field_indent: block.field_indent,
    };
    set_field(&mut lines, &refreshed, "updated_at", &format!("\"{}\"", now.to_rfc3339()));

    Ok(join_preserving_trailing_newline(contents, &lines))
}

fn join_preserving_trailing_newline(original: &str, lines: &[String]) -> String {
    let mut out = lines.join("\n");
    if original.ends_with('\n') {
        out.push('\n');
    }
    out
}
