// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Small, shared markdown manipulation helpers used by the spatial index,
//! session coordinator, and lesson recorder. None of these files are
//! expected to be large; the helpers favor simplicity over streaming.

use chrono::{DateTime, Utc};

/// A located `##`-level heading and the span of its section body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    /// Byte offset where the heading line starts.
    pub heading_start: usize,
    /// Byte offset just past the heading line's trailing newline.
    pub body_start: usize,
    /// Byte offset where the section body ends (start of the next `## `
    /// heading, or end of the string).
    pub body_end: usize,
}

impl Section {
    /// The section's content, from just after the heading line to the next
    /// top-level heading or end of file.
    #[must_use]
    pub fn body<'a>(&self, contents: &'a str) -> &'a str {
        &contents[self.body_start..self.body_end]
    }
}

/// Find a `## `-level heading whose text (after the prefix) satisfies
/// `predicate`. Only the first match is returned.
pub fn find_section(contents: &str, predicate: impl Fn(&str) -> bool) -> Option<Section> {
    find_heading_section(contents, "## ", predicate)
}

/// Find a `### `-level heading within `contents` (typically a section
/// body) whose text satisfies `predicate`.
pub fn find_subsection(contents: &str, predicate: impl Fn(&str) -> bool) -> Option<Section> {
    find_heading_section(contents, "### ", predicate)
}

fn find_heading_section(
    contents: &str,
    marker: &str,
    predicate: impl Fn(&str) -> bool,
) -> Option<Section> {
    let mut offset = 0usize;
    let mut heading_start = None;
    let mut body_start = 0usize;
    for line in contents.split_inclusive('\n') {
        let trimmed = line.trim_end_matches('\n').trim_end_matches('\r');
        if heading_start.is_none() {
            if let Some(rest) = trimmed.strip_prefix(marker) {
                if predicate(rest.trim()) {
                    heading_start = Some(offset);
                    body_start = offset + line.len();
                }
            }
        } else if trimmed.starts_with(marker) {
            return Some(Section {
                heading_start: heading_start.unwrap(),
                body_start,
                body_end: offset,
            });
        }
        offset += line.len();
    }
    heading_start.map(|start| Section {
        heading_start: start,
        body_start,
        body_end: contents.len(),
    })
}

/// Whether any line within `haystack` contains `needle` as a substring.
#[must_use]
pub fn any_line_contains(haystack: &str, needle: &str) -> bool {
    haystack.lines().any(|l| l.contains(needle))
}

/// Insert `insertion` into `contents` just before a trailing horizontal
/// rule (`---`) or italicized footer line (a line starting and ending with
/// `_`), scanning from the end. If no such marker is found, append at the
/// end of the string (adding a leading newline if `contents` is non-empty
/// and does not already end with one).
#[must_use]
pub fn insert_before_footer(contents: &str, insertion: &str) -> String {
    let lines: Vec<&str> = contents.split_inclusive('\n').collect();
    let mut footer_line_index = None;
    for (idx, line) in lines.iter().enumerate().rev() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "---" || (trimmed.starts_with('_') && trimmed.ends_with('_')) {
            footer_line_index = Some(idx);
        }
        break;
    }
    match footer_line_index {
        Some(idx) => {
            let mut out = String::new();
            for line in &lines[..idx] {
                out.push_str(line);
            }
            out.push_str(insertion);
            for line in &lines[idx..] {
                out.push_str(line);
            }
            out
        }
        None => {
            let mut out = contents.to_string();
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(insertion);
            out
        }
    }
}

/// Insert `insertion` immediately before the next `## `-level heading found
/// at or after `from`, or at the end of the string if none remains.
#[must_use]
pub fn insert_before_next_top_heading(contents: &str, from: usize, insertion: &str) -> String {
    let tail = &contents[from..];
    let mut search_offset = from;
    for line in tail.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']).starts_with("## ") {
            let mut out = String::with_capacity(contents.len() + insertion.len());
            out.push_str(&contents[..search_offset]);
            out.push_str(insertion);
            out.push_str(&contents[search_offset..]);
            return out;
        }
        search_offset += line.len();
    }
    let mut out = contents.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(insertion);
    out
}

/// Parse a markdown pipe table into rows of trimmed cell text, skipping
/// the header row and the `---` separator row.
#[must_use]
pub fn parse_table_rows(block: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut seen_separator = false;
    for line in block.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with('|') {
            continue;
        }
        let cells: Vec<String> = trimmed
            .trim_matches('|')
            .split('|')
            .map(|c| c.trim().to_string())
            .collect();
        if !seen_separator {
            if cells.iter().all(|c| c.chars().all(|ch| ch == '-' || ch == ':')) {
                seen_separator = true;
            }
            continue;
        }
        rows.push(cells);
    }
    rows
}

/// Format a timestamp as `YYYY-MM-DD`, the date form used in dated section
/// entries.
#[must_use]
pub fn format_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}
