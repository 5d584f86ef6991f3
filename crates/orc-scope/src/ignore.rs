//! Gitignore-subset parser for `.intentignore`.
//!
//! Supported syntax:
//! - Blank lines and lines starting with `#` are skipped.
//! - A trailing `/` marks a directory prefix: the pattern is rewritten to
//!   also match everything beneath it (`**` appended).
//! - A leading `!` is accepted without a parse error, but negation is not
//!   implemented in this version: the line is still treated as an ordinary
//!   ignore pattern once the `!` is stripped.
//! - A pattern with no `/` is treated as matching the basename at any depth,
//!   mirroring gitignore's usual behavior for bare filenames.

use crate::glob::CompiledGlob;

/// Compiled `.intentignore` rule set.
#[derive(Debug, Default, Clone)]
pub struct IgnoreMatcher {
    patterns: Vec<CompiledGlob>,
}

impl IgnoreMatcher {
    /// Parse `.intentignore` contents. Lines that fail to compile as globs
    /// are skipped rather than aborting the whole file.
    #[must_use]
    pub fn parse(contents: &str) -> Self {
        let mut patterns = Vec::new();
        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix('!').unwrap_or(line);
            let mut pattern = line.to_string();
            if pattern.ends_with('/') {
                pattern.push_str("**");
            }
            if !pattern.contains('/') {
                pattern = format!("**/{pattern}");
            }
            if let Ok(glob) = CompiledGlob::compile(&pattern) {
                patterns.push(glob);
            }
        }
        Self { patterns }
    }

    /// An empty matcher: nothing is ignored.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether `rel_path` is covered by any ignore rule.
    #[must_use]
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(rel_path))
    }
}
