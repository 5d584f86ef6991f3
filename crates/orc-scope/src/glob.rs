//! Custom glob-pattern compiler and matcher.
//!
//! Deliberately has no dependency on an external glob library (§4.1): each
//! pattern is lowered to an anchored [`regex::Regex`] by hand.
//!
//! Semantics:
//! - `**` matches any number of path segments, including zero.
//! - `**/` matches zero-or-more `segment/` groups, so `a/**/b` matches both
//!   `a/b` and `a/x/y/b`.
//! - `*` matches any run of characters excluding `/`.
//! - `?` matches exactly one character excluding `/`.
//! - All other characters match literally (regex metacharacters escaped).
//! - Paths are normalized by replacing `\` with `/` before matching.
//! - Dotfiles are matched by default; there is no opt-in flag.

use regex::Regex;
use std::fmt;

/// Error compiling a glob pattern.
#[derive(Debug, thiserror::Error)]
#[error("invalid glob pattern '{pattern}': {detail}")]
pub struct GlobError {
    pattern: String,
    detail: String,
}

/// A single compiled glob pattern.
#[derive(Clone)]
pub struct CompiledGlob {
    source: String,
    regex: Regex,
}

impl fmt::Debug for CompiledGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledGlob")
            .field("source", &self.source)
            .finish()
    }
}

impl CompiledGlob {
    /// Compile a glob pattern into an anchored matcher.
    pub fn compile(pattern: &str) -> Result<Self, GlobError> {
        let regex_src = pattern_to_regex(pattern);
        let regex = Regex::new(&regex_src).map_err(|e| GlobError {
            pattern: pattern.to_string(),
            detail: e.to_string(),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The original pattern text, before compilation.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether `rel_path` matches this pattern. The path is normalized
    /// (backslashes to forward slashes) before matching.
    #[must_use]
    pub fn is_match(&self, rel_path: &str) -> bool {
        let normalized = normalize_path(rel_path);
        self.regex.is_match(&normalized)
    }
}

/// Normalize a path for matching: backslashes become forward slashes.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Translate a glob pattern into an anchored regular expression source.
fn pattern_to_regex(pattern: &str) -> String {
    let normalized = normalize_path(pattern);
    let chars: Vec<char> = normalized.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '*' && chars.get(i + 1) == Some(&'*') {
            if chars.get(i + 2) == Some(&'/') {
                out.push_str("(?:.*/)?");
                i += 3;
            } else {
                out.push_str(".*");
                i += 2;
            }
        } else if chars[i] == '*' {
            out.push_str("[^/]*");
            i += 1;
        } else if chars[i] == '?' {
            out.push_str("[^/]");
            i += 1;
        } else {
            out.push_str(&regex::escape(&chars[i].to_string()));
            i += 1;
        }
    }
    out.push('$');
    out
}

/// Returns `true` iff at least one of `patterns` matches `rel_path`.
///
/// Each pattern is compiled fresh; callers on a hot path should precompile
/// with [`CompiledGlob::compile`] instead.
pub fn is_in_scope(rel_path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| {
        CompiledGlob::compile(p)
            .map(|g| g.is_match(rel_path))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiles(pattern: &str) -> CompiledGlob {
        CompiledGlob::compile(pattern).expect("pattern should compile")
    }

    #[test]
    fn star_does_not_cross_separators() {
        let g = compiles("*.rs");
        assert!(g.is_match("main.rs"));
        assert!(!g.is_match("src/main.rs"));
    }

    #[test]
    fn double_star_crosses_separators() {
        let g = compiles("src/**");
        assert!(g.is_match("src/lib.rs"));
        assert!(g.is_match("src/a/b/c/d.rs"));
    }

    #[test]
    fn double_star_matches_zero_segments() {
        let g = compiles("a/**/b");
        assert!(g.is_match("a/b"));
        assert!(g.is_match("a/x/b"));
        assert!(g.is_match("a/x/y/b"));
    }

    #[test]
    fn double_star_prefix_matches_any_depth() {
        let g = compiles("**/*.rs");
        assert!(g.is_match("main.rs"));
        assert!(g.is_match("src/lib.rs"));
        assert!(g.is_match("src/nested/deep/mod.rs"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        let g = compiles("file?.txt");
        assert!(g.is_match("file1.txt"));
        assert!(!g.is_match("file12.txt"));
        assert!(!g.is_match("file/.txt"));
    }

    #[test]
    fn literal_characters_are_escaped() {
        let g = compiles("src/core/hooks/X.ts");
        assert!(g.is_match("src/core/hooks/X.ts"));
        assert!(!g.is_match("srcAcoreAhooksAXsts"));
    }

    #[test]
    fn dotfiles_match_by_default() {
        let g = compiles("**/*");
        assert!(g.is_match(".env"));
        assert!(g.is_match("config/.env"));
    }

    #[test]
    fn backslashes_are_normalized() {
        let g = compiles("src/**");
        assert!(g.is_match("src\\lib.rs"));
    }

    #[test]
    fn is_in_scope_checks_any_pattern() {
        let patterns = vec!["src/core/hooks/**".to_string(), "docs/**".to_string()];
        assert!(is_in_scope("src/core/hooks/engine.ts", &patterns));
        assert!(is_in_scope("docs/readme.md", &patterns));
        assert!(!is_in_scope("src/api/client.ts", &patterns));
    }

    #[test]
    fn anchored_both_ends() {
        let g = compiles("lib.rs");
        assert!(!g.is_match("src/lib.rs"));
        assert!(!g.is_match("lib.rsx"));
        assert!(g.is_match("lib.rs"));
    }
}
