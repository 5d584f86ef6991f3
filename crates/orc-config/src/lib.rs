// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and the shell-backed [`VcsProbe`](orc_core::VcsProbe).
//!
//! This crate provides [`OrcConfig`] — the host-supplied runtime settings for
//! a workspace — together with helpers for loading it from TOML, applying
//! environment overrides, and producing advisory [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// No VCS command was configured, so ledger entries will carry no
    /// revision id.
    MissingVcsCommand,
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingVcsCommand => {
                write!(f, "no vcs_command configured — ledger entries will omit revision ids")
            }
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Recognised log levels, matching `tracing`'s filter directives.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Default timeout applied to the shell VCS probe.
const DEFAULT_VCS_TIMEOUT_SECS: u64 = 5;

/// Top-level runtime configuration for a governed workspace.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct OrcConfig {
    /// Overrides the workspace root the host otherwise infers from the
    /// current working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<String>,

    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Whether destructive tool calls must clear a human-in-the-loop gate.
    #[serde(default = "default_true")]
    pub hitl_enabled: bool,

    /// Command and arguments used to resolve the current VCS revision id,
    /// e.g. `["git", "rev-parse", "HEAD"]`. `None` disables the probe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcs_command: Option<Vec<String>>,

    /// Timeout in seconds applied to the VCS probe subprocess.
    #[serde(default = "default_vcs_timeout_secs")]
    pub vcs_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_vcs_timeout_secs() -> u64 {
    DEFAULT_VCS_TIMEOUT_SECS
}

impl Default for OrcConfig {
    fn default() -> Self {
        Self {
            workspace_root: None,
            log_level: Some("info".into()),
            hitl_enabled: true,
            vcs_command: None,
            vcs_timeout_secs: DEFAULT_VCS_TIMEOUT_SECS,
        }
    }
}

impl OrcConfig {
    /// Resolve the configured workspace root against `cwd`, falling back to
    /// it when no override is set.
    #[must_use]
    pub fn resolved_workspace_root(&self, cwd: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(p) => PathBuf::from(p),
            None => cwd.to_path_buf(),
        }
    }

    /// Build a [`ShellVcsProbe`] from this config's `vcs_command`, if set.
    #[must_use]
    pub fn vcs_probe(&self) -> Option<ShellVcsProbe> {
        self.vcs_command.as_ref().map(|command| ShellVcsProbe {
            command: command.clone(),
            timeout: Duration::from_secs(self.vcs_timeout_secs),
        })
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load an [`OrcConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`OrcConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<OrcConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => OrcConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into an [`OrcConfig`].
pub fn parse_toml(content: &str) -> Result<OrcConfig, ConfigError> {
    toml::from_str::<OrcConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `ORC_WORKSPACE_ROOT`
/// - `ORC_LOG_LEVEL`
/// - `ORC_HITL_ENABLED` (`"true"`/`"false"`)
pub fn apply_env_overrides(config: &mut OrcConfig) {
    if let Ok(val) = std::env::var("ORC_WORKSPACE_ROOT") {
        config.workspace_root = Some(val);
    }
    if let Ok(val) = std::env::var("ORC_LOG_LEVEL") {
        config.log_level = Some(val);
    }
    if let Ok(val) = std::env::var("ORC_HITL_ENABLED") {
        if let Ok(parsed) = val.parse::<bool>() {
            config.hitl_enabled = parsed;
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (unrecognised log level, empty `vcs_command`) are returned as
/// a [`ConfigError::ValidationError`]; soft issues come back as warnings.
pub fn validate_config(config: &OrcConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(ref level) = config.log_level
        && !VALID_LOG_LEVELS.contains(&level.as_str())
    {
        errors.push(format!("invalid log_level '{level}'"));
    }

    match &config.vcs_command {
        Some(cmd) if cmd.is_empty() => {
            errors.push("vcs_command must not be an empty list".into());
        }
        Some(_) => {}
        None => warnings.push(ConfigWarning::MissingVcsCommand),
    }

    if config.vcs_timeout_secs == 0 {
        errors.push("vcs_timeout_secs must be greater than zero".into());
    }

    if config.workspace_root.is_none() {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "workspace_root".into(),
            hint: "the current working directory will be used instead".into(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Shell VCS probe
// ---------------------------------------------------------------------------

/// A [`VcsProbe`](orc_core::VcsProbe) that shells out to a configured
/// command (e.g. `git rev-parse HEAD`) to resolve the current revision id.
///
/// Failures — missing binary, non-zero exit, timeout, non-UTF-8 output — are
/// logged and reported as `None`, never propagated.
#[derive(Debug, Clone)]
pub struct ShellVcsProbe {
    command: Vec<String>,
    timeout: Duration,
}

impl ShellVcsProbe {
    /// Construct a probe directly, bypassing [`OrcConfig`].
    #[must_use]
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }
}

impl orc_core::VcsProbe for ShellVcsProbe {
    fn current_revision_id(&self) -> Option<String> {
        let Some((program, args)) = self.command.split_first() else {
            return None;
        };

        // `Command` has no built-in timeout; a background thread enforces
        // ours by racing the process against a channel deadline.
        let (tx, rx) = std::sync::mpsc::channel();
        let program = program.clone();
        let args = args.to_vec();
        std::thread::spawn(move || {
            let output = Command::new(&program).args(&args).output();
            let _ = tx.send(output);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(output)) if output.status.success() => {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            }
            Ok(Ok(output)) => {
                tracing::debug!(status = ?output.status, "vcs probe command exited non-zero");
                None
            }
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "vcs probe command failed to spawn");
                None
            }
            Err(_) => {
                tracing::debug!("vcs probe command timed out");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use orc_core::VcsProbe;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let cfg = OrcConfig::default();
        let warnings = validate_config(&cfg).expect("default config should be valid");
        assert!(warnings.contains(&ConfigWarning::MissingVcsCommand));
    }

    #[test]
    fn default_config_has_sensible_defaults() {
        let cfg = OrcConfig::default();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
        assert!(cfg.hitl_enabled);
        assert!(cfg.vcs_command.is_none());
    }

    #[test]
    fn parse_valid_toml_string() {
        let toml_str = r#"
            log_level = "debug"
            hitl_enabled = false
            vcs_command = ["git", "rev-parse", "HEAD"]
        "#;
        let cfg = parse_toml(toml_str).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert!(!cfg.hitl_enabled);
        assert_eq!(
            cfg.vcs_command.as_deref(),
            Some(&["git".to_string(), "rev-parse".to_string(), "HEAD".to_string()][..])
        );
    }

    #[test]
    fn parse_invalid_toml_gives_parse_error() {
        let err = parse_toml("this is [not valid toml =").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn validation_catches_invalid_log_level() {
        let cfg = OrcConfig {
            log_level: Some("verbose".into()),
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_empty_vcs_command() {
        let cfg = OrcConfig {
            vcs_command: Some(vec![]),
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        match err {
            ConfigError::ValidationError { reasons } => {
                assert!(reasons.iter().any(|r| r.contains("vcs_command")));
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn validation_catches_zero_timeout() {
        let cfg = OrcConfig {
            vcs_timeout_secs: 0,
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orc.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "log_level = \"warn\"\nhitl_enabled = true").unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("warn"));
    }

    #[test]
    fn load_missing_file_gives_file_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/orc.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn load_none_returns_default() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn resolved_workspace_root_falls_back_to_cwd() {
        let cfg = OrcConfig::default();
        let cwd = Path::new("/work/project");
        assert_eq!(cfg.resolved_workspace_root(cwd), PathBuf::from(cwd));
    }

    #[test]
    fn resolved_workspace_root_honors_override() {
        let cfg = OrcConfig {
            workspace_root: Some("/override".into()),
            ..Default::default()
        };
        assert_eq!(
            cfg.resolved_workspace_root(Path::new("/work")),
            PathBuf::from("/override")
        );
    }

    #[test]
    fn shell_vcs_probe_returns_trimmed_stdout() {
        let probe = ShellVcsProbe::new(
            vec!["echo".to_string(), "deadbeef".to_string()],
            Duration::from_secs(2),
        );
        assert_eq!(probe.current_revision_id(), Some("deadbeef".to_string()));
    }

    #[test]
    fn shell_vcs_probe_returns_none_for_missing_binary() {
        let probe = ShellVcsProbe::new(
            vec!["definitely-not-a-real-binary-xyz".to_string()],
            Duration::from_secs(2),
        );
        assert_eq!(probe.current_revision_id(), None);
    }

    #[test]
    fn shell_vcs_probe_returns_none_for_nonzero_exit() {
        let probe = ShellVcsProbe::new(
            vec!["false".to_string()],
            Duration::from_secs(2),
        );
        assert_eq!(probe.current_revision_id(), None);
    }

    #[test]
    fn vcs_probe_is_none_without_command() {
        let cfg = OrcConfig::default();
        assert!(cfg.vcs_probe().is_none());
    }

    #[test]
    fn vcs_probe_builds_from_config() {
        let cfg = OrcConfig {
            vcs_command: Some(vec!["git".to_string(), "rev-parse".to_string(), "HEAD".to_string()]),
            ..Default::default()
        };
        assert!(cfg.vcs_probe().is_some());
    }
}
