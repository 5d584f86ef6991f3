// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use orc_cli::commands;
use orc_config::OrcConfig;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Exit code returned when `pre-tool-use` denies the call.
const EXIT_DENIED: i32 = 1;
/// Exit code for any other runtime failure.
const EXIT_RUNTIME_ERROR: i32 = 2;

/// Host-facing command-line wiring for the intent gate hook engine.
#[derive(Parser)]
#[command(name = "orc", version, about)]
struct Cli {
    /// Workspace root to gate. Defaults to the current directory, then to
    /// `workspace_root` in `orc.toml` if set there.
    #[arg(long, global = true)]
    workspace_root: Option<PathBuf>,

    /// Session id this invocation belongs to. Required so the engine
    /// registry can separate concurrent sessions over the same workspace.
    #[arg(long, global = true)]
    session_id: String,

    /// Path to an `orc.toml` config file. Defaults to `<workspace_root>/orc.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a `preToolUse` hook call. Reads the JSON request body from
    /// stdin, writes the JSON response to stdout.
    PreToolUse,
    /// Log a `postToolUse` hook call. Reads the JSON request body from
    /// stdin. Never fails the host's dispatch loop (§4.4).
    PostToolUse,
    /// Select an intent as this session's active one (§6.5).
    SelectActiveIntent {
        /// The intent id to select.
        intent_id: String,
    },
    /// Verify an intent's acceptance criteria and mark it complete (§6.5).
    VerifyAcceptanceCriteria {
        /// The intent id to complete.
        intent_id: String,
    },
    /// Report whether the gate is active for this workspace.
    IsEnabled,
    /// Record this session's presence and list other active sessions.
    Heartbeat {
        /// The intent currently claimed by this session, if any.
        #[arg(long)]
        intent_id: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let workspace_root = cli
        .workspace_root
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let config = match orc_config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load orc.toml, using defaults");
            OrcConfig::default()
        }
    };
    let workspace_root = config.resolved_workspace_root(&workspace_root);

    let exit_code = match run(&cli.command, &workspace_root, &cli.session_id, &config) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = ?e, "orc command failed");
            EXIT_RUNTIME_ERROR
        }
    };
    std::process::exit(exit_code);
}

fn run(command: &Command, workspace_root: &std::path::Path, session_id: &str, config: &OrcConfig) -> Result<i32> {
    match command {
        Command::PreToolUse => {
            let raw = read_stdin()?;
            let response = commands::pre_tool_use(workspace_root, session_id, config, &raw);
            let allowed = response.allowed;
            println!("{}", serde_json::to_string(&response).context("serializing preToolUse response")?);
            Ok(if allowed { 0 } else { EXIT_DENIED })
        }
        Command::PostToolUse => {
            let raw = read_stdin()?;
            if let Err(e) = commands::post_tool_use(workspace_root, session_id, config, &raw) {
                tracing::warn!(error = %e, "postToolUse logging failed, continuing");
            }
            Ok(0)
        }
        Command::SelectActiveIntent { intent_id } => {
            match commands::select_active_intent(workspace_root, session_id, config, intent_id) {
                Ok(outcome) => {
                    println!("{}", outcome.context);
                    Ok(0)
                }
                Err(e) => {
                    eprintln!("{e}");
                    Ok(EXIT_RUNTIME_ERROR)
                }
            }
        }
        Command::VerifyAcceptanceCriteria { intent_id } => {
            match commands::verify_acceptance_criteria(workspace_root, session_id, config, intent_id) {
                Ok(()) => Ok(0),
                Err(e) => {
                    eprintln!("{e}");
                    Ok(EXIT_RUNTIME_ERROR)
                }
            }
        }
        Command::IsEnabled => {
            let enabled = commands::is_enabled(workspace_root, session_id, config);
            println!("{enabled}");
            Ok(0)
        }
        Command::Heartbeat { intent_id } => {
            let others = commands::heartbeat(workspace_root, session_id, intent_id.as_deref());
            for other in others {
                println!("{other}");
            }
            Ok(0)
        }
    }
}

fn read_stdin() -> Result<String> {
    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw).context("reading hook payload from stdin")?;
    Ok(raw)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orc=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}
