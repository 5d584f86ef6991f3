// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Abstract human-in-the-loop approval gate for destructive tool calls
//! (§4.7). The core does not specify a UI; [`DefaultHitlGate`] delegates
//! to a host-provided [`HostConfirmation`] capability.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

static GATE_ENABLED: AtomicBool = AtomicBool::new(true);

/// Enable or disable HITL gating globally. Intended for test determinism:
/// disabling makes every request auto-approve.
pub fn set_enabled(enabled: bool) {
    GATE_ENABLED.store(enabled, Ordering::SeqCst);
}

/// Whether HITL gating is currently enabled.
#[must_use]
pub fn is_enabled() -> bool {
    GATE_ENABLED.load(Ordering::SeqCst)
}

/// A pending approval request for a destructive tool call.
#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    /// The tool being invoked.
    pub tool_name: String,
    /// The active intent, if any.
    pub intent_id: Option<String>,
    /// The affected path, if the call names one.
    pub file_path: Option<String>,
    /// Free-text description shown to the approver.
    pub description: Option<String>,
}

/// The outcome of an approval request.
#[derive(Debug, Clone)]
pub struct ApprovalResponse {
    /// Whether the call was approved.
    pub approved: bool,
    /// Reason for denial, surfaced to the assistant as the pre-hook's
    /// rejection message.
    pub reason: Option<String>,
}

impl ApprovalResponse {
    /// Build an approved response.
    #[must_use]
    pub fn approved() -> Self {
        Self {
            approved: true,
            reason: None,
        }
    }

    /// Build a denied response carrying `reason`.
    #[must_use]
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: Some(reason.into()),
        }
    }
}

/// Human-in-the-loop approval capability consumed by the hook engine.
pub trait HitlGate: Send + Sync {
    /// Request approval for a destructive call. When gating is globally
    /// disabled via [`set_enabled`], implementations should auto-approve.
    fn request_approval(&self, request: &ApprovalRequest) -> ApprovalResponse;
}

/// A modal confirmation mechanism the host provides; implementation-free
/// by design, same as the other collaborator capabilities in `orc_core`.
pub trait HostConfirmation: Send + Sync {
    /// Present `title`/`message` to the operator and return their choice.
    fn confirm(&self, title: &str, message: &str) -> bool;
}

/// Default [`HitlGate`] implementation: checks the global enabled flag,
/// then delegates to a host-provided [`HostConfirmation`].
pub struct DefaultHitlGate {
    host: Arc<dyn HostConfirmation>,
}

impl DefaultHitlGate {
    /// Build a gate delegating to `host`.
    #[must_use]
    pub fn new(host: Arc<dyn HostConfirmation>) -> Self {
        Self { host }
    }
}

impl HitlGate for DefaultHitlGate {
    fn request_approval(&self, request: &ApprovalRequest) -> ApprovalResponse {
        if !is_enabled() {
            return ApprovalResponse::approved();
        }
        let title = format!("Approve {}?", request.tool_name);
        let message = request
            .description
            .clone()
            .unwrap_or_else(|| format!("Tool '{}' requires human approval", request.tool_name));
        if self.host.confirm(&title, &message) {
            ApprovalResponse::approved()
        } else {
            ApprovalResponse::denied(format!("Human approver rejected '{}'", request.tool_name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedHost {
        approve: bool,
    }

    impl HostConfirmation for FixedHost {
        fn confirm(&self, _title: &str, _message: &str) -> bool {
            self.approve
        }
    }

    static TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn disabled_gate_auto_approves() {
        let _guard = TEST_LOCK.lock().unwrap();
        set_enabled(false);
        let gate = DefaultHitlGate::new(Arc::new(FixedHost { approve: false }));
        let response = gate.request_approval(&ApprovalRequest {
            tool_name: "execute_command".to_string(),
            intent_id: Some("INT-001".to_string()),
            file_path: None,
            description: None,
        });
        assert!(response.approved);
        set_enabled(true);
    }

    #[test]
    fn enabled_gate_delegates_to_host_approval() {
        let _guard = TEST_LOCK.lock().unwrap();
        set_enabled(true);
        let gate = DefaultHitlGate::new(Arc::new(FixedHost { approve: true }));
        let response = gate.request_approval(&ApprovalRequest {
            tool_name: "execute_command".to_string(),
            intent_id: None,
            file_path: None,
            description: None,
        });
        assert!(response.approved);
    }

    #[test]
    fn enabled_gate_surfaces_rejection_reason() {
        let _guard = TEST_LOCK.lock().unwrap();
        set_enabled(true);
        let gate = DefaultHitlGate::new(Arc::new(FixedHost { approve: false }));
        let response = gate.request_approval(&ApprovalRequest {
            tool_name: "delete_file".to_string(),
            intent_id: None,
            file_path: Some("src/x.rs".to_string()),
            description: None,
        });
        assert!(!response.approved);
        assert!(response.reason.unwrap().contains("delete_file"));
    }
}
