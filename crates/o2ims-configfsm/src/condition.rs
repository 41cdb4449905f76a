//! # ConfigurationApplied Condition
//!
//! Translates an engine state into the status condition written on the
//! provisioning request, and decides whether the caller should come back
//! for another evaluation.

use serde::{Deserialize, Serialize};

use crate::facts::PolicyFacts;
use crate::state::ConfigState;

/// Condition type written on the provisioning request.
pub const CONFIGURATION_APPLIED: &str = "ConfigurationApplied";

/// Status of a Kubernetes-style condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    /// The condition holds.
    True,
    /// The condition does not hold.
    False,
    /// The condition could not be determined.
    Unknown,
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// A `ConfigurationApplied` condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Always [`CONFIGURATION_APPLIED`].
    #[serde(rename = "type")]
    pub condition_type: String,
    /// Whether the configuration is applied.
    pub status: ConditionStatus,
    /// The state name.
    pub reason: String,
    /// Human-readable detail for the state.
    pub message: String,
}

impl Condition {
    /// The condition reporting `state`, or `None` for `Start`.
    pub fn for_state(state: ConfigState) -> Option<Self> {
        let (status, message) = match state {
            ConfigState::Start => return None,
            ConfigState::Missing => (ConditionStatus::True, "No configuration present"),
            ConfigState::Completed => (ConditionStatus::True, "The configuration is up to date"),
            ConfigState::ClusterNotReady => (ConditionStatus::False, "The Cluster is not yet ready"),
            ConfigState::InProgress => (
                ConditionStatus::False,
                "The configuration is still being applied",
            ),
            ConfigState::TimedOut => (
                ConditionStatus::False,
                "The configuration is still being applied, but it timed out",
            ),
            ConfigState::OutOfDate => (ConditionStatus::False, "The configuration is out of date"),
        };
        Some(Self {
            condition_type: CONFIGURATION_APPLIED.to_string(),
            status,
            reason: state.name().to_string(),
            message: message.to_string(),
        })
    }
}

/// Whether the caller should evaluate again later.
///
/// Requeue while enforcement is still outstanding: something is not
/// compliant, at least one policy is enforced, and the window has not
/// already timed out.
pub fn should_requeue(policies: &PolicyFacts, state: ConfigState) -> bool {
    !policies.all_policies_compliant()
        && !policies.all_policies_in_inform()
        && state != ConfigState::TimedOut
}
