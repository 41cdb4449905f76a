//! # Configuration-Applied States
//!
//! The seven states of the machine. The names double as the `reason` of
//! the `ConfigurationApplied` status condition, so they are part of the
//! persisted contract and must not be renamed.
//!
//! ```text
//! Start ──▶ Missing ◀──▶ ClusterNotReady ◀──▶ InProgress ◀──▶ Completed
//!                              │               ▲    ▲
//!                              ▼               │    ▼
//!                           TimedOut ◀─────────┘  OutOfDate
//! ```
//!
//! `TimedOut` and `OutOfDate` both lead back to `InProgress`; every state
//! except `Start` may also re-enter itself.
//!
//! `Start` is a pseudo-state: the first evaluation always leaves it.

use serde::{Deserialize, Serialize};

use crate::error::ConfigFsmError;

/// Convergence state of a managed cluster's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfigState {
    /// Initial pseudo-state, never observed after an evaluation.
    Start,
    /// No configuration policy is bound to the cluster.
    Missing,
    /// Policies are bound but the cluster cannot take enforcement yet.
    ClusterNotReady,
    /// Enforcement is outstanding and the timeout window is running.
    InProgress,
    /// Every matched policy is compliant.
    Completed,
    /// Enforcement did not converge within the configured timeout.
    TimedOut,
    /// Non-compliant policies exist but none of them is enforced.
    OutOfDate,
}

impl ConfigState {
    /// Every state, in declaration order.
    pub const ALL: [ConfigState; 7] = [
        Self::Start,
        Self::Missing,
        Self::ClusterNotReady,
        Self::InProgress,
        Self::Completed,
        Self::TimedOut,
        Self::OutOfDate,
    ];

    /// Canonical state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Missing => "Missing",
            Self::ClusterNotReady => "ClusterNotReady",
            Self::InProgress => "InProgress",
            Self::Completed => "Completed",
            Self::TimedOut => "TimedOut",
            Self::OutOfDate => "OutOfDate",
        }
    }

    /// Whether the state can be observed after an evaluation.
    pub fn is_steady(&self) -> bool {
        !matches!(self, Self::Start)
    }

    /// Whether the configuration has converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Whether the timeout guard can still fire from this state.
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::ClusterNotReady | Self::InProgress)
    }
}

impl std::fmt::Display for ConfigState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ConfigState {
    type Err = ConfigFsmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.name() == s)
            .ok_or_else(|| ConfigFsmError::InvalidState(s.to_string()))
    }
}
