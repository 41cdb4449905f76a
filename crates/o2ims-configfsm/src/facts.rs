//! # Evaluation Facts
//!
//! The engine never inspects policies or clusters itself. Each evaluation
//! is fed a [`FactSnapshot`]: four booleans computed by the caller from the
//! policy and managed-cluster objects it watches.
//!
//! [`PolicyFacts`] performs that reduction for callers that already hold
//! the per-policy status list recorded on a provisioning request.

use serde::{Deserialize, Serialize};

/// The external facts one evaluation is based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FactSnapshot {
    /// At least one configuration policy is bound to the cluster.
    pub policies_matched: bool,
    /// The managed cluster accepts policy enforcement.
    pub cluster_ready: bool,
    /// Every matched policy reports compliant.
    pub all_policies_compliant: bool,
    /// At least one non-compliant policy has remediation action `enforce`.
    pub non_compliant_policy_in_enforce: bool,
}

impl FactSnapshot {
    /// Policies are matched, the cluster is ready and nothing is left to do.
    pub fn converged() -> Self {
        Self {
            policies_matched: true,
            cluster_ready: true,
            all_policies_compliant: true,
            non_compliant_policy_in_enforce: false,
        }
    }

    /// Policies are matched, the cluster is ready and enforcement is running.
    pub fn enforcing() -> Self {
        Self {
            policies_matched: true,
            cluster_ready: true,
            all_policies_compliant: false,
            non_compliant_policy_in_enforce: true,
        }
    }

    /// Non-compliant, but nothing is being enforced.
    pub(crate) fn is_abandoned(&self) -> bool {
        !self.non_compliant_policy_in_enforce && !self.all_policies_compliant
    }
}

/// Anything that can produce a [`FactSnapshot`] for the current tick.
pub trait FactProvider {
    /// Facts for this evaluation.
    fn facts(&self) -> FactSnapshot;
}

impl FactProvider for FactSnapshot {
    fn facts(&self) -> FactSnapshot {
        *self
    }
}

// ─── Policies ────────────────────────────────────────────────────────

/// Compliance state reported by a policy.
///
/// Unrecognised strings collapse into [`ComplianceState::Unknown`], which
/// serializes as the empty string: the original text is not preserved.
/// Only the compliant/non-compliant split feeds the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComplianceState {
    /// The policy's templates all match the cluster.
    Compliant,
    /// At least one template does not match.
    NonCompliant,
    /// The policy has not been evaluated yet.
    Pending,
    /// No or unrecognised compliance state.
    #[default]
    Unknown,
}

impl ComplianceState {
    /// Canonical name as written by the policy framework.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Compliant => "Compliant",
            Self::NonCompliant => "NonCompliant",
            Self::Pending => "Pending",
            Self::Unknown => "",
        }
    }
}

impl From<String> for ComplianceState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Compliant" => Self::Compliant,
            "NonCompliant" => Self::NonCompliant,
            "Pending" => Self::Pending,
            _ => Self::Unknown,
        }
    }
}

impl From<ComplianceState> for String {
    fn from(state: ComplianceState) -> Self {
        state.name().to_string()
    }
}

/// Remediation action configured on a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RemediationAction {
    /// Report violations only.
    Inform,
    /// Apply the policy's templates.
    Enforce,
}

impl RemediationAction {
    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Inform => "inform",
            Self::Enforce => "enforce",
        }
    }
}

impl std::str::FromStr for RemediationAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("inform") {
            Ok(Self::Inform)
        } else if s.eq_ignore_ascii_case("enforce") {
            Ok(Self::Enforce)
        } else {
            Err(format!("unknown remediation action {s:?}"))
        }
    }
}

impl TryFrom<String> for RemediationAction {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RemediationAction> for String {
    fn from(action: RemediationAction) -> Self {
        action.name().to_string()
    }
}

/// Status of one policy matched to the managed cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDetails {
    /// Name of the parent policy.
    pub policy_name: String,
    /// Namespace of the parent policy.
    pub policy_namespace: String,
    /// Reported compliance.
    #[serde(default)]
    pub compliant: ComplianceState,
    /// Configured remediation action.
    pub remediation_action: RemediationAction,
}

impl PolicyDetails {
    /// Whether this policy is non-compliant and still being enforced.
    pub fn is_non_compliant_in_enforce(&self) -> bool {
        self.compliant != ComplianceState::Compliant
            && self.remediation_action == RemediationAction::Enforce
    }
}

/// Facts derived from the policies matched to a cluster plus its readiness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyFacts {
    /// Policies matched to the cluster.
    pub policies: Vec<PolicyDetails>,
    /// The cluster accepts policy enforcement.
    pub cluster_ready: bool,
}

impl PolicyFacts {
    /// Build from a policy list and the cluster's readiness.
    pub fn new(policies: Vec<PolicyDetails>, cluster_ready: bool) -> Self {
        Self {
            policies,
            cluster_ready,
        }
    }

    /// Every policy is compliant. True for an empty list.
    pub fn all_policies_compliant(&self) -> bool {
        self.policies
            .iter()
            .all(|p| p.compliant == ComplianceState::Compliant)
    }

    /// Every policy is in `inform`. True for an empty list.
    pub fn all_policies_in_inform(&self) -> bool {
        self.policies
            .iter()
            .all(|p| p.remediation_action == RemediationAction::Inform)
    }
}

impl FactProvider for PolicyFacts {
    fn facts(&self) -> FactSnapshot {
        FactSnapshot {
            policies_matched: !self.policies.is_empty(),
            cluster_ready: self.cluster_ready,
            all_policies_compliant: self.all_policies_compliant(),
            non_compliant_policy_in_enforce: self
                .policies
                .iter()
                .any(PolicyDetails::is_non_compliant_in_enforce),
        }
    }
}
