//! # Configuration-Applied Engine
//!
//! Decides, from a [`FactSnapshot`] and the passage of time, whether a
//! managed cluster's policy configuration has converged.
//!
//! ## Evaluation
//!
//! An evaluation re-enters the current state. Each state's entry action
//! may adjust the convergence timer and then checks its guards in a fixed
//! order; the first guard that holds names the next state, which is
//! entered in turn. The cascade stops when a state re-enters itself.
//! Guards per state:
//!
//! | state           | entry action          | guards, first match wins                                                     |
//! |-----------------|-----------------------|------------------------------------------------------------------------------|
//! | Start           |                       | always → Missing                                                             |
//! | Missing         | reset timer           | matched → ClusterNotReady                                                    |
//! | ClusterNotReady |                       | !matched → Missing; timed out → TimedOut; ready → InProgress                 |
//! | InProgress      | timer update rule     | !matched ∨ !ready → ClusterNotReady; timed out → TimedOut; abandoned → OutOfDate; compliant → Completed |
//! | OutOfDate       | reset timer           | !matched ∨ !ready ∨ enforcing → InProgress                                   |
//! | Completed       | reset timer           | !matched ∨ !ready ∨ (enforcing ∧ !compliant) → InProgress                    |
//! | TimedOut        |                       | !matched ∨ abandoned ∨ compliant → InProgress                                |
//!
//! "Abandoned" means not compliant and no non-compliant policy enforced.
//! The timer update rule restarts the window on entry to `InProgress`
//! when it is unset, when everything is compliant, or when the cluster is
//! abandoned, so the timeout only measures an uninterrupted enforcing
//! stretch.
//!
//! The clock is read once per evaluation; every guard in a cascade sees
//! the same instant.
//!
//! ## Concurrency
//!
//! An engine is a plain value owned by one caller. Evaluations take
//! `&mut self`, so the borrow checker enforces the single-writer rule;
//! engines for different clusters share nothing and may run in parallel.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use o2ims_core::{Clock, SystemClock, Timestamp};

use crate::error::ConfigFsmError;
use crate::facts::{FactProvider, FactSnapshot};
use crate::graph::TRANSITIONS;
use crate::state::ConfigState;
use crate::timer::ConvergenceTimer;

/// Name of the counter incremented on every transition.
pub const TRANSITIONS_METRIC: &str = "o2ims_configfsm_transitions_total";

/// Persisted form of an engine: everything needed to resume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    /// Current state.
    pub state: ConfigState,
    /// Start of the open non-compliance window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_compliant_at: Option<Timestamp>,
}

impl EngineStatus {
    /// Build a status from a persisted state name, e.g. a condition reason.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigFsmError::InvalidState`] for an unknown name.
    pub fn parse(state: &str, non_compliant_at: Option<Timestamp>) -> Result<Self, ConfigFsmError> {
        Ok(Self {
            state: state.parse()?,
            non_compliant_at,
        })
    }
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self {
            state: ConfigState::Start,
            non_compliant_at: None,
        }
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// State the cascade settled in.
    pub state: ConfigState,
    /// States entered, starting with the state held before the call.
    pub path: Vec<ConfigState>,
    /// Timer value after the evaluation.
    pub non_compliant_at: Option<Timestamp>,
    /// The instant every guard was evaluated against.
    pub evaluated_at: Timestamp,
}

impl Evaluation {
    /// Number of transitions taken, self-transitions excluded.
    pub fn transitions(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Whether the state changed.
    pub fn changed(&self) -> bool {
        self.transitions() > 0
    }
}

/// The configuration-applied state machine for one managed cluster.
#[derive(Debug, Clone)]
pub struct ConfigStateEngine<C: Clock = SystemClock> {
    state: ConfigState,
    timer: ConvergenceTimer,
    clock: C,
}

impl ConfigStateEngine<SystemClock> {
    /// A new engine at `Start` reading the wall clock.
    pub fn new(timeout: Duration) -> Self {
        Self::with_clock(timeout, SystemClock)
    }
}

impl<C: Clock> ConfigStateEngine<C> {
    /// A new engine at `Start` reading `clock`.
    pub fn with_clock(timeout: Duration, clock: C) -> Self {
        Self {
            state: ConfigState::Start,
            timer: ConvergenceTimer::new(timeout),
            clock,
        }
    }

    /// Resume an engine from its persisted status.
    pub fn restore(status: EngineStatus, timeout: Duration, clock: C) -> Self {
        Self {
            state: status.state,
            timer: ConvergenceTimer::with_start(timeout, status.non_compliant_at),
            clock,
        }
    }

    /// Current state.
    pub fn current_state(&self) -> ConfigState {
        self.state
    }

    /// Start of the open non-compliance window, if any.
    pub fn non_compliant_at(&self) -> Option<Timestamp> {
        self.timer.non_compliant_at()
    }

    /// The configured convergence timeout.
    pub fn timeout(&self) -> Duration {
        self.timer.timeout()
    }

    /// Snapshot for persistence.
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state,
            non_compliant_at: self.timer.non_compliant_at(),
        }
    }

    /// Time left before the timeout guard can fire.
    ///
    /// Only meaningful while waiting (`ClusterNotReady`, `InProgress`) with
    /// an open window; `None` otherwise.
    pub fn requeue_after(&self) -> Option<Duration> {
        if !self.state.is_waiting() {
            return None;
        }
        self.timer.remaining(self.clock.now())
    }

    /// Evaluate `facts` and return the state the engine settled in.
    pub fn evaluate(&mut self, facts: FactSnapshot) -> Result<ConfigState, ConfigFsmError> {
        self.evaluate_detailed(facts).map(|evaluation| evaluation.state)
    }

    /// Evaluate the facts produced by `provider`.
    pub fn evaluate_from<P: FactProvider + ?Sized>(
        &mut self,
        provider: &P,
    ) -> Result<ConfigState, ConfigFsmError> {
        self.evaluate(provider.facts())
    }

    /// Evaluate `facts`, reporting every state entered on the way.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigFsmError::CascadeLimitExceeded`] if the cascade does
    /// not settle within one pass over the transition table.
    pub fn evaluate_detailed(&mut self, facts: FactSnapshot) -> Result<Evaluation, ConfigFsmError> {
        let now = self.clock.now();
        let mut path = vec![self.state];

        loop {
            let current = self.state;
            let next = self.enter(current, &facts, now);
            if next == current {
                break;
            }
            if path.len() > TRANSITIONS.len() {
                return Err(ConfigFsmError::CascadeLimitExceeded {
                    state: next,
                    steps: path.len(),
                });
            }
            tracing::debug!(from = %current, to = %next, "configuration state transition");
            metrics::counter!(TRANSITIONS_METRIC, "from" => current.name(), "to" => next.name())
                .increment(1);
            self.state = next;
            path.push(next);
        }

        Ok(Evaluation {
            state: self.state,
            path,
            non_compliant_at: self.timer.non_compliant_at(),
            evaluated_at: now,
        })
    }

    /// Run the entry action of `state` and pick the next state.
    ///
    /// Returning `state` itself is a self-transition and ends the cascade.
    pub(crate) fn enter(
        &mut self,
        state: ConfigState,
        facts: &FactSnapshot,
        now: Timestamp,
    ) -> ConfigState {
        use ConfigState::*;

        match state {
            Start => Missing,
            Missing => {
                self.timer.reset();
                if facts.policies_matched {
                    ClusterNotReady
                } else {
                    Missing
                }
            }
            ClusterNotReady => {
                if !facts.policies_matched {
                    Missing
                } else if self.timer.is_timed_out(now) {
                    TimedOut
                } else if facts.cluster_ready {
                    InProgress
                } else {
                    ClusterNotReady
                }
            }
            InProgress => {
                if self.timer.is_reset() || facts.all_policies_compliant || facts.is_abandoned() {
                    tracing::trace!(non_compliant_at = %now, "convergence timer started");
                    self.timer.start(now);
                }
                if !facts.policies_matched || !facts.cluster_ready {
                    ClusterNotReady
                } else if self.timer.is_timed_out(now) {
                    TimedOut
                } else if facts.is_abandoned() {
                    OutOfDate
                } else if facts.all_policies_compliant {
                    Completed
                } else {
                    InProgress
                }
            }
            OutOfDate => {
                self.timer.reset();
                if !facts.policies_matched
                    || !facts.cluster_ready
                    || facts.non_compliant_policy_in_enforce
                {
                    InProgress
                } else {
                    OutOfDate
                }
            }
            Completed => {
                self.timer.reset();
                if !facts.policies_matched
                    || !facts.cluster_ready
                    || (facts.non_compliant_policy_in_enforce && !facts.all_policies_compliant)
                {
                    InProgress
                } else {
                    Completed
                }
            }
            TimedOut => {
                if !facts.policies_matched || facts.is_abandoned() || facts.all_policies_compliant {
                    InProgress
                } else {
                    TimedOut
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use o2ims_core::ManualClock;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn clock() -> ManualClock {
        ManualClock::new(Timestamp::parse("2026-01-15T12:00:00Z").unwrap())
    }

    fn facts(matched: bool, ready: bool, compliant: bool, enforcing: bool) -> FactSnapshot {
        FactSnapshot {
            policies_matched: matched,
            cluster_ready: ready,
            all_policies_compliant: compliant,
            non_compliant_policy_in_enforce: enforcing,
        }
    }

    fn in_progress(clock: &ManualClock) -> ConfigStateEngine<ManualClock> {
        let mut engine = ConfigStateEngine::with_clock(TIMEOUT, clock.clone());
        engine.evaluate(FactSnapshot::enforcing()).unwrap();
        assert_eq!(engine.current_state(), ConfigState::InProgress);
        engine
    }

    #[test]
    fn test_new_engine_starts_at_start() {
        let engine = ConfigStateEngine::new(TIMEOUT);
        assert_eq!(engine.current_state(), ConfigState::Start);
        assert_eq!(engine.non_compliant_at(), None);
        assert_eq!(engine.timeout(), TIMEOUT);
    }

    #[test]
    fn test_no_policies_settles_in_missing_from_start() {
        let mut engine = ConfigStateEngine::with_clock(TIMEOUT, clock());
        let state = engine.evaluate(FactSnapshot::default()).unwrap();
        assert_eq!(state, ConfigState::Missing);
    }

    #[test]
    fn test_enforcing_opens_timer_at_evaluation_instant() {
        let clock = clock();
        let engine = in_progress(&clock);
        assert_eq!(engine.non_compliant_at(), Some(clock.now()));
    }

    #[test]
    fn test_in_progress_keeps_window_while_enforcing() {
        let clock = clock();
        let mut engine = in_progress(&clock);
        let opened = engine.non_compliant_at();
        clock.advance(Duration::from_secs(3));
        engine.evaluate(FactSnapshot::enforcing()).unwrap();
        assert_eq!(engine.current_state(), ConfigState::InProgress);
        assert_eq!(engine.non_compliant_at(), opened);
    }

    #[test]
    fn test_times_out_only_after_timeout() {
        let clock = clock();
        let mut engine = in_progress(&clock);
        clock.advance(TIMEOUT);
        assert_eq!(
            engine.evaluate(FactSnapshot::enforcing()).unwrap(),
            ConfigState::InProgress
        );
        clock.advance(Duration::from_millis(1));
        assert_eq!(
            engine.evaluate(FactSnapshot::enforcing()).unwrap(),
            ConfigState::TimedOut
        );
    }

    #[test]
    fn test_completed_resets_timer() {
        let clock = clock();
        let mut engine = in_progress(&clock);
        let state = engine.evaluate(FactSnapshot::converged()).unwrap();
        assert_eq!(state, ConfigState::Completed);
        assert_eq!(engine.non_compliant_at(), None);
    }

    #[test]
    fn test_cluster_not_ready_keeps_window_running() {
        let clock = clock();
        let mut engine = in_progress(&clock);
        let opened = engine.non_compliant_at();
        let state = engine.evaluate(facts(true, false, false, true)).unwrap();
        assert_eq!(state, ConfigState::ClusterNotReady);
        assert_eq!(engine.non_compliant_at(), opened);
    }

    #[test]
    fn test_evaluate_detailed_reports_cascade() {
        let mut engine = ConfigStateEngine::with_clock(TIMEOUT, clock());
        let evaluation = engine.evaluate_detailed(FactSnapshot::converged()).unwrap();
        assert_eq!(
            evaluation.path,
            vec![
                ConfigState::Start,
                ConfigState::Missing,
                ConfigState::ClusterNotReady,
                ConfigState::InProgress,
                ConfigState::Completed,
            ]
        );
        assert_eq!(evaluation.transitions(), 4);
        assert!(evaluation.changed());
        assert_eq!(evaluation.non_compliant_at, None);
    }

    #[test]
    fn test_self_transition_reports_no_change() {
        let mut engine = ConfigStateEngine::with_clock(TIMEOUT, clock());
        engine.evaluate(FactSnapshot::default()).unwrap();
        let evaluation = engine.evaluate_detailed(FactSnapshot::default()).unwrap();
        assert_eq!(evaluation.path, vec![ConfigState::Missing]);
        assert!(!evaluation.changed());
    }

    #[test]
    fn test_status_round_trip_resumes_timer() {
        let clock = clock();
        let engine = in_progress(&clock);
        let json = serde_json::to_string(&engine.status()).unwrap();
        let status: EngineStatus = serde_json::from_str(&json).unwrap();

        let mut resumed = ConfigStateEngine::restore(status, TIMEOUT, clock.clone());
        assert_eq!(resumed.current_state(), ConfigState::InProgress);
        clock.advance(Duration::from_secs(6));
        assert_eq!(
            resumed.evaluate(FactSnapshot::enforcing()).unwrap(),
            ConfigState::TimedOut
        );
    }

    #[test]
    fn test_status_parse_rejects_unknown_state() {
        let err = EngineStatus::parse("Degraded", None).unwrap_err();
        assert_eq!(err, ConfigFsmError::InvalidState("Degraded".to_string()));
        assert!(serde_json::from_str::<EngineStatus>(r#"{"state":"Degraded"}"#).is_err());
    }

    #[test]
    fn test_status_omits_unset_timer() {
        let json = serde_json::to_string(&EngineStatus::default()).unwrap();
        assert_eq!(json, r#"{"state":"Start"}"#);
    }

    #[test]
    fn test_requeue_after_counts_down() {
        let clock = clock();
        let engine = in_progress(&clock);
        assert_eq!(engine.requeue_after(), Some(TIMEOUT));
        clock.advance(Duration::from_secs(2));
        assert_eq!(engine.requeue_after(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_requeue_after_none_when_settled() {
        let clock = clock();
        let mut engine = in_progress(&clock);
        engine.evaluate(FactSnapshot::converged()).unwrap();
        assert_eq!(engine.requeue_after(), None);
    }

    #[test]
    fn test_evaluate_from_policy_facts() {
        use crate::facts::{ComplianceState, PolicyDetails, PolicyFacts, RemediationAction};

        let provider = PolicyFacts::new(
            vec![PolicyDetails {
                policy_name: "v1-sriov".to_string(),
                policy_namespace: "ztp-sno".to_string(),
                compliant: ComplianceState::Compliant,
                remediation_action: RemediationAction::Enforce,
            }],
            true,
        );
        let mut engine = ConfigStateEngine::with_clock(TIMEOUT, clock());
        assert_eq!(engine.evaluate_from(&provider).unwrap(), ConfigState::Completed);
    }

    #[test]
    fn test_zero_timeout_does_not_fire_in_opening_tick() {
        let clock = clock();
        let mut engine = ConfigStateEngine::with_clock(Duration::ZERO, clock.clone());
        assert_eq!(
            engine.evaluate(FactSnapshot::enforcing()).unwrap(),
            ConfigState::InProgress
        );
        clock.advance(Duration::from_nanos(1));
        assert_eq!(
            engine.evaluate(FactSnapshot::enforcing()).unwrap(),
            ConfigState::TimedOut
        );
    }
}
