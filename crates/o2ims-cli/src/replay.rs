//! # Replay Subcommand
//!
//! Drives a fresh engine through a scripted sequence of ticks on a manual
//! clock. Used to reproduce field reports and to check guard changes
//! against known histories.
//!
//! ```yaml
//! timeout: 5s
//! ticks:
//!   - expect: Missing
//!   - facts: { policiesMatched: true }
//!     expect: ClusterNotReady
//!   - facts: { policiesMatched: true, clusterReady: true, nonCompliantPolicyInEnforce: true }
//!     expect: InProgress
//!   - after: 6s
//!     facts: { policiesMatched: true, clusterReady: true, nonCompliantPolicyInEnforce: true }
//!     expect: TimedOut
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;

use o2ims_configfsm::{parse_duration, ConfigState, ConfigStateEngine, FactSnapshot, TimeoutConfig};
use o2ims_core::{Clock, ManualClock, Timestamp};

/// Arguments for `o2ims replay`.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Scenario file (YAML).
    pub scenario: PathBuf,
}

/// A scripted sequence of evaluations.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Scenario {
    /// Convergence timeout; defaults to 30m.
    #[serde(default)]
    pub timeout: Option<String>,
    /// Clock reading before the first tick; defaults to now.
    #[serde(default)]
    pub start: Option<Timestamp>,
    pub ticks: Vec<Tick>,
}

/// One evaluation in a scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Tick {
    /// Time to advance the clock before evaluating.
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub facts: FactSnapshot,
    /// State the evaluation must settle in.
    #[serde(default)]
    pub expect: Option<ConfigState>,
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub at: Timestamp,
    pub path: Vec<ConfigState>,
    pub non_compliant_at: Option<Timestamp>,
    pub expected: Option<ConfigState>,
}

impl TickOutcome {
    /// The settled state.
    pub fn state(&self) -> ConfigState {
        self.path.last().copied().unwrap_or(ConfigState::Start)
    }

    /// No expectation, or the expectation was met.
    pub fn passed(&self) -> bool {
        self.expected.map_or(true, |e| e == self.state())
    }
}

impl Scenario {
    /// Parse a scenario document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("invalid scenario")
    }

    /// Run every tick against a fresh engine.
    pub fn replay(&self) -> Result<Vec<TickOutcome>> {
        let timeout = match &self.timeout {
            Some(raw) => parse_duration(raw)
                .map_err(anyhow::Error::msg)
                .context("invalid scenario timeout")?,
            None => TimeoutConfig::default().cluster_configuration,
        };
        let clock = ManualClock::new(self.start.unwrap_or_else(Timestamp::now));
        let mut engine = ConfigStateEngine::with_clock(timeout, clock.clone());

        let mut outcomes = Vec::with_capacity(self.ticks.len());
        for (i, tick) in self.ticks.iter().enumerate() {
            if let Some(raw) = &tick.after {
                let delay = parse_duration(raw)
                    .map_err(anyhow::Error::msg)
                    .with_context(|| format!("invalid delay in tick {i}"))?;
                clock.advance(delay);
            }
            let evaluation = engine
                .evaluate_detailed(tick.facts)
                .with_context(|| format!("tick {i} failed"))?;
            outcomes.push(TickOutcome {
                at: clock.now(),
                path: evaluation.path,
                non_compliant_at: evaluation.non_compliant_at,
                expected: tick.expect,
            });
        }
        Ok(outcomes)
    }
}

/// Execute the replay subcommand.
pub fn run_replay(args: &ReplayArgs) -> Result<u8> {
    let scenario = load_scenario(&args.scenario)?;
    let outcomes = scenario.replay()?;

    let mut failures = 0usize;
    for (i, outcome) in outcomes.iter().enumerate() {
        let path = outcome
            .path
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(" → ");
        let timer = outcome
            .non_compliant_at
            .map_or_else(|| "-".to_string(), |t| t.to_string());
        println!("  [{i}] {} {path} (non-compliant since {timer})", outcome.at);
        if !outcome.passed() {
            failures += 1;
            if let Some(expected) = outcome.expected {
                println!("      FAIL: expected {expected}, got {}", outcome.state());
            }
        }
    }

    if failures > 0 {
        println!("FAIL: {failures} of {} ticks did not match", outcomes.len());
        Ok(1)
    } else {
        println!("OK: {} ticks replayed", outcomes.len());
        Ok(0)
    }
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Scenario::from_yaml_str(&yaml).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMED_OUT: &str = include_str!("../scenarios/timed-out.yaml");
    const CLUSTER_FLAP: &str = include_str!("../scenarios/cluster-not-ready-timeout.yaml");
    const OUT_OF_DATE: &str = include_str!("../scenarios/out-of-date.yaml");

    #[test]
    fn bundled_scenarios_pass() {
        for yaml in [TIMED_OUT, CLUSTER_FLAP, OUT_OF_DATE] {
            let outcomes = Scenario::from_yaml_str(yaml).unwrap().replay().unwrap();
            assert!(!outcomes.is_empty());
            assert!(outcomes.iter().all(TickOutcome::passed), "{outcomes:#?}");
        }
    }

    #[test]
    fn failed_expectation_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wrong.yaml");
        std::fs::write(&path, "timeout: 5s\nticks:\n  - expect: Completed\n").unwrap();
        let args = ReplayArgs { scenario: path };
        assert_eq!(run_replay(&args).unwrap(), 1);
    }

    #[test]
    fn passing_scenario_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timed-out.yaml");
        std::fs::write(&path, TIMED_OUT).unwrap();
        let args = ReplayArgs { scenario: path };
        assert_eq!(run_replay(&args).unwrap(), 0);
    }

    #[test]
    fn delays_advance_the_clock() {
        let yaml = "start: 2026-03-02T08:00:00Z\nticks:\n  - after: 90s\n";
        let outcomes = Scenario::from_yaml_str(yaml).unwrap().replay().unwrap();
        assert_eq!(outcomes[0].at, Timestamp::parse("2026-03-02T08:01:30Z").unwrap());
        assert_eq!(outcomes[0].state(), ConfigState::Missing);
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(Scenario::from_yaml_str("ticks: []\nclock: fast\n").is_err());
        assert!(Scenario::from_yaml_str("ticks:\n  - expect: Degraded\n").is_err());
    }

    #[test]
    fn bad_delay_reports_tick() {
        let scenario = Scenario::from_yaml_str("ticks:\n  - {}\n  - after: soon\n").unwrap();
        let err = scenario.replay().unwrap_err();
        assert!(err.to_string().contains("tick 1"));
    }
}
