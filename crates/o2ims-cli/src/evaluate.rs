//! # Evaluate Subcommand
//!
//! Runs one evaluation tick for a cluster against its persisted state and
//! writes the result back. Facts come either from individual flags or from
//! a YAML list of policy statuses.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use o2ims_configfsm::{
    parse_duration, should_requeue, Condition, ConfigStateEngine, FactProvider, FactSnapshot,
    PolicyDetails, PolicyFacts, TimeoutConfig,
};
use o2ims_core::{Clock, ClusterName, Namespace, SystemClock};

use crate::store::{self, format_duration, ClusterRecord};

/// Arguments for `o2ims evaluate`.
#[derive(Args, Debug, Default)]
pub struct EvaluateArgs {
    /// Managed cluster name.
    #[arg(long)]
    pub cluster: String,

    /// At least one policy is bound to the cluster.
    #[arg(long)]
    pub policies_matched: bool,

    /// The cluster accepts policy enforcement.
    #[arg(long)]
    pub cluster_ready: bool,

    /// Every matched policy is compliant.
    #[arg(long)]
    pub all_compliant: bool,

    /// A non-compliant policy is being enforced.
    #[arg(long)]
    pub enforcing: bool,

    /// YAML list of policy statuses; replaces the policy flags.
    #[arg(long, conflicts_with_all = ["policies_matched", "all_compliant", "enforcing"])]
    pub policies: Option<PathBuf>,

    /// Convergence timeout (Go duration syntax, e.g. "40m").
    #[arg(long)]
    pub timeout: Option<String>,

    /// ConfigMap manifest holding `clusterConfigurationTimeout`.
    #[arg(long, conflicts_with = "timeout")]
    pub timeout_config: Option<PathBuf>,
}

/// Execute the evaluate subcommand.
pub fn run_evaluate(args: &EvaluateArgs, state_dir: &Path) -> Result<u8> {
    cmd_evaluate(args, state_dir, &SystemClock)
}

fn cmd_evaluate<C: Clock>(args: &EvaluateArgs, state_dir: &Path, clock: C) -> Result<u8> {
    let cluster = ClusterName::new(args.cluster.as_str()).context("invalid --cluster")?;
    let existing = store::load(state_dir, &cluster)?;
    let timeout = resolve_timeout(args, existing.as_ref())?;
    let mut record = existing.unwrap_or_else(|| ClusterRecord::new(cluster.clone(), timeout));

    let policies = match &args.policies {
        Some(path) => Some(load_policies(path, args.cluster_ready)?),
        None => None,
    };
    let facts = match &policies {
        Some(policies) => policies.facts(),
        None => FactSnapshot {
            policies_matched: args.policies_matched,
            cluster_ready: args.cluster_ready,
            all_policies_compliant: args.all_compliant,
            non_compliant_policy_in_enforce: args.enforcing,
        },
    };

    let mut engine = ConfigStateEngine::restore(record.status, timeout, clock);
    let evaluation = engine.evaluate_detailed(facts)?;
    tracing::info!(
        cluster = %cluster,
        state = %evaluation.state,
        transitions = evaluation.transitions(),
        "cluster evaluated"
    );

    record.status = engine.status();
    record.timeout = format_duration(timeout);
    record.updated_at = evaluation.evaluated_at;
    store::save(state_dir, &record)?;

    let path = evaluation
        .path
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(" → ");
    println!("OK: cluster {cluster} evaluated {path}");
    if let Some(condition) = Condition::for_state(evaluation.state) {
        println!(
            "  Condition: {}={} ({}): {}",
            condition.condition_type, condition.status, condition.reason, condition.message
        );
    }
    let requeue = policies
        .as_ref()
        .map_or(true, |p| should_requeue(p, evaluation.state));
    if let Some(after) = engine.requeue_after().filter(|_| requeue) {
        println!("  Requeue after: {}", format_duration(after));
    }

    Ok(0)
}

/// `--timeout`, then `--timeout-config`, then the persisted timeout, then
/// the default. A zero `--timeout` selects the default, as a zero
/// `clusterConfigurationTimeout` does.
fn resolve_timeout(args: &EvaluateArgs, existing: Option<&ClusterRecord>) -> Result<Duration> {
    if let Some(raw) = &args.timeout {
        let timeout = parse_duration(raw)
            .map_err(anyhow::Error::msg)
            .context("invalid --timeout")?;
        if timeout.is_zero() {
            return Ok(TimeoutConfig::default().cluster_configuration);
        }
        return Ok(timeout);
    }
    if let Some(path) = &args.timeout_config {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = TimeoutConfig::from_yaml_str(&yaml)
            .with_context(|| format!("invalid timeout config {}", path.display()))?;
        return Ok(config.cluster_configuration);
    }
    match existing {
        Some(record) => record.timeout(),
        None => Ok(TimeoutConfig::default().cluster_configuration),
    }
}

fn load_policies(path: &Path, cluster_ready: bool) -> Result<PolicyFacts> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let policies: Vec<PolicyDetails> = serde_yaml::from_str(&yaml)
        .with_context(|| format!("invalid policy list {}", path.display()))?;
    for policy in &policies {
        Namespace::new(policy.policy_namespace.as_str())
            .with_context(|| format!("policy {} has an invalid namespace", policy.policy_name))?;
    }
    Ok(PolicyFacts::new(policies, cluster_ready))
}
