//! # Status Subcommand
//!
//! Shows the persisted state of a cluster without evaluating it.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;

use o2ims_configfsm::{Condition, ConfigStateEngine};
use o2ims_core::{ClusterName, SystemClock};

use crate::store::{self, format_duration};

/// Arguments for `o2ims status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Managed cluster name.
    #[arg(long)]
    pub cluster: String,
}

/// Execute the status subcommand.
pub fn run_status(args: &StatusArgs, state_dir: &Path) -> Result<u8> {
    let cluster = ClusterName::new(args.cluster.as_str()).context("invalid --cluster")?;
    let Some(record) = store::load(state_dir, &cluster)? else {
        bail!("cluster not found: {cluster}");
    };
    let timeout = record.timeout()?;
    let engine = ConfigStateEngine::restore(record.status, timeout, SystemClock);

    println!("Cluster: {cluster}");
    println!("  State: {}", record.status.state);
    if let Some(condition) = Condition::for_state(record.status.state) {
        println!("  Condition: {} ({})", condition.status, condition.message);
    }
    match record.status.non_compliant_at {
        Some(at) => println!("  Non-compliant since: {at}"),
        None => println!("  Non-compliant since: -"),
    }
    println!("  Timeout: {}", record.timeout);
    if let Some(remaining) = engine.requeue_after() {
        println!("  Remaining: {}", format_duration(remaining));
    }
    println!("  Updated: {}", record.updated_at);

    Ok(0)
}
