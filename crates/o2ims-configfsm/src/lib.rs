#![deny(missing_docs)]
//! # o2ims-configfsm — Configuration-Applied State Machine
//!
//! Tracks whether the policy-based configuration of a managed cluster has
//! converged, and reports the result as the `ConfigurationApplied`
//! condition of a provisioning request.
//!
//! ## Components
//!
//! - **State** (`state.rs`): the seven states, `Start` through `OutOfDate`.
//!
//! - **Facts** (`facts.rs`): the four booleans an evaluation is based on,
//!   and their derivation from per-policy compliance.
//!
//! - **Timer** (`timer.rs`): start of the current non-compliance window and
//!   the convergence timeout.
//!
//! - **Engine** (`engine.rs`): cascading evaluation of the guards. One
//!   engine per cluster, driven by repeated external ticks.
//!
//! - **Graph** (`graph.rs`): the static transition table and its Graphviz
//!   rendering.
//!
//! - **Condition** (`condition.rs`): status condition and requeue decision
//!   for a settled state.
//!
//! - **Config** (`config.rs`): convergence timeout loaded from the
//!   policy-template defaults ConfigMap.
//!
//! ## Design
//!
//! States are a closed enum and the guards are one exhaustive `match`, so
//! adding a state without deciding its guards does not compile. The engine
//! performs no I/O: facts come in as values, time comes from an injected
//! [`o2ims_core::Clock`], and the persisted form is [`EngineStatus`].

pub mod condition;
pub mod config;
pub mod engine;
pub mod error;
pub mod facts;
pub mod graph;
pub mod state;
pub mod timer;

// ─── Engine re-exports ──────────────────────────────────────────────

pub use engine::{ConfigStateEngine, EngineStatus, Evaluation, TRANSITIONS_METRIC};
pub use error::ConfigFsmError;
pub use state::ConfigState;
pub use timer::ConvergenceTimer;

// ─── Facts re-exports ───────────────────────────────────────────────

pub use facts::{
    ComplianceState, FactProvider, FactSnapshot, PolicyDetails, PolicyFacts, RemediationAction,
};

// ─── Reporting re-exports ───────────────────────────────────────────

pub use condition::{should_requeue, Condition, ConditionStatus, CONFIGURATION_APPLIED};
pub use graph::{is_permitted, to_dot, to_markdown, Transition, TRANSITIONS};

// ─── Configuration re-exports ───────────────────────────────────────

pub use config::{
    parse_duration, ConfigError, TimeoutConfig, CLUSTER_CONFIGURATION_TIMEOUT_KEY,
    DEFAULT_CLUSTER_CONFIGURATION_TIMEOUT,
};
