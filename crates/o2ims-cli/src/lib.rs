//! # o2ims-cli — Configuration-Applied State Machine Tooling
//!
//! Provides the `o2ims` command-line interface for operating the
//! configuration-applied state machine outside a controller: stepping a
//! cluster by hand, inspecting its persisted status, publishing the state
//! diagram, and replaying recorded histories.
//!
//! ## Subcommands
//!
//! - `o2ims evaluate` — One evaluation tick against a cluster's state file.
//! - `o2ims status` — Persisted state, condition and remaining time.
//! - `o2ims graph` — Transition diagram as Graphviz or markdown.
//! - `o2ims replay` — Scripted ticks on a manual clock.
//!
//! ```bash
//! o2ims evaluate --cluster sno-1 --policies-matched --cluster-ready --enforcing --timeout 40m
//! o2ims status --cluster sno-1
//! o2ims graph --format markdown --output docs/dev/config_fsm.md
//! o2ims replay crates/o2ims-cli/scenarios/timed-out.yaml
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in the `*Args` types; handlers return an exit
//!   code and leave process setup to `main`.
//! - State transitions are decided by `o2ims-configfsm` only.

pub mod evaluate;
pub mod graph;
pub mod replay;
pub mod status;
pub mod store;
