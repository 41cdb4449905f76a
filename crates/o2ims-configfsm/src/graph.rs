//! # Transition Table and Diagram
//!
//! Static list of every edge the engine may take, used to bound cascades
//! and to render the state diagram published with the operator docs.

use std::fmt::Write as _;

use crate::state::ConfigState;
use crate::state::ConfigState as S;

/// One permitted edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Source state.
    pub from: ConfigState,
    /// Target state.
    pub to: ConfigState,
    /// Guard that selects this edge.
    pub guard: &'static str,
}

const fn edge(from: ConfigState, to: ConfigState, guard: &'static str) -> Transition {
    Transition { from, to, guard }
}

/// Every edge of the machine, self-transitions included.
pub const TRANSITIONS: &[Transition] = &[
    edge(S::Start, S::Missing, "always"),
    edge(S::Missing, S::ClusterNotReady, "policies matched"),
    edge(S::Missing, S::Missing, "no policies"),
    edge(S::ClusterNotReady, S::Missing, "no policies"),
    edge(S::ClusterNotReady, S::TimedOut, "timed out"),
    edge(S::ClusterNotReady, S::InProgress, "cluster ready"),
    edge(S::ClusterNotReady, S::ClusterNotReady, "cluster not ready"),
    edge(S::InProgress, S::ClusterNotReady, "no policies or cluster not ready"),
    edge(S::InProgress, S::TimedOut, "timed out"),
    edge(S::InProgress, S::OutOfDate, "non-compliant, none enforced"),
    edge(S::InProgress, S::Completed, "all compliant"),
    edge(S::InProgress, S::InProgress, "enforcing"),
    edge(S::OutOfDate, S::InProgress, "no policies, cluster not ready or enforcing"),
    edge(S::OutOfDate, S::OutOfDate, "non-compliant, none enforced"),
    edge(S::Completed, S::InProgress, "no policies, cluster not ready or enforcing non-compliant"),
    edge(S::Completed, S::Completed, "all compliant"),
    edge(S::TimedOut, S::InProgress, "no policies, all compliant or none enforced"),
    edge(S::TimedOut, S::TimedOut, "enforcing"),
];

/// Whether `from → to` is a permitted edge.
pub fn is_permitted(from: ConfigState, to: ConfigState) -> bool {
    TRANSITIONS.iter().any(|t| t.from == from && t.to == to)
}

/// Render the machine as a Graphviz digraph.
pub fn to_dot() -> String {
    let mut out = String::from("digraph {\n\tcompound=true;\n\tnode [shape=Mrecord];\n\trankdir=\"LR\";\n\n");
    for state in ConfigState::ALL {
        let _ = writeln!(out, "\t{state} [label=\"{state}\"];");
    }
    out.push('\n');
    for t in TRANSITIONS {
        let _ = writeln!(out, "\t{} -> {} [label=\"{}\"];", t.from, t.to, t.guard);
    }
    out.push_str("\tinit [label=\"\", shape=point];\n\tinit -> Start\n}\n");
    out
}

/// Render the diagram inside a short markdown page.
pub fn to_markdown() -> String {
    format!(
        "# Configuration applied state machine\n\n\
         The state diagram of the configuration-applied state machine, in dot format.\n\n\
         ```dot\n{}```\n\n\
         Entry actions and guard order are documented on `ConfigStateEngine`.\n",
        to_dot()
    )
}
