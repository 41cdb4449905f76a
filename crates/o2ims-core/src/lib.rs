#![deny(missing_docs)]
//! # o2ims-core — Foundational Types for the O2 IMS Operators
//!
//! Leaf crate of the workspace. It defines the primitives that the
//! configuration-applied state machine and its tooling share: a single
//! error hierarchy, UTC-only timestamps, an injectable clock, and
//! validated Kubernetes identifiers.
//!
//! ## Key Design Principles
//!
//! 1. **UTC-only timestamps.** `Timestamp` never carries a local offset.
//!    Rendered strings use the `metav1.Time` layout (`YYYY-MM-DDTHH:MM:SSZ`)
//!    so they can be written straight into custom resource status fields.
//!
//! 2. **Time is injected.** Anything that compares against "now" takes a
//!    [`Clock`]. Production code uses [`SystemClock`]; tests and replays use
//!    [`ManualClock`].
//!
//! 3. **Newtype wrappers for Kubernetes names.** `ClusterName` and
//!    `Namespace` are validated at construction. No bare strings for
//!    object names.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `o2ims-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod clock;
pub mod error;
pub mod identity;
pub mod temporal;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::O2imsError;
pub use identity::{ClusterName, Namespace};
pub use temporal::Timestamp;
