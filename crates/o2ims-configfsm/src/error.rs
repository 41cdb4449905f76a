//! Errors raised by the configuration-applied state machine.

use thiserror::Error;

use o2ims_core::O2imsError;

use crate::state::ConfigState;

/// Errors that can occur while evaluating or rehydrating the engine.
///
/// Both variants indicate a defect (corrupted persisted state or a broken
/// guard table), never a bad combination of facts. Callers surface them to
/// an operator; retrying cannot help.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigFsmError {
    /// A persisted state name is not one of the known states.
    #[error("invalid configuration state {0:?}")]
    InvalidState(String),

    /// A single evaluation kept transitioning without settling.
    #[error("configuration state cascade did not settle after {steps} transitions (last state {state})")]
    CascadeLimitExceeded {
        /// State reached when the limit was hit.
        state: ConfigState,
        /// Number of transitions taken.
        steps: usize,
    },
}

impl From<ConfigFsmError> for O2imsError {
    fn from(err: ConfigFsmError) -> Self {
        match err {
            ConfigFsmError::InvalidState(s) => O2imsError::InvalidState(s),
            other => O2imsError::InvalidState(other.to_string()),
        }
    }
}
