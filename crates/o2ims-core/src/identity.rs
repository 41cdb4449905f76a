//! # Kubernetes Name Newtypes
//!
//! Managed cluster names and namespaces are validated once at construction
//! so that state files, log fields, and status updates never carry a name
//! the API server would reject.

use serde::{Deserialize, Serialize};

use crate::error::O2imsError;

const MAX_SUBDOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Name of a managed cluster (DNS-1123 subdomain).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClusterName(String);

/// A Kubernetes namespace (DNS-1123 label).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl ClusterName {
    /// Validate and wrap a cluster name.
    pub fn new(name: impl Into<String>) -> Result<Self, O2imsError> {
        let name = name.into();
        if name.is_empty() || name.len() > MAX_SUBDOMAIN_LEN {
            return Err(O2imsError::Validation(format!(
                "cluster name must be 1-{MAX_SUBDOMAIN_LEN} characters, got {}",
                name.len()
            )));
        }
        for label in name.split('.') {
            validate_label(label).map_err(|reason| {
                O2imsError::Validation(format!("invalid cluster name {name:?}: {reason}"))
            })?;
        }
        Ok(Self(name))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Namespace {
    /// Validate and wrap a namespace.
    pub fn new(name: impl Into<String>) -> Result<Self, O2imsError> {
        let name = name.into();
        validate_label(&name).map_err(|reason| {
            O2imsError::Validation(format!("invalid namespace {name:?}: {reason}"))
        })?;
        Ok(Self(name))
    }

    /// Borrow the namespace.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_label(label: &str) -> Result<(), String> {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return Err(format!("label must be 1-{MAX_LABEL_LEN} characters"));
    }
    if !label
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err("only lowercase alphanumerics and '-' are allowed".to_string());
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err("must start and end with an alphanumeric character".to_string());
    }
    Ok(())
}

impl TryFrom<String> for ClusterName {
    type Error = O2imsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ClusterName> for String {
    fn from(name: ClusterName) -> Self {
        name.0
    }
}

impl TryFrom<String> for Namespace {
    type Error = O2imsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

impl std::fmt::Display for ClusterName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
