//! # Cluster State Files
//!
//! Each managed cluster's engine status lives in
//! `<state-dir>/<cluster>.json`, alongside the timeout it was last
//! evaluated with.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use o2ims_configfsm::{parse_duration, EngineStatus};
use o2ims_core::{ClusterName, Timestamp};

/// Persisted record for one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRecord {
    pub cluster: ClusterName,
    #[serde(flatten)]
    pub status: EngineStatus,
    /// Convergence timeout in Go duration syntax.
    pub timeout: String,
    pub updated_at: Timestamp,
}

impl ClusterRecord {
    /// A fresh record at `Start`.
    pub fn new(cluster: ClusterName, timeout: Duration) -> Self {
        Self {
            cluster,
            status: EngineStatus::default(),
            timeout: format_duration(timeout),
            updated_at: Timestamp::now(),
        }
    }

    /// The persisted timeout.
    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(&self.timeout)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid timeout in state file for {}", self.cluster))
    }
}

/// Path of the state file for `cluster`.
pub fn state_file(state_dir: &Path, cluster: &ClusterName) -> PathBuf {
    state_dir.join(format!("{cluster}.json"))
}

/// Load the record for `cluster`, if one was written.
pub fn load(state_dir: &Path, cluster: &ClusterName) -> Result<Option<ClusterRecord>> {
    let path = state_file(state_dir, cluster);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let record: ClusterRecord = serde_json::from_str(&content)
        .with_context(|| format!("corrupt state file {}", path.display()))?;
    Ok(Some(record))
}

/// Write `record`, creating the state directory if needed.
pub fn save(state_dir: &Path, record: &ClusterRecord) -> Result<()> {
    std::fs::create_dir_all(state_dir).context("failed to create state directory")?;
    let path = state_file(state_dir, &record.cluster);
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), state = %record.status.state, "state file written");
    Ok(())
}

/// Render a duration in Go syntax, e.g. `1h30m0s` or `2.5s`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let nanos = d.subsec_nanos();
    let (h, m, s) = (secs / 3600, (secs / 60) % 60, secs % 60);

    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{h}h"));
    }
    if h > 0 || m > 0 {
        out.push_str(&format!("{m}m"));
    }
    if nanos == 0 {
        out.push_str(&format!("{s}s"));
    } else {
        let frac = format!("{nanos:09}");
        out.push_str(&format!("{s}.{}s", frac.trim_end_matches('0')));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use o2ims_configfsm::ConfigState;

    fn cluster() -> ClusterName {
        ClusterName::new("sno-ran-du-1").unwrap()
    }

    #[test]
    fn load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path(), &cluster()).unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("configfsm");
        let mut record = ClusterRecord::new(cluster(), Duration::from_secs(300));
        record.status = EngineStatus {
            state: ConfigState::InProgress,
            non_compliant_at: Some(Timestamp::parse("2026-03-02T08:00:00Z").unwrap()),
        };
        save(&state_dir, &record).unwrap();

        let loaded = load(&state_dir, &cluster()).unwrap().unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.timeout().unwrap(), Duration::from_secs(300));
    }

    #[test]
    fn state_file_uses_camel_case_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = ClusterRecord::new(cluster(), Duration::from_secs(5));
        record.status.non_compliant_at = Some(Timestamp::parse("2026-03-02T08:00:00Z").unwrap());
        save(dir.path(), &record).unwrap();

        let raw = std::fs::read_to_string(state_file(dir.path(), &cluster())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["cluster"], "sno-ran-du-1");
        assert_eq!(value["state"], "Start");
        assert!(value.get("nonCompliantAt").is_some());
        assert_eq!(value["timeout"], "5s");
    }

    #[test]
    fn corrupt_state_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(state_file(dir.path(), &cluster()), b"{\"state\":\"Degraded\"}").unwrap();
        let err = load(dir.path(), &cluster()).unwrap_err();
        assert!(err.to_string().contains("corrupt state file"));
    }

    #[test]
    fn format_duration_is_go_syntax() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_secs(1800)), "30m0s");
        assert_eq!(format_duration(Duration::from_secs(5400)), "1h30m0s");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        for d in [Duration::from_secs(3725), Duration::from_millis(1250)] {
            assert_eq!(parse_duration(&format_duration(d)), Ok(d));
        }
    }
}
