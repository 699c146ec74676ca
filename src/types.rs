use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Settings for the production metrics source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    /// Version of the `metrics.k8s.io` API group to query.
    pub api_version: String,
    /// Read timeout applied to the Kubernetes client. `None` disables it.
    pub request_timeout: Option<Duration>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_version: "v1beta1".to_string(),
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Identifies a pod within a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PodId {
    pub namespace: String,
    pub pod_name: String,
}

impl PodId {
    pub fn new(namespace: impl Into<String>, pod_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            pod_name: pod_name.into(),
        }
    }
}

impl fmt::Display for PodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.pod_name)
    }
}

/// Identifies a container within a pod.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContainerId {
    pub pod_id: PodId,
    pub container_name: String,
}

impl ContainerId {
    pub fn new(pod_id: PodId, container_name: impl Into<String>) -> Self {
        Self {
            pod_id,
            container_name: container_name.into(),
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pod_id, self.container_name)
    }
}

/// Kind of resource tracked in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum MetricName {
    Cpu,
    Memory,
}

impl MetricName {
    /// Every kind present in a snapshot's usage map.
    pub const TRACKED: [MetricName; 2] = [MetricName::Cpu, MetricName::Memory];

    /// Key of this resource in a Kubernetes resource list.
    pub fn resource_key(self) -> &'static str {
        match self {
            MetricName::Cpu => "cpu",
            MetricName::Memory => "memory",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_key())
    }
}

/// Usage in the canonical unit of its resource: millicores for CPU, bytes
/// for memory. Never negative.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceAmount(i64);

impl ResourceAmount {
    pub const ZERO: ResourceAmount = ResourceAmount(0);

    /// Negative values saturate to zero.
    pub fn new(value: i64) -> Self {
        Self(value.max(0))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<ResourceAmount> for i64 {
    fn from(amount: ResourceAmount) -> Self {
        amount.0
    }
}

/// Resource usage of one container at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerMetricsSnapshot {
    id: ContainerId,
    usage: BTreeMap<MetricName, ResourceAmount>,
    snapshot_time: DateTime<Utc>,
    snapshot_window: Duration,
}

impl ContainerMetricsSnapshot {
    /// Tracked kinds missing from `usage` are recorded as zero.
    pub fn new(
        id: ContainerId,
        mut usage: BTreeMap<MetricName, ResourceAmount>,
        snapshot_time: DateTime<Utc>,
        snapshot_window: Duration,
    ) -> Self {
        for metric in MetricName::TRACKED {
            usage.entry(metric).or_insert(ResourceAmount::ZERO);
        }
        Self {
            id,
            usage,
            snapshot_time,
            snapshot_window,
        }
    }

    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    pub fn usage(&self) -> &BTreeMap<MetricName, ResourceAmount> {
        &self.usage
    }

    pub fn snapshot_time(&self) -> DateTime<Utc> {
        self.snapshot_time
    }

    /// Zero when the source reported an instantaneous sample.
    pub fn snapshot_window(&self) -> Duration {
        self.snapshot_window
    }

    pub fn cpu(&self) -> ResourceAmount {
        self.amount(MetricName::Cpu)
    }

    pub fn memory(&self) -> ResourceAmount {
        self.amount(MetricName::Memory)
    }

    fn amount(&self, metric: MetricName) -> ResourceAmount {
        self.usage.get(&metric).copied().unwrap_or_default()
    }
}
