// Raw pod metrics records and the source that lists them
pub mod base;

use anyhow::Result;
use std::future::Future;

pub use base::{ContainerMetrics, PodMetrics, PodMetricsList};

/// Read-only access to the pod metrics of a cluster.
pub trait PodMetricsSource {
    /// Lists the metrics of every pod in every namespace with one call.
    fn list_pod_metrics(&self) -> impl Future<Output = Result<Vec<PodMetrics>>> + Send;
}
