use tracing::debug;

use crate::error::FetchError;
use crate::metrics::PodMetricsSource;
use crate::types::ContainerMetricsSnapshot;

mod snapshot;

pub use snapshot::{calculate_usage, create_container_metrics_snapshots};

/// Fetches resource usage of every running container in the cluster.
///
/// Holds no state besides the source, so one client can serve concurrent
/// callers as long as the source allows it.
pub struct MetricsClient<S> {
    source: S,
}

impl<S: PodMetricsSource> MetricsClient<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// One snapshot per container reported by the source, across all
    /// namespaces. Ordering follows the source listing and carries no meaning.
    ///
    /// Any failure of the listing call fails the whole fetch.
    pub async fn get_containers_metrics(&self) -> Result<Vec<ContainerMetricsSnapshot>, FetchError> {
        let pod_metrics = self
            .source
            .list_pod_metrics()
            .await
            .map_err(FetchError::SourceUnavailable)?;
        debug!("{} pod metrics retrieved for all namespaces", pod_metrics.len());

        Ok(pod_metrics
            .iter()
            .flat_map(create_container_metrics_snapshots)
            .collect())
    }
}
