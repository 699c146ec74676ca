use std::collections::BTreeMap;

use crate::metrics::{ContainerMetrics, PodMetrics};
use crate::parsing::Quantity;
use crate::types::{ContainerId, ContainerMetricsSnapshot, MetricName, PodId, ResourceAmount};

/// One snapshot per container of `pod_metrics`, in reporting order.
pub fn create_container_metrics_snapshots(pod_metrics: &PodMetrics) -> Vec<ContainerMetricsSnapshot> {
    let pod_id = PodId::new(
        pod_metrics.metadata.namespace.clone().unwrap_or_default(),
        pod_metrics.metadata.name.clone().unwrap_or_default(),
    );
    pod_metrics
        .containers
        .iter()
        .map(|container| new_container_metrics_snapshot(container, pod_metrics, &pod_id))
        .collect()
}

fn new_container_metrics_snapshot(
    container: &ContainerMetrics,
    pod_metrics: &PodMetrics,
    pod_id: &PodId,
) -> ContainerMetricsSnapshot {
    ContainerMetricsSnapshot::new(
        ContainerId::new(pod_id.clone(), container.name.as_str()),
        calculate_usage(&container.usage),
        pod_metrics.timestamp.0,
        pod_metrics.window,
    )
}

/// Converts a container's reported usage to canonical units. Tracked kinds
/// that were not reported are zero; unknown resource keys are ignored.
pub fn calculate_usage(usage: &BTreeMap<String, Quantity>) -> BTreeMap<MetricName, ResourceAmount> {
    MetricName::TRACKED
        .into_iter()
        .map(|metric| {
            let amount = usage
                .get(metric.resource_key())
                .map(|q| canonical_amount(metric, q))
                .unwrap_or(ResourceAmount::ZERO);
            (metric, amount)
        })
        .collect()
}

fn canonical_amount(metric: MetricName, q: &Quantity) -> ResourceAmount {
    match metric {
        MetricName::Cpu => ResourceAmount::new(q.milli_value()),
        MetricName::Memory => ResourceAmount::new(q.value()),
    }
}
