use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::parsing::{deserialize_window, Quantity};
use crate::types::MetricName;

/// Usage of one container as reported by the metrics API.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerMetrics {
    pub name: String,
    #[serde(default, deserialize_with = "non_negative_usage")]
    pub usage: BTreeMap<String, Quantity>,
}

/// One pod's record from the metrics API. All containers share the pod's
/// timestamp and window.
#[derive(Debug, Clone, Deserialize)]
pub struct PodMetrics {
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub timestamp: Time,
    #[serde(deserialize_with = "deserialize_window")]
    pub window: Duration,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub containers: Vec<ContainerMetrics>,
}

#[derive(Debug, Deserialize)]
pub struct PodMetricsList {
    #[serde(deserialize_with = "null_as_empty")]
    pub items: Vec<PodMetrics>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_negative_usage<'de, D>(deserializer: D) -> Result<BTreeMap<String, Quantity>, D::Error>
where
    D: Deserializer<'de>,
{
    let usage = Option::<BTreeMap<String, Quantity>>::deserialize(deserializer)?.unwrap_or_default();
    // Only tracked resources end up in a snapshot
    for resource in MetricName::TRACKED.iter().map(|m| m.resource_key()) {
        if let Some(q) = usage.get(resource).filter(|q| q.is_negative()) {
            return Err(serde::de::Error::custom(format!(
                "negative usage {}={}",
                resource, q
            )));
        }
    }
    Ok(usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pod_metrics_list_decoding() {
        let body = json!({
            "kind": "PodMetricsList",
            "apiVersion": "metrics.k8s.io/v1beta1",
            "metadata": {},
            "items": [{
                "metadata": {"name": "web-1", "namespace": "default"},
                "timestamp": "2024-05-01T12:00:00Z",
                "window": "1m0s",
                "containers": [
                    {"name": "app", "usage": {"cpu": "500m", "memory": "256Mi"}},
                    {"name": "sidecar", "usage": {"cpu": "1n"}}
                ]
            }]
        });

        let list: PodMetricsList = serde_json::from_value(body).unwrap();
        assert_eq!(list.items.len(), 1);
        let pod = &list.items[0];
        assert_eq!(pod.metadata.name.as_deref(), Some("web-1"));
        assert_eq!(pod.metadata.namespace.as_deref(), Some("default"));
        assert_eq!(pod.window, Duration::from_secs(60));
        assert_eq!(pod.containers.len(), 2);
        assert_eq!(pod.containers[0].usage["cpu"].milli_value(), 500);
        assert!(!pod.containers[1].usage.contains_key("memory"));
    }

    #[test]
    fn test_null_collections_decode_empty() {
        let list: PodMetricsList = serde_json::from_value(json!({"items": null})).unwrap();
        assert!(list.items.is_empty());

        let pod: PodMetrics = serde_json::from_value(json!({
            "metadata": {"name": "p", "namespace": "n"},
            "timestamp": "2024-05-01T12:00:00Z",
            "window": "30s",
            "containers": [{"name": "c", "usage": null}]
        }))
        .unwrap();
        assert!(pod.containers[0].usage.is_empty());
    }

    #[test]
    fn test_malformed_records_are_rejected() {
        assert!(serde_json::from_value::<PodMetricsList>(json!({})).is_err());

        let record = |window: &str, cpu: &str| {
            json!({
                "items": [{
                    "metadata": {"name": "p", "namespace": "n"},
                    "timestamp": "2024-05-01T12:00:00Z",
                    "window": window,
                    "containers": [{"name": "c", "usage": {"cpu": cpu}}]
                }]
            })
        };
        assert!(serde_json::from_value::<PodMetricsList>(record("30s", "100m")).is_ok());
        assert!(serde_json::from_value::<PodMetricsList>(record("-30s", "100m")).is_err());
        assert!(serde_json::from_value::<PodMetricsList>(record("forever", "100m")).is_err());
        assert!(serde_json::from_value::<PodMetricsList>(record("30s", "-100m")).is_err());
        assert!(serde_json::from_value::<PodMetricsList>(record("30s", "lots")).is_err());
    }

    #[test]
    fn test_negative_untracked_usage_is_accepted() {
        let container: ContainerMetrics = serde_json::from_value(json!({
            "name": "c",
            "usage": {"cpu": "100m", "example.com/delta": "-1"}
        }))
        .unwrap();
        assert_eq!(container.usage["cpu"].milli_value(), 100);
        assert!(container.usage["example.com/delta"].is_negative());

        let negative_memory = json!({"name": "c", "usage": {"memory": "-1Mi"}});
        assert!(serde_json::from_value::<ContainerMetrics>(negative_memory).is_err());
    }
}
