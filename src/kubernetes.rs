use anyhow::{anyhow, Context, Result};
use http::Request as HttpRequest;
use kube::Client;
use tracing::debug;

use crate::metrics::{PodMetrics, PodMetricsList, PodMetricsSource};
use crate::types::SourceConfig;

pub const METRICS_API_GROUP: &str = "metrics.k8s.io";

/// Lists pod metrics from the Kubernetes resource metrics API across all
/// namespaces.
#[derive(Clone)]
pub struct KubeMetricsSource {
    client: Client,
    path: String,
}

impl KubeMetricsSource {
    pub fn new(client: Client) -> Self {
        Self::with_api_version(client, &SourceConfig::default().api_version)
    }

    pub fn with_api_version(client: Client, api_version: &str) -> Self {
        let path = format!("/apis/{}/{}/pods", METRICS_API_GROUP, api_version);
        Self { client, path }
    }

    /// Builds a client from the ambient kubeconfig or in-cluster service
    /// account, with the configured read timeout.
    pub async fn from_config(cfg: &SourceConfig) -> Result<Self> {
        let mut kube_config = kube::Config::infer()
            .await
            .context("infer Kubernetes client configuration")?;
        kube_config.read_timeout = cfg.request_timeout;
        let client = Client::try_from(kube_config).context("build Kubernetes client")?;
        Ok(Self::with_api_version(client, &cfg.api_version))
    }

    /// Request path of the cluster-wide listing.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl PodMetricsSource for KubeMetricsSource {
    async fn list_pod_metrics(&self) -> Result<Vec<PodMetrics>> {
        let req = HttpRequest::builder()
            .method("GET")
            .uri(self.path.as_str())
            .body(Vec::new())
            .map_err(|e| anyhow!("build request: {}", e))?;
        debug!("listing pod metrics from {}", self.path);
        let list: PodMetricsList = self.client.request(req).await?;
        Ok(list.items)
    }
}
