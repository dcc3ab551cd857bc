mod client;
pub mod field_selectors;
#[cfg(test)]
pub(crate) mod fake;

use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};

pub use client::{ClientOptions, KubeCluster};
pub use field_selectors::FieldSelector;

/// Parameters to push down to the Kubernetes API
#[derive(Debug, Clone, Default)]
pub struct ApiFilters {
    /// Label selector string (e.g., "k8s-app=cilium")
    pub label_selector: Option<String>,
    /// Field selector string (e.g., "spec.nodeName=worker-1")
    pub field_selector: Option<String>,
    /// Maximum number of items to return
    pub limit: Option<u32>,
}

impl ApiFilters {
    pub fn labels(mut self, selector: &str) -> Self {
        self.label_selector = Some(selector.to_string());
        self
    }

    pub fn fields(mut self, selector: &FieldSelector) -> Self {
        self.field_selector = Some(selector.to_k8s_string());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Read access to the cluster objects needed to locate an agent
///
/// Lookups of a single object return `Ok(None)` when the API answers 404, so
/// callers can tell "does not exist" apart from every other failure.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>>;

    async fn get_node(&self, name: &str) -> Result<Option<Node>>;

    /// List pods in `namespace`, or across all namespaces when `None`
    async fn list_pods(&self, namespace: Option<&str>, filters: &ApiFilters) -> Result<Vec<Pod>>;
}
