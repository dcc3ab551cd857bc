//! In-memory cluster for unit tests
//!
//! Records every call so tests can assert which lookups happened.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod, PodSpec};
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{ApiFilters, ClusterApi, field_selectors::POD_NODE_NAME};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetPod { namespace: String, name: String },
    GetNode { name: String },
    ListPods { namespace: Option<String> },
}

#[derive(Default)]
pub struct FakeCluster {
    pods: Vec<Pod>,
    nodes: Vec<Node>,
    fail_get_pod: bool,
    fail_get_node: bool,
    fail_list: bool,
    calls: Mutex<Vec<Call>>,
}

pub fn pod(namespace: &str, name: &str, node: Option<&str>, labels: &[(&str, &str)]) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(
                labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
            ),
            ..Default::default()
        },
        spec: Some(PodSpec {
            node_name: node.map(String::from),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn agent(namespace: &str, name: &str, node: &str) -> Pod {
    pod(namespace, name, Some(node), &[("k8s-app", "cilium")])
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pod(mut self, pod: Pod) -> Self {
        self.pods.push(pod);
        self
    }

    pub fn with_node(mut self, name: &str) -> Self {
        self.nodes.push(Node {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        });
        self
    }

    pub fn failing_get_pod(mut self) -> Self {
        self.fail_get_pod = true;
        self
    }

    pub fn failing_get_node(mut self) -> Self {
        self.fail_get_node = true;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// Supports the `key=value[,key=value]` label selectors used by the crate
    fn matches_labels(pod: &Pod, selector: &str) -> bool {
        let labels = pod.metadata.labels.clone().unwrap_or_default();
        selector.split(',').all(|term| match term.split_once('=') {
            Some((key, value)) => labels.get(key.trim()).map(String::as_str) == Some(value.trim()),
            None => labels.contains_key(term.trim()),
        })
    }

    fn matches_fields(pod: &Pod, selector: &str) -> bool {
        selector.split(',').all(|term| match term.split_once('=') {
            Some((POD_NODE_NAME, value)) => {
                pod.spec.as_ref().and_then(|s| s.node_name.as_deref()) == Some(value)
            }
            _ => false,
        })
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>> {
        self.record(Call::GetPod {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        if self.fail_get_pod {
            return Err(anyhow!("pods is forbidden"));
        }
        Ok(self
            .pods
            .iter()
            .find(|p| {
                p.metadata.namespace.as_deref() == Some(namespace)
                    && p.metadata.name.as_deref() == Some(name)
            })
            .cloned())
    }

    async fn get_node(&self, name: &str) -> Result<Option<Node>> {
        self.record(Call::GetNode {
            name: name.to_string(),
        });
        if self.fail_get_node {
            return Err(anyhow!("nodes is forbidden"));
        }
        Ok(self
            .nodes
            .iter()
            .find(|n| n.metadata.name.as_deref() == Some(name))
            .cloned())
    }

    async fn list_pods(&self, namespace: Option<&str>, filters: &ApiFilters) -> Result<Vec<Pod>> {
        self.record(Call::ListPods {
            namespace: namespace.map(String::from),
        });
        if self.fail_list {
            return Err(anyhow!("connection refused"));
        }
        let items = self
            .pods
            .iter()
            .filter(|p| namespace.is_none() || p.metadata.namespace.as_deref() == namespace)
            .filter(|p| {
                filters
                    .label_selector
                    .as_deref()
                    .is_none_or(|s| Self::matches_labels(p, s))
            })
            .filter(|p| {
                filters
                    .field_selector
                    .as_deref()
                    .is_none_or(|s| Self::matches_fields(p, s))
            })
            .take(filters.limit.map_or(usize::MAX, |l| l as usize))
            .cloned()
            .collect();
        Ok(items)
    }
}
