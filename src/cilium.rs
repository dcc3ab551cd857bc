// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Lookups of Cilium agent pods

use tracing::debug;

use crate::error::{Error, Result};
use crate::kubernetes::{ApiFilters, ClusterApi, FieldSelector};

/// Find the namespace the Cilium agents run in
///
/// Lists a single pod matching `selector` across all namespaces and returns
/// its namespace.
pub async fn discover_namespace<C: ClusterApi + ?Sized>(cluster: &C, selector: &str) -> Result<String> {
    let filters = ApiFilters::default().labels(selector).limit(1);
    let pods = cluster
        .list_pods(None, &filters)
        .await
        .map_err(|e| Error::cluster_access("list Cilium pods in all namespaces", e))?;

    let namespace = pods
        .into_iter()
        .find_map(|p| p.metadata.namespace)
        .ok_or_else(|| Error::NamespaceNotFound {
            selector: selector.to_string(),
        })?;

    debug!(namespace = %namespace, selector = %selector, "Discovered Cilium namespace");
    Ok(namespace)
}

/// Name of the Cilium agent pod scheduled on `node`
pub async fn agent_pod_on_node<C: ClusterApi + ?Sized>(
    cluster: &C,
    cilium_namespace: &str,
    node: &str,
    selector: &str,
) -> Result<String> {
    let filters = ApiFilters::default()
        .labels(selector)
        .fields(&FieldSelector::pod_on_node(node))
        .limit(1);
    let pods = cluster
        .list_pods(Some(cilium_namespace), &filters)
        .await
        .map_err(|e| {
            Error::cluster_access(
                format!(
                    "discover Cilium pod in namespace {} for node {}",
                    cilium_namespace, node
                ),
                e,
            )
        })?;

    let pod = pods
        .into_iter()
        .find_map(|p| p.metadata.name)
        .ok_or_else(|| Error::NoAgentOnNode {
            namespace: cilium_namespace.to_string(),
            node: node.to_string(),
        })?;

    debug!(pod = %pod, node = %node, "Found Cilium agent");
    Ok(pod)
}
