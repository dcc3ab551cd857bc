// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Target parsing and resolution
//!
//! A target names a pod or a node, optionally prefixed with a resource type:
//! `web-0`, `pod/web-0`, `pods/web-0`, `node/worker-1`, `nodes/worker-1`.
//! Resolution maps the target to a node and then to the Cilium agent pod
//! scheduled on that node.
//!
//! Which lookups run is decided by the prefix alone:
//!
//! | prefix       | pod lookup | node lookup               |
//! |--------------|------------|---------------------------|
//! | (none)       | first      | only if the pod is absent |
//! | pod, pods    | yes        | no                        |
//! | node, nodes  | no         | yes                       |
//!
//! Only a 404 lets resolution move on to the next lookup. Any other failure,
//! and a pod that exists but is not scheduled, ends resolution.

use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::cilium;
use crate::error::{Error, Result};
use crate::kubernetes::ClusterApi;

/// Resource type requested by a target prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// No prefix: try a pod first, then a node
    Any,
    Pod,
    Node,
}

/// Lookups to perform for a [`TargetKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookups {
    pub pod: bool,
    pub node: bool,
}

impl TargetKind {
    fn from_prefix(prefix: &str) -> Result<Self> {
        match prefix {
            "" => Ok(TargetKind::Any),
            "pod" | "pods" => Ok(TargetKind::Pod),
            "node" | "nodes" => Ok(TargetKind::Node),
            _ => Err(Error::UnsupportedResource {
                resource: prefix.to_string(),
            }),
        }
    }

    pub fn lookups(self) -> Lookups {
        match self {
            TargetKind::Any => Lookups { pod: true, node: true },
            TargetKind::Pod => Lookups { pod: true, node: false },
            TargetKind::Node => Lookups { pod: false, node: true },
        }
    }
}

/// A parsed `[pod/|pods/|node/|nodes/]<name>` target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    raw: String,
    kind: TargetKind,
    name: String,
}

impl Target {
    /// Parse a target, splitting on the first `/` only
    pub fn parse(raw: &str) -> Result<Self> {
        let (kind, name) = match raw.split_once('/') {
            Some((prefix, name)) => (TargetKind::from_prefix(prefix)?, name),
            None => (TargetKind::Any, raw),
        };
        Ok(Self {
            raw: raw.to_string(),
            kind,
            name: name.to_string(),
        })
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Target::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The Cilium agent responsible for a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAgent {
    pub namespace: String,
    pub pod: String,
    /// Node the agent runs on
    pub node: String,
}

impl ResolvedAgent {
    /// `namespace/pod`
    pub fn qualified(&self) -> String {
        format!("{}/{}", self.namespace, self.pod)
    }
}

impl fmt::Display for ResolvedAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pod)
    }
}

/// Find the Cilium agent managing `target`
///
/// Pods are looked up in `namespace`; the agent is searched for in
/// `cilium_namespace` using `agent_selector`.
pub async fn resolve<C: ClusterApi + ?Sized>(
    cluster: &C,
    cilium_namespace: &str,
    namespace: &str,
    target: &Target,
    agent_selector: &str,
) -> Result<ResolvedAgent> {
    let node = candidate_node(cluster, namespace, target)
        .await?
        .ok_or_else(|| Error::TargetNotFound {
            target: target.to_string(),
            namespace: namespace.to_string(),
        })?;

    debug!(target = %target, node = %node, "Resolved target to node");

    let pod = cilium::agent_pod_on_node(cluster, cilium_namespace, &node, agent_selector).await?;
    Ok(ResolvedAgent {
        namespace: cilium_namespace.to_string(),
        pod,
        node,
    })
}

/// Node the target maps to, or `None` when no lookup found it
async fn candidate_node<C: ClusterApi + ?Sized>(
    cluster: &C,
    namespace: &str,
    target: &Target,
) -> Result<Option<String>> {
    let name = target.name();
    if name.is_empty() {
        return Ok(None);
    }

    let lookups = target.kind().lookups();

    if lookups.pod {
        let pod = cluster
            .get_pod(namespace, name)
            .await
            .map_err(|e| Error::cluster_access(format!("get pod {}/{}", namespace, name), e))?;

        if let Some(pod) = pod {
            let node = pod
                .spec
                .and_then(|s| s.node_name)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| Error::PodUnscheduled {
                    namespace: namespace.to_string(),
                    pod: name.to_string(),
                })?;
            return Ok(Some(node));
        }
        debug!(namespace = %namespace, pod = %name, "Pod not found");
    }

    if lookups.node {
        let node = cluster
            .get_node(name)
            .await
            .map_err(|e| Error::cluster_access(format!("get node {}", name), e))?;

        if let Some(node) = node {
            return Ok(Some(node.metadata.name.unwrap_or_else(|| name.to_string())));
        }
        debug!(node = %name, "Node not found");
    }

    Ok(None)
}
