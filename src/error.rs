// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use thiserror::Error;

/// Errors produced while locating a Cilium agent
#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported resource {resource:?} (expected one of: pod, pods, node, nodes)")]
    UnsupportedResource { resource: String },

    #[error("failed to find node name for target {target} (namespace {namespace})")]
    TargetNotFound { target: String, namespace: String },

    #[error("pod {namespace}/{pod} has not been assigned to any node")]
    PodUnscheduled { namespace: String, pod: String },

    #[error("no Cilium pod is running on node {node} (namespace {namespace})")]
    NoAgentOnNode { namespace: String, node: String },

    #[error("failed to discover Cilium namespace: no pod matches selector {selector:?}")]
    NamespaceNotFound { selector: String },

    #[error("failed to {context}")]
    ClusterAccess {
        context: String,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub(crate) fn cluster_access(context: impl Into<String>, source: anyhow::Error) -> Self {
        Error::ClusterAccess {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
