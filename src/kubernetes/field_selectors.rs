// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Kubernetes field selector types
//!
//! Field selectors filter resources server-side by field value, and only on a
//! fixed set of fields per resource. For pods that set includes
//! `spec.nodeName`, which is what the agent lookup relies on:
//! https://kubernetes.io/docs/concepts/overview/working-with-objects/field-selectors/#supported-fields

use std::fmt;

/// Field path of the node a pod is scheduled on
pub const POD_NODE_NAME: &str = "spec.nodeName";

/// A single `path=value` field selector term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    /// Field path in Kubernetes notation (e.g., "spec.nodeName")
    pub path: String,
    /// Value to match
    pub value: String,
}

impl FieldSelector {
    pub fn equals(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Selects pods scheduled on the given node
    pub fn pod_on_node(node: &str) -> Self {
        Self::equals(POD_NODE_NAME, node)
    }

    /// Convert to Kubernetes field selector string format
    ///
    /// Example: `spec.nodeName = worker-1` → `"spec.nodeName=worker-1"`
    pub fn to_k8s_string(&self) -> String {
        format!("{}={}", self.path, self.value)
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_k8s_string())
    }
}
