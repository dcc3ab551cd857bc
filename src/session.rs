// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Per-invocation context shared by all commands
//!
//! Built once at startup and passed to each command handler. Holds the
//! cluster handle, the namespace pods are looked up in, and the Cilium
//! namespace, which is discovered at most once per process.

use anyhow::Result;
use tracing::{debug, info};

use crate::cilium;
use crate::config::Config;
use crate::error;
use crate::kubernetes::{ClientOptions, ClusterApi, KubeCluster};
use crate::resolve::{self, ResolvedAgent, Target};

pub struct Session<C> {
    pub cluster: C,
    /// Namespace pod targets are looked up in
    pub namespace: String,
    /// Namespace the Cilium agents run in
    pub cilium_namespace: String,
    pub config: Config,
}

impl<C: ClusterApi> Session<C> {
    /// Create a session, discovering the Cilium namespace unless the config names one
    pub async fn new(cluster: C, namespace: String, config: Config) -> error::Result<Self> {
        let cilium_namespace = match &config.cilium_namespace {
            Some(ns) => ns.clone(),
            None => cilium::discover_namespace(&cluster, &config.agent_label_selector).await?,
        };

        Ok(Self {
            cluster,
            namespace,
            cilium_namespace,
            config,
        })
    }

    /// Find the Cilium agent managing `target`
    pub async fn resolve(&self, target: &Target) -> error::Result<ResolvedAgent> {
        let agent = resolve::resolve(
            &self.cluster,
            &self.cilium_namespace,
            &self.namespace,
            target,
            &self.config.agent_label_selector,
        )
        .await?;
        debug!(target = %target, node = %agent.node, agent = %agent.qualified(), "Resolved agent");
        Ok(agent)
    }
}

impl Session<KubeCluster> {
    /// Connect to the cluster and build a session
    ///
    /// `namespace` overrides the namespace of the kubeconfig context.
    pub async fn connect(
        options: &ClientOptions,
        namespace: Option<String>,
        config: Config,
    ) -> Result<Self> {
        let cluster = KubeCluster::connect(options).await?;
        let namespace = namespace.unwrap_or_else(|| cluster.default_namespace().to_string());
        let context = cluster.context().to_string();

        let session = Self::new(cluster, namespace, config).await?;
        info!(
            context = %context,
            namespace = %session.namespace,
            cilium_namespace = %session.cilium_namespace,
            "Session ready"
        );
        Ok(session)
    }
}
