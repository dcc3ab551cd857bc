// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Command handlers

use anyhow::Result;
use std::io::Write;

use crate::exec::{self, ExecRequest};
use crate::kubernetes::{ClusterApi, KubeCluster};
use crate::resolve::Target;
use crate::session::Session;

/// Print the agent pod managing `target` as a single line
pub async fn get<C: ClusterApi>(
    session: &Session<C>,
    target: &Target,
    include_namespace: bool,
    out: &mut impl Write,
) -> Result<()> {
    let agent = session.resolve(target).await?;
    if include_namespace {
        writeln!(out, "{}", agent.qualified())?;
    } else {
        writeln!(out, "{}", agent)?;
    }
    Ok(())
}

/// Run `command` in the agent managing `target` and return its exit code
pub async fn exec(
    session: &Session<KubeCluster>,
    target: &Target,
    command: &[String],
) -> Result<i32> {
    let agent = session.resolve(target).await?;
    let request = ExecRequest {
        namespace: agent.namespace,
        pod: agent.pod,
        container: session.config.agent_container.clone(),
        command: session.config.command_or_default(command),
    };
    exec::exec(session.cluster.session_client(), &request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::Error;
    use crate::kubernetes::fake::{FakeCluster, agent, pod};

    async fn session() -> Session<FakeCluster> {
        let cluster = FakeCluster::new()
            .with_node("worker-1")
            .with_node("worker-2")
            .with_pod(agent("kube-system", "cilium-aaaaa", "worker-1"))
            .with_pod(pod("default", "web-0", Some("worker-1"), &[]));
        Session::new(cluster, "default".to_string(), Config::default())
            .await
            .unwrap()
    }

    async fn run_get(target: &str, include_namespace: bool) -> (Result<()>, String) {
        let session = session().await;
        let mut out = Vec::new();
        let result = get(
            &session,
            &Target::parse(target).unwrap(),
            include_namespace,
            &mut out,
        )
        .await;
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_get_prints_pod_name() {
        let (result, out) = run_get("web-0", false).await;
        result.unwrap();
        assert_eq!(out, "cilium-aaaaa\n");
    }

    #[tokio::test]
    async fn test_get_include_namespace() {
        let (result, out) = run_get("node/worker-1", true).await;
        result.unwrap();
        assert_eq!(out, "kube-system/cilium-aaaaa\n");
    }

    #[tokio::test]
    async fn test_get_no_agent_prints_nothing() {
        let (result, out) = run_get("nodes/worker-2", false).await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("worker-2"));
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NoAgentOnNode { .. })
        ));
        assert!(out.is_empty());
    }
}
