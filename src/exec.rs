// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Remote command execution in an agent container
//!
//! Streams the local stdin/stdout/stderr to the remote process. When both
//! stdin and stdout are terminals a TTY is allocated, the local terminal is
//! switched to raw mode and its size is forwarded.

use anyhow::{Context, Result};
use futures::SinkExt;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::api::{AttachParams, TerminalSize};
use kube::{Api, Client};
use std::io::IsTerminal;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Exit code used when the remote side reports failure without one
const GENERIC_FAILURE: i32 = 1;

/// What to run and where
#[derive(Debug, Clone)]
pub struct ExecRequest {
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub command: Vec<String>,
}

/// Restores cooked mode when dropped
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        crossterm::terminal::enable_raw_mode().context("Failed to put terminal in raw mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = crossterm::terminal::disable_raw_mode() {
            warn!(error = %e, "Failed to restore terminal mode");
        }
    }
}

fn local_terminal_size() -> Option<TerminalSize> {
    crossterm::terminal::size()
        .ok()
        .map(|(width, height)| TerminalSize { width, height })
}

/// Run `request.command` in the container and return its exit code
pub async fn exec(client: Client, request: &ExecRequest) -> Result<i32> {
    let tty = std::io::stdin().is_terminal() && std::io::stdout().is_terminal();
    let params = if tty {
        AttachParams::interactive_tty()
    } else {
        AttachParams::default().stdin(true).stdout(true).stderr(true)
    }
    .container(request.container.clone());

    debug!(
        namespace = %request.namespace,
        pod = %request.pod,
        container = %request.container,
        command = ?request.command,
        tty,
        "Starting exec session"
    );

    let pods: Api<Pod> = Api::namespaced(client, &request.namespace);
    let mut attached = pods
        .exec(&request.pod, request.command.clone(), &params)
        .await
        .with_context(|| {
            format!(
                "Failed to exec in {}/{} (container {})",
                request.namespace, request.pod, request.container
            )
        })?;

    let _raw_mode = if tty { Some(RawModeGuard::enable()?) } else { None };

    let resize_task = match attached.terminal_size() {
        Some(mut sizes) => {
            if let Some(size) = local_terminal_size() {
                if let Err(e) = sizes.send(size).await {
                    debug!(error = %e, "Failed to send initial terminal size");
                }
            }
            Some(tokio::spawn(async move { forward_resizes(sizes).await }))
        }
        None => None,
    };

    let stdin_task = attached.stdin().map(|mut remote_stdin| {
        tokio::spawn(async move { forward_stdin(tokio::io::stdin(), &mut remote_stdin).await })
    });

    let remote_stdout = attached.stdout();
    let remote_stderr = attached.stderr();
    let status = attached.take_status();

    let stdout = async move {
        if let Some(mut remote_stdout) = remote_stdout {
            tokio::io::copy(&mut remote_stdout, &mut tokio::io::stdout()).await?;
        }
        Ok::<_, std::io::Error>(())
    };
    let stderr = async move {
        if let Some(mut remote_stderr) = remote_stderr {
            tokio::io::copy(&mut remote_stderr, &mut tokio::io::stderr()).await?;
        }
        Ok::<_, std::io::Error>(())
    };

    let (out, err) = tokio::join!(stdout, stderr);
    out.context("Failed to stream stdout")?;
    err.context("Failed to stream stderr")?;

    let status = match status {
        Some(status) => status.await,
        None => None,
    };

    if let Some(task) = stdin_task {
        task.abort();
    }
    if let Some(task) = resize_task {
        task.abort();
    }
    attached.join().await.context("Exec session failed")?;

    let code = exit_code(status.as_ref());
    debug!(code, "Exec session finished");
    Ok(code)
}

/// Copy local input to the remote stdin, then close it so the remote sees EOF
async fn forward_stdin<R, W>(mut input: R, remote: &mut W)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if let Err(e) = tokio::io::copy(&mut input, remote).await {
        debug!(error = %e, "Stopped forwarding stdin");
    }
    if let Err(e) = remote.shutdown().await {
        debug!(error = %e, "Failed to close remote stdin");
    }
}

#[cfg(unix)]
async fn forward_resizes(mut sizes: futures::channel::mpsc::Sender<TerminalSize>) {
    use tokio::signal::unix::{SignalKind, signal};

    let Ok(mut winch) = signal(SignalKind::window_change()) else {
        return;
    };
    while winch.recv().await.is_some() {
        if let Some(size) = local_terminal_size()
            && sizes.send(size).await.is_err()
        {
            break;
        }
    }
}

#[cfg(not(unix))]
async fn forward_resizes(_sizes: futures::channel::mpsc::Sender<TerminalSize>) {}

/// Map the status reported by the exec endpoint to a process exit code
///
/// Non-zero exits are reported as a failure status whose `ExitCode` cause
/// carries the code in its message.
fn exit_code(status: Option<&Status>) -> i32 {
    let Some(status) = status else {
        return 0;
    };
    if status.status.as_deref() == Some("Success") {
        return 0;
    }

    status
        .details
        .as_ref()
        .and_then(|d| d.causes.as_ref())
        .and_then(|causes| {
            causes
                .iter()
                .find(|c| c.reason.as_deref() == Some("ExitCode"))
        })
        .and_then(|c| c.message.as_deref())
        .and_then(|m| m.trim().parse().ok())
        .unwrap_or(GENERIC_FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{StatusCause, StatusDetails};

    fn failure(causes: Vec<StatusCause>) -> Status {
        Status {
            status: Some("Failure".to_string()),
            reason: Some("NonZeroExitCode".to_string()),
            details: Some(StatusDetails {
                causes: Some(causes),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_forward_stdin_closes_remote() {
        use tokio::io::AsyncReadExt;

        let (mut remote, mut peer) = tokio::io::duplex(64);
        forward_stdin(&b"cilium-dbg status\n"[..], &mut remote).await;

        let mut received = String::new();
        peer.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "cilium-dbg status\n");
    }

    #[tokio::test]
    async fn test_forward_stdin_remote_gone() {
        let (mut remote, peer) = tokio::io::duplex(64);
        drop(peer);
        // Write failures are logged, not propagated
        forward_stdin(&b"exit\n"[..], &mut remote).await;
    }

    #[test]
    fn test_exit_code_success() {
        let status = Status {
            status: Some("Success".to_string()),
            ..Default::default()
        };
        assert_eq!(exit_code(Some(&status)), 0);
        assert_eq!(exit_code(None), 0);
    }

    #[test]
    fn test_exit_code_from_cause() {
        let status = failure(vec![StatusCause {
            reason: Some("ExitCode".to_string()),
            message: Some("42".to_string()),
            ..Default::default()
        }]);
        assert_eq!(exit_code(Some(&status)), 42);
    }

    #[test]
    fn test_exit_code_failure_without_code() {
        let status = failure(vec![StatusCause {
            reason: Some("Other".to_string()),
            message: Some("boom".to_string()),
            ..Default::default()
        }]);
        assert_eq!(exit_code(Some(&status)), GENERIC_FAILURE);
        assert_eq!(exit_code(Some(&failure(vec![]))), GENERIC_FAILURE);
    }
}
