// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use clap::{Parser, Subcommand};
use std::path::PathBuf;

const TARGET_HELP: &str = "\
Whether a pod or node is referenced by the given name is auto-discovered. A particular type \
can be enforced by prefixing the resource name with a slash delimiter. Both singular and \
plural resource name variations are supported.

If no namespace is specified or defined in the kube context, \"default\" is used.";

#[derive(Parser, Debug)]
#[command(name = "kubectl-cilium")]
#[command(author, version, about = "A kubectl plugin for interacting with Cilium")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the kubeconfig file to use
    #[arg(long, global = true, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubernetes context to use
    #[arg(long, global = true, value_name = "CONTEXT")]
    pub context: Option<String>,

    /// Namespace of pod targets (defaults to the kube context's namespace)
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Namespace Cilium is installed in (discovered when omitted)
    #[arg(long, global = true, value_name = "NAMESPACE")]
    pub cilium_namespace: Option<String>,

    /// Timeout in seconds for a single API request
    #[arg(long, global = true, value_name = "SECONDS")]
    pub request_timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Get a Cilium agent pod name
    #[command(long_about = format!(
        "Get the name of the Cilium agent managing the given node or pod.\n\n{TARGET_HELP}"
    ))]
    Get {
        /// [pod/]<pod> or [node/]<node>
        target: String,

        /// Include the Cilium namespace in the output
        #[arg(short, long)]
        include_namespace: bool,
    },

    /// Execute a command in a particular Cilium agent
    #[command(long_about = format!(
        "Execute a command in a Cilium agent managing the given node or pod.\n\n{TARGET_HELP}\n\n\
         The default exec command is \"/bin/bash\"."
    ))]
    Exec {
        /// [pod/]<pod> or [node/]<node>
        target: String,

        /// Command and arguments to run (default: /bin/bash)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}
