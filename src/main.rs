// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod cilium;
mod cli;
mod commands;
pub mod config;
mod error;
mod exec;
mod kubernetes;
mod resolve;
mod session;

use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::prelude::*;

use cli::{Args, Command};
use config::Config;
use kubernetes::ClientOptions;
use resolve::Target;
use session::Session;

/// Exit code after Ctrl-C, as shells report it
const INTERRUPTED: i32 = 130;

/// Initialize logging with file output and optional stderr
fn init_logging(verbose: bool) {
    use tracing_rolling_file::{RollingConditionBase, RollingFileAppenderBase};
    use tracing_subscriber::fmt::format::FmtSpan;

    let filter = if verbose {
        "kubectl_cilium=debug"
    } else {
        "kubectl_cilium=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    // Create log directory
    let log_dir = config::base_dir()
        .map(|p| p.join("log"))
        .unwrap_or_else(|_| std::path::PathBuf::from("."));

    // File appender with size-based rotation:
    // - Max 10MB per file
    // - Keep up to 5 files (total max ~50MB)
    // - Also rotate daily
    let file_layer = match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            let condition = RollingConditionBase::new()
                .daily()
                .max_size(10 * 1024 * 1024); // 10MB
            match RollingFileAppenderBase::new(log_dir.join("kubectl-cilium.log"), condition, 5) {
                Ok(appender) => {
                    let (non_blocking, guard) = appender.get_non_blocking_appender();
                    // Leak the guard to keep the background writer alive
                    std::mem::forget(guard);
                    Some(
                        tracing_subscriber::fmt::layer()
                            .with_writer(non_blocking)
                            .with_ansi(false)
                            .with_span_events(FmtSpan::NONE),
                    )
                }
                Err(e) => {
                    if verbose {
                        eprintln!("Warning: Could not create log file: {}", e);
                    }
                    None
                }
            }
        }
        Err(e) => {
            if verbose {
                eprintln!("Warning: Could not create log directory: {}", e);
            }
            None
        }
    };

    // Stdout carries command output, so only stderr gets log lines
    let stderr_layer = verbose.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::NONE)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
}

/// Read the settings file, ignoring it when there is no home directory
fn load_config(args: &Args) -> Result<Config> {
    match Config::config_path() {
        Ok(path) => Config::load_with_overrides(&path, args.cilium_namespace.clone()),
        Err(e) => {
            debug!(error = %e, "Skipping config file");
            Ok(Config {
                cilium_namespace: args.cilium_namespace.clone(),
                ..Default::default()
            })
        }
    }
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (aws-lc-rs)
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let args = Args::parse();
    init_logging(args.verbose);

    let result = tokio::select! {
        result = run(args) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            Ok(INTERRUPTED)
        }
    };

    // Exit explicitly: a pending stdin read would otherwise keep the runtime alive
    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<i32> {
    // Reject malformed targets before touching the cluster
    let target = match &args.command {
        Command::Get { target, .. } | Command::Exec { target, .. } => Target::parse(target)?,
    };

    let config = load_config(&args)?;
    let options = ClientOptions {
        kubeconfig: args.kubeconfig.clone(),
        context: args.context.clone(),
        request_timeout: args.request_timeout.map(Duration::from_secs),
    };
    let session = Session::connect(&options, args.namespace.clone(), config).await?;

    match &args.command {
        Command::Get {
            include_namespace, ..
        } => {
            let mut stdout = std::io::stdout();
            commands::get(&session, &target, *include_namespace, &mut stdout).await?;
            Ok(0)
        }
        Command::Exec { command, .. } => commands::exec(&session, &target, command).await,
    }
}
