// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! User settings for kubectl-cilium
//!
//! Settings are read from an optional JSON file and never written back.
//! All kubectl-cilium data is stored under ~/.kubectl-cilium/:
//! - ~/.kubectl-cilium/config.json - user settings
//! - ~/.kubectl-cilium/log/ - log files

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Label selector matching Cilium agent pods
pub const DEFAULT_AGENT_LABEL_SELECTOR: &str = "k8s-app=cilium";

/// Container running the agent inside each Cilium pod
pub const DEFAULT_AGENT_CONTAINER: &str = "cilium-agent";

/// Command run by `exec` when none is given
pub const DEFAULT_COMMAND: &str = "/bin/bash";

/// Get the base kubectl-cilium directory (~/.kubectl-cilium/)
pub fn base_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".kubectl-cilium"))
        .context("Could not determine home directory")
}

/// kubectl-cilium settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Label selector identifying Cilium agent pods
    pub agent_label_selector: String,
    /// Container to exec into
    pub agent_container: String,
    /// Command run by `exec` when none is given
    pub default_command: Vec<String>,
    /// Namespace of the Cilium agents; discovered when unset
    pub cilium_namespace: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent_label_selector: DEFAULT_AGENT_LABEL_SELECTOR.to_string(),
            agent_container: DEFAULT_AGENT_CONTAINER.to_string(),
            default_command: vec![DEFAULT_COMMAND.to_string()],
            cilium_namespace: None,
        }
    }
}

impl Config {
    /// Load config from `path`, or return default if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load config from `path` and apply command-line overrides on top
    pub fn load_with_overrides(path: &Path, cilium_namespace: Option<String>) -> Result<Self> {
        let mut config = Self::load_from(path)?;
        if let Some(ns) = cilium_namespace {
            config.cilium_namespace = Some(ns);
        }
        Ok(config)
    }

    /// Get the config file path (~/.kubectl-cilium/config.json)
    pub fn config_path() -> Result<PathBuf> {
        Ok(base_dir()?.join("config.json"))
    }

    /// Command for `exec`, falling back to the configured default
    pub fn command_or_default(&self, command: &[String]) -> Vec<String> {
        if command.is_empty() {
            self.default_command.clone()
        } else {
            command.to_vec()
        }
    }
}
