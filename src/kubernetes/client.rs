use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, api::ListParams};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, trace};

use super::{ApiFilters, ClusterApi};

/// Timeout for connecting to K8s API
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for reading K8s API responses
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Name reported for the cluster when running with in-cluster credentials
const IN_CLUSTER: &str = "in-cluster";

/// How to reach the cluster, mirroring kubectl's global flags
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Explicit kubeconfig path (otherwise $KUBECONFIG or ~/.kube/config)
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use instead of the current one
    pub context: Option<String>,
    /// Overrides the read timeout of API requests
    pub request_timeout: Option<Duration>,
}

/// Kubernetes client bound to a single kubeconfig context
pub struct KubeCluster {
    /// Client for request/response API calls (bounded read timeout)
    client: Client,
    /// Client for long-lived streaming sessions (no read timeout)
    session_client: Client,
    context: String,
    default_namespace: String,
}

impl KubeCluster {
    /// Load kubeconfig and build clients for the selected context
    ///
    /// Falls back to in-cluster credentials when no kubeconfig can be read and
    /// neither a kubeconfig path nor a context was requested.
    pub async fn connect(options: &ClientOptions) -> Result<Self> {
        let (config, context) = match Self::read_kubeconfig(options)? {
            Some(kubeconfig) => {
                let context_name = options
                    .context
                    .clone()
                    .or_else(|| kubeconfig.current_context.clone())
                    .ok_or_else(|| {
                        anyhow!("No context specified and no current context in kubeconfig")
                    })?;

                // Verify context exists
                if !kubeconfig.contexts.iter().any(|c| c.name == context_name) {
                    return Err(anyhow!(
                        "Context '{}' not found in kubeconfig",
                        context_name
                    ));
                }

                let config = Config::from_custom_kubeconfig(
                    kubeconfig,
                    &KubeConfigOptions {
                        context: Some(context_name.clone()),
                        ..Default::default()
                    },
                )
                .await
                .with_context(|| {
                    format!("Failed to load kubeconfig for context '{}'", context_name)
                })?;
                (config, context_name)
            }
            None => {
                let config =
                    Config::incluster().context("Failed to load in-cluster configuration")?;
                (config, IN_CLUSTER.to_string())
            }
        };

        let (config, session_config) = Self::client_configs(config, options);
        let default_namespace = config.default_namespace.clone();
        let client = Client::try_from(config)
            .with_context(|| format!("Failed to create client for context '{}'", context))?;
        let session_client = Client::try_from(session_config)
            .with_context(|| format!("Failed to create client for context '{}'", context))?;

        debug!(
            context = %context,
            namespace = %default_namespace,
            "Created Kubernetes client"
        );

        Ok(Self {
            client,
            session_client,
            context,
            default_namespace,
        })
    }

    /// Apply timeouts, returning the request config and the session config
    ///
    /// Exec sessions may sit idle for a long time, so the session config has
    /// no read timeout.
    fn client_configs(mut config: Config, options: &ClientOptions) -> (Config, Config) {
        config.connect_timeout = Some(CONNECT_TIMEOUT);

        let mut session_config = config.clone();
        session_config.read_timeout = None;

        config.read_timeout = Some(options.request_timeout.unwrap_or(READ_TIMEOUT));
        (config, session_config)
    }

    fn read_kubeconfig(options: &ClientOptions) -> Result<Option<Kubeconfig>> {
        if let Some(path) = &options.kubeconfig {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
            return Ok(Some(kubeconfig));
        }

        match Kubeconfig::read() {
            Ok(kubeconfig) => Ok(Some(kubeconfig)),
            Err(e) if options.context.is_none() => {
                debug!(error = %e, "No usable kubeconfig, trying in-cluster configuration");
                Ok(None)
            }
            Err(e) => Err(e).context("Failed to read kubeconfig"),
        }
    }

    /// Client for streaming sessions such as exec
    pub fn session_client(&self) -> Client {
        self.session_client.clone()
    }

    /// Name of the kubeconfig context in use
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Namespace of the active context, "default" when the context sets none
    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Build ListParams from API filters (label selectors, field selectors, limit)
    fn build_list_params(filters: &ApiFilters) -> ListParams {
        let mut params = ListParams::default();

        if let Some(ref label_sel) = filters.label_selector {
            params = params.labels(label_sel);
        }

        if let Some(ref field_sel) = filters.field_selector {
            params = params.fields(field_sel);
        }

        if let Some(limit) = filters.limit {
            params = params.limit(limit);
        }

        trace!(
            label_selector = ?filters.label_selector,
            field_selector = ?filters.field_selector,
            limit = ?filters.limit,
            "Built ListParams"
        );

        params
    }
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_node(&self, name: &str) -> Result<Option<Node>> {
        let api: Api<Node> = Api::all(self.client.clone());
        Ok(api.get_opt(name).await?)
    }

    async fn list_pods(&self, namespace: Option<&str>, filters: &ApiFilters) -> Result<Vec<Pod>> {
        let api: Api<Pod> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let params = Self::build_list_params(filters);
        Ok(api.list(&params).await?.items)
    }
}
