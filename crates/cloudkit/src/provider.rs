//! Cloud provider backends for cluster credential materialization.
//!
//! Each provider wraps the vendor CLI (`gcloud`, `aws`, `az`) and knows how
//! to write a valid kubeconfig entry for the workspace's cluster. The
//! argument shapes mirror what an operator would type by hand, so a failing
//! invocation can be copy-pasted and rerun for diagnosis.

use crate::error::{Error, Result};
use std::process::Command;

/// Environment variable present when running inside a Kubernetes pod.
///
/// When set, the in-cluster service account is already the right identity
/// and no kubeconfig refresh is needed.
const IN_CLUSTER_ENV: &str = "KUBERNETES_SERVICE_HOST";

/// A cloud provider that can materialize local cluster credentials.
///
/// Implementations are idempotent: `ensure_cluster_context` may be called
/// repeatedly and will simply refresh the same kubeconfig entry.
pub trait Provider: std::fmt::Debug {
    /// Short provider name (e.g. "gcp").
    fn name(&self) -> &str;

    /// Name of the cluster this provider targets.
    fn cluster(&self) -> &str;

    /// Write or refresh the local kubeconfig entry for the cluster.
    fn ensure_cluster_context(&self) -> Result<()>;
}

/// True when running inside a Kubernetes pod, where the mounted service
/// account supersedes any kubeconfig.
pub fn in_cluster() -> bool {
    std::env::var_os(IN_CLUSTER_ENV).is_some()
}

/// Run a vendor CLI command and check for success.
fn run_checked(program: &str, args: &[String]) -> Result<()> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| Error::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(Error::CommandFailed {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}

/// Google Cloud provider backed by the `gcloud` CLI.
#[derive(Debug, Clone)]
pub struct Gcp {
    cluster: String,
    project: String,
    region: String,
}

impl Gcp {
    /// Create a GCP provider for the given cluster.
    pub fn new(cluster: &str, project: &str, region: &str) -> Self {
        Self {
            cluster: cluster.to_string(),
            project: project.to_string(),
            region: region.to_string(),
        }
    }

    fn kubeconfig_args(&self) -> Vec<String> {
        vec![
            "container".into(),
            "clusters".into(),
            "get-credentials".into(),
            self.cluster.clone(),
            "--region".into(),
            self.region.clone(),
            "--project".into(),
            self.project.clone(),
        ]
    }
}

impl Provider for Gcp {
    fn name(&self) -> &str {
        "gcp"
    }

    fn cluster(&self) -> &str {
        &self.cluster
    }

    fn ensure_cluster_context(&self) -> Result<()> {
        if in_cluster() {
            return Ok(());
        }

        run_checked("gcloud", &self.kubeconfig_args())
    }
}

/// AWS provider backed by the `aws` CLI.
#[derive(Debug, Clone)]
pub struct Aws {
    cluster: String,
    region: String,
}

impl Aws {
    /// Create an AWS provider for the given EKS cluster.
    pub fn new(cluster: &str, region: &str) -> Self {
        Self {
            cluster: cluster.to_string(),
            region: region.to_string(),
        }
    }

    fn kubeconfig_args(&self) -> Vec<String> {
        vec![
            "eks".into(),
            "update-kubeconfig".into(),
            "--name".into(),
            self.cluster.clone(),
            "--region".into(),
            self.region.clone(),
        ]
    }
}

impl Provider for Aws {
    fn name(&self) -> &str {
        "aws"
    }

    fn cluster(&self) -> &str {
        &self.cluster
    }

    fn ensure_cluster_context(&self) -> Result<()> {
        if in_cluster() {
            return Ok(());
        }

        run_checked("aws", &self.kubeconfig_args())
    }
}

/// Azure provider backed by the `az` CLI.
#[derive(Debug, Clone)]
pub struct Azure {
    cluster: String,
    resource_group: String,
}

impl Azure {
    /// Create an Azure provider for the given AKS cluster.
    pub fn new(cluster: &str, resource_group: &str) -> Self {
        Self {
            cluster: cluster.to_string(),
            resource_group: resource_group.to_string(),
        }
    }

    fn kubeconfig_args(&self) -> Vec<String> {
        vec![
            "aks".into(),
            "get-credentials".into(),
            "--name".into(),
            self.cluster.clone(),
            "--resource-group".into(),
            self.resource_group.clone(),
        ]
    }
}

impl Provider for Azure {
    fn name(&self) -> &str {
        "azure"
    }

    fn cluster(&self) -> &str {
        &self.cluster
    }

    fn ensure_cluster_context(&self) -> Result<()> {
        if in_cluster() {
            return Ok(());
        }

        run_checked("az", &self.kubeconfig_args())
    }
}
