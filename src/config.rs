use anyhow::{bail, Context, Result};
use cloudkit::provider::{Aws, Azure, Gcp, Provider};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::paths::PROJECT_CONFIG_FILE;

/// Which cloud the workspace's cluster lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gcp,
    Aws,
    Azure,
}

/// Project configuration (`workspace.yaml` at the workspace root).
///
/// Carries the provider selection plus the handful of identifiers the
/// vendor CLIs need to materialize cluster credentials, and the local
/// namespace-naming policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub provider: ProviderKind,
    pub cluster: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,
    /// Optional prefix applied to every release namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_prefix: Option<String>,
}

impl ProjectConfig {
    /// Load `workspace.yaml` from the workspace root.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(PROJECT_CONFIG_FILE);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid {PROJECT_CONFIG_FILE} format"))
    }

    /// The namespace a repository's release is installed into.
    pub fn namespace_for(&self, repository: &str) -> String {
        match &self.namespace_prefix {
            Some(prefix) => format!("{prefix}{repository}"),
            None => repository.to_string(),
        }
    }

    /// Construct the active provider from the config.
    pub fn provider(&self) -> Result<Box<dyn Provider>> {
        match self.provider {
            ProviderKind::Gcp => {
                let project = self.require("project", self.project.as_deref())?;
                let region = self.require("region", self.region.as_deref())?;
                Ok(Box::new(Gcp::new(&self.cluster, project, region)))
            }
            ProviderKind::Aws => {
                let region = self.require("region", self.region.as_deref())?;
                Ok(Box::new(Aws::new(&self.cluster, region)))
            }
            ProviderKind::Azure => {
                let group = self.require("resource_group", self.resource_group.as_deref())?;
                Ok(Box::new(Azure::new(&self.cluster, group)))
            }
        }
    }

    fn require<'a>(&self, field: &str, value: Option<&'a str>) -> Result<&'a str> {
        match value {
            Some(v) if !v.is_empty() => Ok(v),
            _ => bail!(
                "{PROJECT_CONFIG_FILE}: `{field}` is required for provider {:?}",
                self.provider
            ),
        }
    }
}
