//! Deployment context manifest (`context.yaml`).
//!
//! Records which bundles have been installed into the workspace and the
//! per-repository configuration each installation was rendered with. The
//! on-disk form is a versioned document so the schema can evolve without
//! breaking older workspaces.

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::paths::CONTEXT_FILE;

/// Schema version written to new manifests.
const API_VERSION: &str = "capstan.dev/v1alpha1";

/// Document kind written to new manifests.
const KIND: &str = "Context";

/// Per-repository configuration values, as rendered at install time.
pub type Configuration = BTreeMap<String, serde_yaml::Value>;

/// One installed bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    pub repository: String,
    pub name: String,
}

/// The deployment context: installed bundles plus each repository's
/// configuration map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub bundles: Vec<Bundle>,
    #[serde(default)]
    pub configuration: BTreeMap<String, Configuration>,
}

/// On-disk envelope around [`Context`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionedContext {
    api_version: String,
    kind: String,
    spec: Context,
}

impl Context {
    /// Read `context.yaml` from the workspace root. A missing file is an
    /// empty context, not an error: a fresh workspace has no installations.
    pub fn read(root: &Path) -> Result<Self> {
        let path = root.join(CONTEXT_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let versioned: VersionedContext =
            serde_yaml::from_str(&content).with_context(|| format!("Invalid {CONTEXT_FILE}"))?;
        Ok(versioned.spec)
    }

    /// Write the context back as a versioned document.
    pub fn write(&self, root: &Path) -> Result<()> {
        let versioned = VersionedContext {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            spec: self.clone(),
        };

        let content = serde_yaml::to_string(&versioned)?;
        let path = root.join(CONTEXT_FILE);
        fs::write(&path, content).with_context(|| format!("Could not write {}", path.display()))
    }

    /// Configuration map for one repository, if installed.
    pub fn repo(&self, name: &str) -> Option<&Configuration> {
        self.configuration.get(name)
    }

    /// Record a bundle installation, deduplicating on (repository, name).
    pub fn add_bundle(&mut self, repository: &str, name: &str) {
        let exists = self
            .bundles
            .iter()
            .any(|b| b.repository == repository && b.name == name);
        if exists {
            return;
        }

        self.bundles.push(Bundle {
            repository: repository.to_string(),
            name: name.to_string(),
        });
    }
}
