//! The workspace aggregate: one deployable unit and everything needed to
//! act on it.
//!
//! A [`Workspace`] binds together the installation metadata from the
//! deployment context, the active cloud provider, the project config, and
//! the process runner the destructive operations go through. It is built
//! once per command invocation and never persisted.

pub mod teardown;

use anyhow::Result;
use cloudkit::provider::Provider;
use std::path::PathBuf;

use crate::config::ProjectConfig;
use crate::executor::{ProcessRunner, ShellRunner};
use crate::manifest::{self, Configuration};
use crate::paths;

/// Installation metadata for one repository.
#[derive(Debug, Clone, Default)]
pub struct Installation {
    /// Repository name; doubles as the helm release name.
    pub repository: String,
    /// Configuration the installation was rendered with.
    pub configuration: Configuration,
}

/// One deployable unit, bound to its provider, config, and workspace root.
pub struct Workspace {
    installation: Installation,
    provider: Box<dyn Provider>,
    config: ProjectConfig,
    root: PathBuf,
    runner: Box<dyn ProcessRunner>,
}

impl Workspace {
    /// Assemble a workspace for `repository` from the current directory's
    /// workspace root.
    pub fn load(repository: &str) -> Result<Self> {
        let root = paths::workspace_root()?;
        let config = ProjectConfig::load(&root)?;
        let context = manifest::Context::read(&root)?;
        let provider = config.provider()?;

        let installation = Installation {
            repository: repository.to_string(),
            configuration: context.repo(repository).cloned().unwrap_or_default(),
        };

        Ok(Self::assemble(
            installation,
            provider,
            config,
            root,
            Box::new(ShellRunner::new()),
        ))
    }

    pub(crate) fn assemble(
        installation: Installation,
        provider: Box<dyn Provider>,
        config: ProjectConfig,
        root: PathBuf,
        runner: Box<dyn ProcessRunner>,
    ) -> Self {
        Self {
            installation,
            provider,
            config,
            root,
            runner,
        }
    }

    /// Repository (and helm release) name.
    pub fn repository(&self) -> &str {
        &self.installation.repository
    }

    /// Namespace the release lives in, per the project's naming policy.
    pub fn namespace(&self) -> String {
        self.config.namespace_for(&self.installation.repository)
    }
}
