//! Ordered, fail-fast destruction of a workspace.
//!
//! Steps run in a fixed total order: helm uninstall, terraform destroy,
//! local state reset. A hard failure in one step aborts everything after
//! it. The namespace finalizer is the one concurrent piece: a detached,
//! delayed, best-effort task that clears finalizers on the release
//! namespace in case the uninstall left it stuck terminating.

use anyhow::{Context, Result};
use cloudkit::kube::{ClusterClient, KubectlClient};
use std::io;
use std::thread;
use std::time::Duration;

use super::Workspace;
use crate::executor::{CommandSpec, Executor, Suppression};
use crate::{paths, ui};

/// Delay before the background namespace finalize fires.
///
/// Long enough for a healthy namespace deletion to complete on its own;
/// the finalize is then a no-op.
pub const NAMESPACE_FINALIZE_DELAY: Duration = Duration::from_secs(60);

/// Output helm prints when asked to delete a release that is already gone.
/// The exact wording is a compatibility surface; helm's exit code alone
/// cannot distinguish this from a real failure.
const RELEASE_NOT_FOUND: &str = "release.*not found";

impl Workspace {
    /// Tear the workspace down completely: helm release, terraform
    /// infrastructure, then local generated state. Fail-fast; the error
    /// names the step that failed.
    pub fn destroy(&self) -> Result<()> {
        self.destroy_helm().context("helm uninstall failed")?;
        self.destroy_terraform().context("terraform destroy failed")?;
        self.reset()
    }

    /// Uninstall the helm release, tolerating releases that are already
    /// gone.
    pub fn destroy_helm(&self) -> Result<()> {
        // Refresh cluster credentials before touching anything. Best
        // effort: if this was actually wrong, the helm commands below fail
        // loudly on their own.
        if let Err(err) = self.provider.ensure_cluster_context() {
            log::debug!("cluster context refresh failed: {err}");
        }

        let name = self.repository();
        let namespace = self.namespace();
        let executor = Executor::new(self.runner.as_ref());

        // Probe first: a release that never existed (or is long gone) makes
        // `helm get values` fail, and there is nothing left to delete.
        let probe = CommandSpec::new("helm", ["get", "values", name, "-n", &namespace]);
        if executor.run_suppressed(&Suppression::Never, &probe).is_err() {
            ui::info("Helm already uninstalled, continuing...");
            return Ok(());
        }

        // The release can still vanish between probe and delete; helm's
        // "not found" complaint is then the desired end state.
        let not_found = Suppression::matches(RELEASE_NOT_FOUND)?;
        let delete = CommandSpec::new("helm", ["del", name, "-n", &namespace]);
        executor.run_suppressed(&not_found, &delete)?;
        Ok(())
    }

    /// Destroy the terraform-managed infrastructure for this repository.
    ///
    /// No failure is suppressible here: infrastructure state must be fully
    /// reconciled or the operator has to know.
    pub fn destroy_terraform(&self) -> Result<()> {
        let dir = paths::terraform_dir(&self.root, self.repository());
        let namespace = self.namespace();

        // Safety net for namespaces stuck terminating on dangling
        // finalizers. Fire-and-forget: it runs whether or not the destroy
        // below succeeds, and its own failure is only logged.
        drop(schedule_namespace_finalize(
            NAMESPACE_FINALIZE_DELAY,
            namespace,
            KubectlClient::new(),
        ));

        let executor = Executor::new(self.runner.as_ref());

        let init = CommandSpec::new("terraform", ["init", "-upgrade"]).current_dir(&dir);
        executor.run_suppressed(&Suppression::Never, &init)?;

        let destroy = CommandSpec::new("terraform", ["destroy", "-auto-approve"]).current_dir(&dir);
        executor.run_suppressed(&Suppression::Never, &destroy)?;
        Ok(())
    }

    /// Remove the generated `deploy.hcl`. Best effort: by this point the
    /// release and infrastructure are gone, so a file that cannot be
    /// removed is only worth a warning, never a failed teardown.
    pub fn reset(&self) -> Result<()> {
        let deploy = paths::deploy_file(&self.root, self.repository());
        if let Err(err) = std::fs::remove_file(&deploy) {
            if err.kind() != io::ErrorKind::NotFound {
                log::warn!("could not remove {}: {err}", deploy.display());
            }
        }
        Ok(())
    }

    /// Re-apply the installed chart (`helm upgrade --install`) with the
    /// workspace's rendered configuration.
    pub fn bounce(&self) -> Result<()> {
        let executor = Executor::new(self.runner.as_ref());
        executor.run_suppressed(&Suppression::Never, &self.upgrade_spec("upgrade"))?;
        Ok(())
    }

    /// Preview what a bounce would change (`helm diff upgrade`).
    pub fn diff(&self) -> Result<()> {
        let executor = Executor::new(self.runner.as_ref());
        executor.run_suppressed(&Suppression::Never, &self.upgrade_spec("diff"))?;
        Ok(())
    }

    fn upgrade_spec(&self, mode: &str) -> CommandSpec {
        let name = self.repository();
        let namespace = self.namespace();
        let chart = paths::helm_dir(&self.root, name);

        let mut args: Vec<String> = match mode {
            "diff" => vec!["diff".into(), "upgrade".into()],
            _ => vec!["upgrade".into(), "--install".into()],
        };
        args.push(name.to_string());
        args.push(chart.display().to_string());
        args.push("-n".into());
        args.push(namespace);
        args.extend(self.set_args());

        CommandSpec::new("helm", args)
    }

    /// Scalar configuration values as `--set key=value` pairs, in key
    /// order.
    fn set_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (key, value) in &self.installation.configuration {
            let rendered = match value {
                serde_yaml::Value::String(s) => s.clone(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            args.push("--set".to_string());
            args.push(format!("{key}={rendered}"));
        }
        args
    }
}

/// Schedule the best-effort namespace finalize.
///
/// Detached and uncancellable: the thread sleeps `delay`, then asks the
/// cluster client to clear the namespace's finalizers. Failure is logged,
/// never propagated — normal teardown does not depend on this having run.
/// The handle is returned only so tests can join; production callers drop
/// it.
pub fn schedule_namespace_finalize<C>(
    delay: Duration,
    namespace: String,
    client: C,
) -> thread::JoinHandle<()>
where
    C: ClusterClient + Send + 'static,
{
    thread::spawn(move || {
        thread::sleep(delay);
        if let Err(err) = client.finalize_namespace(&namespace) {
            log::warn!("could not finalize namespace {namespace}: {err}");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProjectConfig, ProviderKind};
    use crate::executor::fake::{FakeOutcome, FakeRunner};
    use crate::workspace::Installation;
    use cloudkit::provider::Provider;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// Provider whose context refresh always succeeds.
    #[derive(Debug)]
    struct NullProvider;

    impl Provider for NullProvider {
        fn name(&self) -> &str {
            "null"
        }

        fn cluster(&self) -> &str {
            "test"
        }

        fn ensure_cluster_context(&self) -> cloudkit::Result<()> {
            Ok(())
        }
    }

    fn test_config() -> ProjectConfig {
        ProjectConfig {
            provider: ProviderKind::Gcp,
            cluster: "prod".to_string(),
            project: Some("acme-infra".to_string()),
            region: Some("us-east1".to_string()),
            resource_group: None,
            namespace_prefix: None,
        }
    }

    fn workspace_at(root: &Path, runner: &FakeRunner) -> Workspace {
        Workspace::assemble(
            Installation {
                repository: "app".to_string(),
                configuration: Default::default(),
            },
            Box::new(NullProvider),
            test_config(),
            root.to_path_buf(),
            Box::new(runner.clone()),
        )
    }

    #[test]
    fn failed_probe_skips_the_delete() {
        let dir = tempfile::tempdir().unwrap();
        // Probe runs with no suppression, so it burns the whole budget.
        let runner = FakeRunner::scripted([
            FakeOutcome::fail("Error: release: not found\n"),
            FakeOutcome::fail("Error: release: not found\n"),
            FakeOutcome::fail("Error: release: not found\n"),
        ]);
        let ws = workspace_at(dir.path(), &runner);

        ws.destroy_helm().unwrap();

        assert!(runner
            .calls()
            .iter()
            .all(|c| c.starts_with("helm get values app")));
    }

    #[test]
    fn delete_race_with_external_deletion_is_suppressed() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::scripted([
            FakeOutcome::ok("USER-SUPPLIED VALUES:\n"),
            FakeOutcome::fail("Error: uninstall: release: \"app\" not found\n"),
        ]);
        let ws = workspace_at(dir.path(), &runner);

        ws.destroy_helm().unwrap();

        assert_eq!(
            runner.calls(),
            vec!["helm get values app -n app", "helm del app -n app"]
        );
    }

    #[test]
    fn terraform_never_runs_after_helm_hard_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::scripted([
            FakeOutcome::ok("USER-SUPPLIED VALUES:\n"),
            FakeOutcome::fail("connection refused\n"),
            FakeOutcome::fail("connection refused\n"),
            FakeOutcome::fail("connection refused\n"),
        ]);
        let ws = workspace_at(dir.path(), &runner);

        let err = ws.destroy().unwrap_err();

        assert!(err.to_string().contains("helm uninstall failed"));
        assert!(!runner.calls().iter().any(|c| c.starts_with("terraform")));
    }

    #[test]
    fn destroy_runs_steps_in_declared_order() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(app.join("deploy.hcl"), "backend {}\n").unwrap();

        let runner = FakeRunner::scripted([
            FakeOutcome::ok("USER-SUPPLIED VALUES:\n"),
            FakeOutcome::ok("release \"app\" uninstalled\n"),
            FakeOutcome::ok("Terraform has been successfully initialized!\n"),
            FakeOutcome::ok("Destroy complete! Resources: 4 destroyed.\n"),
        ]);
        let ws = workspace_at(dir.path(), &runner);

        ws.destroy().unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                "helm get values app -n app",
                "helm del app -n app",
                "terraform init -upgrade",
                "terraform destroy -auto-approve",
            ]
        );
        // Local state reset ran last.
        assert!(!app.join("deploy.hcl").exists());
    }

    #[test]
    fn terraform_commands_carry_an_explicit_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::scripted([
            FakeOutcome::ok("Initialized\n"),
            FakeOutcome::ok("Destroy complete\n"),
        ]);
        let ws = workspace_at(dir.path(), &runner);

        ws.destroy_terraform().unwrap();

        let expected = Some(dir.path().join("app").join("terraform"));
        assert_eq!(runner.cwds(), vec![expected.clone(), expected]);
    }

    #[test]
    fn terraform_failure_exhausts_budget_and_stops_the_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(app.join("deploy.hcl"), "backend {}\n").unwrap();

        let runner = FakeRunner::scripted([
            FakeOutcome::ok("USER-SUPPLIED VALUES:\n"),
            FakeOutcome::ok("release \"app\" uninstalled\n"),
            FakeOutcome::ok("Initialized\n"),
            FakeOutcome::fail("Error acquiring lock\n"),
            FakeOutcome::fail("Error acquiring lock\n"),
            FakeOutcome::fail("Error acquiring lock\n"),
        ]);
        let ws = workspace_at(dir.path(), &runner);

        let err = ws.destroy().unwrap_err();

        assert!(err.to_string().contains("terraform destroy failed"));
        assert_eq!(runner.call_count(), 6);
        // Reset never ran.
        assert!(app.join("deploy.hcl").exists());
    }

    #[test]
    fn reset_tolerates_a_missing_deploy_file() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default();
        let ws = workspace_at(dir.path(), &runner);

        ws.reset().unwrap();
    }

    #[test]
    fn reset_absorbs_removal_failures() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default();
        let ws = workspace_at(dir.path(), &runner);

        // A non-empty directory where the file should be makes
        // remove_file fail with something other than NotFound.
        let deploy = dir.path().join("app").join("deploy.hcl");
        std::fs::create_dir_all(deploy.join("nested")).unwrap();

        ws.reset().unwrap();
        assert!(deploy.exists());
    }

    #[test]
    fn namespace_prefix_flows_into_command_lines() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::scripted([
            FakeOutcome::ok("USER-SUPPLIED VALUES:\n"),
            FakeOutcome::ok("release \"app\" uninstalled\n"),
        ]);
        let mut config = test_config();
        config.namespace_prefix = Some("acme-".to_string());
        let ws = Workspace::assemble(
            Installation {
                repository: "app".to_string(),
                configuration: Default::default(),
            },
            Box::new(NullProvider),
            config,
            dir.path().to_path_buf(),
            Box::new(runner.clone()),
        );

        ws.destroy_helm().unwrap();

        assert_eq!(runner.calls()[0], "helm get values app -n acme-app");
    }

    #[test]
    fn bounce_passes_scalar_configuration_as_set_args() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::scripted([FakeOutcome::ok("Release \"app\" has been upgraded\n")]);
        let mut configuration = crate::manifest::Configuration::default();
        configuration.insert(
            "hostname".to_string(),
            serde_yaml::Value::String("app.example.com".to_string()),
        );
        let ws = Workspace::assemble(
            Installation {
                repository: "app".to_string(),
                configuration,
            },
            Box::new(NullProvider),
            test_config(),
            dir.path().to_path_buf(),
            Box::new(runner.clone()),
        );

        ws.bounce().unwrap();

        let call = &runner.calls()[0];
        assert!(call.starts_with("helm upgrade --install app"));
        assert!(call.contains("--set hostname=app.example.com"));
    }

    /// Client that records the namespaces it was asked to finalize.
    struct RecordingClient(Arc<Mutex<Vec<String>>>);

    impl ClusterClient for RecordingClient {
        fn finalize_namespace(&self, namespace: &str) -> cloudkit::Result<()> {
            self.0.lock().unwrap().push(namespace.to_string());
            Ok(())
        }
    }

    /// Client that always fails.
    struct FailingClient;

    impl ClusterClient for FailingClient {
        fn finalize_namespace(&self, _namespace: &str) -> cloudkit::Result<()> {
            Err(cloudkit::Error::MalformedObject {
                kind: "Namespace",
                message: "boom".to_string(),
            })
        }
    }

    #[test]
    fn finalizer_fires_after_the_delay() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle = schedule_namespace_finalize(
            Duration::from_millis(5),
            "app".to_string(),
            RecordingClient(Arc::clone(&seen)),
        );

        handle.join().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["app".to_string()]);
    }

    #[test]
    fn finalizer_failure_is_swallowed() {
        let handle = schedule_namespace_finalize(
            Duration::from_millis(1),
            "app".to_string(),
            FailingClient,
        );

        // The thread must complete cleanly even though the client errored.
        handle.join().unwrap();
    }
}
