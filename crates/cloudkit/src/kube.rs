//! Cluster client for namespace finalization.
//!
//! Namespaces left behind by a torn-down release can hang in `Terminating`
//! forever when a controller that owned a finalizer is already gone. The
//! only way out is to clear `spec.finalizers` through the namespace's
//! `/finalize` subresource; a plain patch of the namespace object is not
//! enough, the API server only honors the subresource.

use crate::error::{Error, Result};
use serde_json::Value;
use std::io::Write;
use std::process::{Command, Stdio};

/// A client that can force-finalize a Kubernetes namespace.
pub trait ClusterClient {
    /// Clear `spec.finalizers` on the namespace so a stuck deletion can
    /// complete. Idempotent: finalizing an already-clean namespace is a
    /// no-op on the API server side.
    fn finalize_namespace(&self, namespace: &str) -> Result<()>;
}

/// [`ClusterClient`] backed by the `kubectl` CLI and the kubeconfig context
/// the active provider materialized.
#[derive(Debug, Default)]
pub struct KubectlClient;

impl KubectlClient {
    /// Create a kubectl-backed cluster client.
    pub fn new() -> Self {
        Self
    }

    /// Fetch the namespace object as JSON.
    fn get_namespace(&self, namespace: &str) -> Result<Value> {
        let output = Command::new("kubectl")
            .args(["get", "namespace", namespace, "-o", "json"])
            .output()
            .map_err(|source| Error::Spawn {
                program: "kubectl".to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                program: "kubectl".to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    /// Replace the namespace through its `/finalize` subresource.
    fn replace_finalize(&self, namespace: &str, object: &Value) -> Result<()> {
        let raw = finalize_path(namespace);
        let mut child = Command::new("kubectl")
            .args(["replace", "--raw", &raw, "-f", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: "kubectl".to_string(),
                source,
            })?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(serde_json::to_vec(object)?.as_slice())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(Error::CommandFailed {
                program: "kubectl".to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

impl ClusterClient for KubectlClient {
    fn finalize_namespace(&self, namespace: &str) -> Result<()> {
        let mut object = self.get_namespace(namespace)?;
        strip_finalizers(&mut object)?;
        self.replace_finalize(namespace, &object)
    }
}

/// API path of the namespace's `/finalize` subresource.
fn finalize_path(namespace: &str) -> String {
    format!("/api/v1/namespaces/{namespace}/finalize")
}

/// Clear `spec.finalizers` on a namespace object in place.
fn strip_finalizers(object: &mut Value) -> Result<()> {
    let spec = object.get_mut("spec").ok_or_else(|| Error::MalformedObject {
        kind: "Namespace",
        message: "missing spec".to_string(),
    })?;

    match spec {
        Value::Object(map) => {
            map.insert("finalizers".to_string(), Value::Array(Vec::new()));
            Ok(())
        }
        _ => Err(Error::MalformedObject {
            kind: "Namespace",
            message: "spec is not an object".to_string(),
        }),
    }
}
