//! # cloudkit
//!
//! Cloud provider and cluster plumbing for capstan.
//!
//! This crate provides:
//! - [`Provider`] implementations that materialize local cluster credentials
//!   (kubeconfig) through the vendor CLIs (`gcloud`, `aws`, `az`)
//! - A [`ClusterClient`] that force-finalizes Kubernetes namespaces stuck
//!   terminating due to dangling finalizers
//!
//! All operations shell out to the vendor tooling; nothing here keeps
//! long-lived connections or state. Every operation is idempotent and safe
//! to call repeatedly.
//!
//! ## Example
//!
//! ```no_run
//! use cloudkit::provider::{Gcp, Provider};
//!
//! let gcp = Gcp::new("my-cluster", "my-project", "us-east1");
//! gcp.ensure_cluster_context().expect("kubeconfig refresh failed");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod kube;
pub mod provider;

pub use error::{Error, Result};
pub use kube::{ClusterClient, KubectlClient};
pub use provider::Provider;
