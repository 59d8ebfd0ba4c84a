//! # scalebench cluster access
//!
//! The [`ClusterClient`] trait is the only way the rest of scalebench talks
//! to the cluster. [`KubeCluster`] implements it on top of `kube`; tests use
//! the mock in [`testing`].
//!
//! [`EndpointResolver`] turns a workload into an address the probes can dial
//! without DNS, falling back from the workload URL to the ingress gateway's
//! load balancer and then to a node port on the gateway pod's host.

pub mod client;
pub mod error;
pub mod kube_client;
pub mod resolver;
pub mod watch;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use client::{workload_selector, ClusterClient, Workload, WorkloadSpec};
pub use error::{ClusterError, ClusterResult};
pub use kube_client::KubeCluster;
pub use resolver::EndpointResolver;
pub use watch::{DeploymentEvent, DeploymentWatch};
