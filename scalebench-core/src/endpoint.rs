//! Probe endpoint description

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Where to send probe traffic for one workload.
///
/// `address` is dialled directly, `host_header` carries the workload's
/// virtual-host identity so the ingress can route without DNS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub address: String,
    pub host_header: String,
}

impl EndpointDescriptor {
    pub fn new(address: impl Into<String>, host_header: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            host_header: host_header.into(),
        }
    }

    /// Use a resolvable workload URL as-is
    pub fn from_url(workload_url: &str) -> Result<Self> {
        Ok(Self::new(workload_url, host_of(workload_url)?))
    }

    /// Address an ingress reached through a node's host IP and node port
    pub fn node_port(scheme: &str, host_ip: &str, node_port: i32, host_header: impl Into<String>) -> Self {
        Self::new(format!("{}://{}:{}", scheme, host_ip, node_port), host_header)
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Host: {})", self.address, self.host_header)
    }
}

/// Extract the host part of a workload URL
pub fn host_of(workload_url: &str) -> Result<String> {
    let parsed = url::Url::parse(workload_url).map_err(|e| CoreError::InvalidUrl {
        url: workload_url.to_string(),
        reason: e.to_string(),
    })?;

    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| CoreError::InvalidUrl {
            url: workload_url.to_string(),
            reason: "URL has no host".to_string(),
        })
}
