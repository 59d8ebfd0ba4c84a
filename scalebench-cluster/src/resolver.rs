//! Probe endpoint resolution

use k8s_openapi::api::core::v1::Service;
use scalebench_config::IngressConfig;
use scalebench_core::endpoint::host_of;
use scalebench_core::EndpointDescriptor;
use std::sync::Arc;
use tracing::debug;

use crate::client::{ClusterClient, Workload};
use crate::error::{ClusterError, ClusterResult};

/// Finds an address and host header that reach a workload without DNS
#[derive(Clone)]
pub struct EndpointResolver {
    cluster: Arc<dyn ClusterClient>,
    ingress: IngressConfig,
}

impl EndpointResolver {
    pub fn new(cluster: Arc<dyn ClusterClient>, ingress: IngressConfig) -> Self {
        Self { cluster, ingress }
    }

    /// Resolve the endpoint for a workload.
    ///
    /// With `resolvable` set the workload URL is used verbatim. Otherwise
    /// the ingress gateway's single load balancer entry is used, or, when
    /// it has none, the node port of the configured gateway port on the
    /// host of the first gateway pod. The workload's hostname always
    /// travels as the host header.
    pub async fn resolve(&self, workload: &Workload, resolvable: bool) -> ClusterResult<EndpointDescriptor> {
        let url = workload.url.as_deref().ok_or_else(|| {
            ClusterError::missing(
                "workload URL",
                format!("workload {}/{} has no URL yet", workload.namespace, workload.name),
            )
        })?;

        if resolvable {
            return Ok(EndpointDescriptor::from_url(url)?);
        }

        let host = host_of(url)?;
        let service = self
            .cluster
            .get_service(&self.ingress.namespace, &self.ingress.service)
            .await?;

        if let Some(address) = self.external_address(&service)? {
            debug!(workload = %workload.name, %address, "Using ingress load balancer address");
            return Ok(EndpointDescriptor::new(
                format!("{}://{}", self.ingress.scheme, address),
                host,
            ));
        }

        let endpoint = self.node_port_endpoint(&service, host).await?;
        debug!(workload = %workload.name, address = %endpoint.address, "Using ingress node port");
        Ok(endpoint)
    }

    /// The load balancer IP or hostname, if the gateway has one
    fn external_address(&self, service: &Service) -> ClusterResult<Option<String>> {
        let entries = service
            .status
            .as_ref()
            .and_then(|s| s.load_balancer.as_ref())
            .and_then(|lb| lb.ingress.as_ref())
            .map(Vec::as_slice)
            .unwrap_or_default();

        match entries {
            [] => Ok(None),
            [entry] => Ok(entry
                .ip
                .clone()
                .filter(|ip| !ip.is_empty())
                .or_else(|| entry.hostname.clone().filter(|h| !h.is_empty()))),
            _ => Err(ClusterError::AmbiguousIngress {
                service: format!("{}/{}", self.ingress.namespace, self.ingress.service),
                count: entries.len(),
            }),
        }
    }

    async fn node_port_endpoint(&self, service: &Service, host: String) -> ClusterResult<EndpointDescriptor> {
        let pods = self
            .cluster
            .list_pods(&self.ingress.namespace, &self.ingress.pod_selector)
            .await?;
        let pod = pods
            .first()
            .ok_or_else(|| ClusterError::missing("ingress pods", "ingress pod list is empty"))?;

        let host_ip = pod
            .status
            .as_ref()
            .and_then(|s| s.host_ip.as_deref())
            .filter(|ip| !ip.is_empty())
            .ok_or_else(|| ClusterError::missing("ingress host IP", "host IP of the ingress pod is empty"))?;

        let ports = service
            .spec
            .as_ref()
            .and_then(|s| s.ports.as_deref())
            .unwrap_or_default();
        if ports.is_empty() {
            return Err(ClusterError::missing(
                "ingress ports",
                "port list of ingress service is empty",
            ));
        }

        let not_found = || {
            ClusterError::missing(
                "ingress port",
                format!("port {} not found in ingress service", self.ingress.port_name),
            )
        };
        let node_port = ports
            .iter()
            .find(|p| p.name.as_deref() == Some(self.ingress.port_name.as_str()))
            .ok_or_else(not_found)?
            .node_port
            .ok_or_else(not_found)?;

        Ok(EndpointDescriptor::node_port(&self.ingress.scheme, host_ip, node_port, host))
    }
}
