//! Mock cluster and object builders for tests

use async_trait::async_trait;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{
    LoadBalancerIngress, LoadBalancerStatus, Pod, PodCondition, PodStatus, Service, ServicePort, ServiceSpec,
    ServiceStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use k8s_openapi::chrono::{DateTime, Utc};
use kube::api::ObjectMeta;
use mockall::mock;

use crate::client::{ClusterClient, Workload, WorkloadSpec};
use crate::error::ClusterResult;
use crate::watch::{DeploymentEvent, DeploymentWatch};

mock! {
    pub Cluster {}

    #[async_trait]
    impl ClusterClient for Cluster {
        async fn get_workload(&self, namespace: &str, name: &str) -> ClusterResult<Workload>;
        async fn list_workloads(&self, namespace: &str) -> ClusterResult<Vec<Workload>>;
        async fn create_workload(&self, spec: &WorkloadSpec) -> ClusterResult<Workload>;
        async fn delete_workload(&self, namespace: &str, name: &str) -> ClusterResult<()>;
        async fn list_namespaces(&self) -> ClusterResult<Vec<String>>;
        async fn create_namespace(&self, name: &str) -> ClusterResult<()>;
        async fn delete_namespace(&self, name: &str) -> ClusterResult<()>;
        async fn get_service(&self, namespace: &str, name: &str) -> ClusterResult<Service>;
        async fn list_pods(&self, namespace: &str, selector: &str) -> ClusterResult<Vec<Pod>>;
        async fn watch_deployments(&self, namespace: &str, selector: &str) -> ClusterResult<DeploymentWatch>;
    }
}

/// Ingress gateway service with the given load balancer IPs and named node ports
pub fn ingress_service(external_ips: &[&str], node_ports: &[(&str, i32)]) -> Service {
    let ingress = external_ips
        .iter()
        .map(|ip| LoadBalancerIngress {
            ip: Some(ip.to_string()),
            ..Default::default()
        })
        .collect();

    let ports = node_ports
        .iter()
        .map(|(name, node_port)| ServicePort {
            name: Some(name.to_string()),
            port: 80,
            node_port: Some(*node_port),
            ..Default::default()
        })
        .collect();

    Service {
        metadata: ObjectMeta {
            name: Some("istio-ingressgateway".to_string()),
            namespace: Some("istio-system".to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            ports: Some(ports),
            ..Default::default()
        }),
        status: Some(ServiceStatus {
            load_balancer: Some(LoadBalancerStatus { ingress: Some(ingress) }),
            ..Default::default()
        }),
    }
}

/// Ingress gateway pod scheduled on `host_ip`
pub fn ingress_pod(host_ip: Option<&str>) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some("istio-ingressgateway-0".to_string()),
            ..Default::default()
        },
        status: Some(PodStatus {
            host_ip: host_ip.map(str::to_string),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Workload pod created at `created`, Ready since `ready` if given
pub fn workload_pod(name: &str, created: DateTime<Utc>, ready: Option<DateTime<Utc>>) -> Pod {
    let conditions = ready.map(|at| {
        vec![PodCondition {
            type_: "Ready".to_string(),
            status: "True".to_string(),
            last_transition_time: Some(Time(at)),
            ..Default::default()
        }]
    });

    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            creation_timestamp: Some(Time(created)),
            ..Default::default()
        },
        status: Some(PodStatus {
            conditions,
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Watch that yields `events` and then ends
pub fn finite_watch(events: Vec<ClusterResult<DeploymentEvent>>) -> DeploymentWatch {
    DeploymentWatch::new("test", futures::stream::iter(events).boxed())
}

/// Watch that yields `events` and then stays open
pub fn open_watch(events: Vec<ClusterResult<DeploymentEvent>>) -> DeploymentWatch {
    let stream = futures::stream::iter(events).chain(futures::stream::pending());
    DeploymentWatch::new("test", stream.boxed())
}

/// Ready-replica counts as a sequence of Modified events
pub fn modified_events(counts: &[i32]) -> Vec<ClusterResult<DeploymentEvent>> {
    counts
        .iter()
        .map(|count| Ok(DeploymentEvent::modified("ksvc-0-00001-deployment", *count)))
        .collect()
}
