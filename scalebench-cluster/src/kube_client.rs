//! `kube`-backed cluster client

use async_trait::async_trait;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Pod, Service};
use kube::api::{Api, ApiResource, DeleteParams, DynamicObject, ListParams, ObjectMeta, PostParams, WatchParams};
use kube::core::GroupVersionKind;
use kube::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::{ClusterClient, Workload, WorkloadSpec};
use crate::error::{ClusterError, ClusterResult};
use crate::watch::{DeploymentEvent, DeploymentWatch};

const SERVING_GROUP: &str = "serving.knative.dev";
const SERVING_VERSION: &str = "v1";
const MIN_SCALE_ANNOTATION: &str = "autoscaling.knative.dev/min-scale";
const MAX_SCALE_ANNOTATION: &str = "autoscaling.knative.dev/max-scale";

/// Cluster client talking to the Kubernetes API.
///
/// Workloads are Knative services, handled as dynamic objects so no
/// generated CRD types are needed.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    workloads: ApiResource,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        let gvk = GroupVersionKind::gvk(SERVING_GROUP, SERVING_VERSION, "Service");
        Self {
            client,
            workloads: ApiResource::from_gvk(&gvk),
        }
    }

    /// Connect using the ambient kubeconfig or in-cluster service account
    pub async fn try_default() -> ClusterResult<Self> {
        let client = Client::try_default().await?;
        info!("Connected to cluster at {}", client.default_namespace());
        Ok(Self::new(client))
    }

    fn workload_api(&self, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, &self.workloads)
    }
}

impl std::fmt::Debug for KubeCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeCluster")
            .field("default_namespace", &self.client.default_namespace())
            .finish()
    }
}

/// Read a workload out of a Knative service object
pub fn workload_from_object(object: &DynamicObject) -> ClusterResult<Workload> {
    let name = object.metadata.name.clone().ok_or_else(|| ClusterError::Malformed {
        kind: "workload",
        name: "<unnamed>".to_string(),
        reason: "metadata.name is missing".to_string(),
    })?;

    Ok(Workload {
        namespace: object.metadata.namespace.clone().unwrap_or_default(),
        name,
        url: object
            .data
            .pointer("/status/url")
            .and_then(Value::as_str)
            .map(str::to_string),
        ready: is_ready(&object.data),
    })
}

fn is_ready(data: &Value) -> bool {
    data.pointer("/status/conditions")
        .and_then(Value::as_array)
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c["type"] == "Ready" && c["status"] == "True")
        })
        .unwrap_or(false)
}

/// Knative service body for a workload spec
pub fn workload_body(spec: &WorkloadSpec) -> Value {
    let mut annotations = serde_json::Map::new();
    if let Some(min) = spec.min_scale {
        annotations.insert(MIN_SCALE_ANNOTATION.to_string(), json!(min.to_string()));
    }
    if let Some(max) = spec.max_scale {
        annotations.insert(MAX_SCALE_ANNOTATION.to_string(), json!(max.to_string()));
    }

    json!({
        "spec": {
            "template": {
                "metadata": { "annotations": annotations },
                "spec": {
                    "containers": [{ "image": spec.image }]
                }
            }
        }
    })
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn get_workload(&self, namespace: &str, name: &str) -> ClusterResult<Workload> {
        let object = self.workload_api(namespace).get(name).await?;
        workload_from_object(&object)
    }

    async fn list_workloads(&self, namespace: &str) -> ClusterResult<Vec<Workload>> {
        let list = self.workload_api(namespace).list(&ListParams::default()).await?;
        list.items.iter().map(workload_from_object).collect()
    }

    async fn create_workload(&self, spec: &WorkloadSpec) -> ClusterResult<Workload> {
        let object = DynamicObject::new(&spec.name, &self.workloads)
            .within(&spec.namespace)
            .data(workload_body(spec));

        let created = self
            .workload_api(&spec.namespace)
            .create(&PostParams::default(), &object)
            .await?;
        debug!(namespace = %spec.namespace, workload = %spec.name, "Workload created");
        workload_from_object(&created)
    }

    async fn delete_workload(&self, namespace: &str, name: &str) -> ClusterResult<()> {
        self.workload_api(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        debug!(namespace, workload = name, "Workload deleted");
        Ok(())
    }

    async fn list_namespaces(&self) -> ClusterResult<Vec<String>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items.into_iter().filter_map(|ns| ns.metadata.name).collect())
    }

    async fn create_namespace(&self, name: &str) -> ClusterResult<()> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        api.create(&PostParams::default(), &namespace).await?;
        info!(namespace = name, "Namespace created");
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> ClusterResult<()> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        api.delete(name, &DeleteParams::default()).await?;
        info!(namespace = name, "Namespace deleted");
        Ok(())
    }

    async fn get_service(&self, namespace: &str, name: &str) -> ClusterResult<Service> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await?)
    }

    async fn list_pods(&self, namespace: &str, selector: &str) -> ClusterResult<Vec<Pod>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default().labels(selector)).await?;
        Ok(list.items)
    }

    async fn watch_deployments(&self, namespace: &str, selector: &str) -> ClusterResult<DeploymentWatch> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let target = format!("deployments {} in {}", selector, namespace);

        let raw = api.watch(&WatchParams::default().labels(selector), "0").await?;
        let stream_target = target.clone();
        let events = raw
            .filter_map(move |item| {
                let converted = match item {
                    Ok(event) => DeploymentEvent::from_watch_event(&stream_target, event),
                    Err(e) => Some(Err(ClusterError::Api(e))),
                };
                futures::future::ready(converted)
            })
            .boxed();

        Ok(DeploymentWatch::new(target, events))
    }
}
