//! Scoped deployment watch

use futures::stream::BoxStream;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use kube::core::WatchEvent;
use tracing::debug;

use crate::error::{ClusterError, ClusterResult};

/// What happened to a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Modified,
    Deleted,
}

/// A deployment state change, reduced to what the replica curve needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentEvent {
    pub kind: EventKind,
    pub name: String,
    pub ready_replicas: i32,
}

impl DeploymentEvent {
    pub fn modified(name: impl Into<String>, ready_replicas: i32) -> Self {
        Self {
            kind: EventKind::Modified,
            name: name.into(),
            ready_replicas,
        }
    }

    fn from_deployment(kind: EventKind, deployment: &Deployment) -> Self {
        Self {
            kind,
            name: deployment.metadata.name.clone().unwrap_or_default(),
            ready_replicas: deployment
                .status
                .as_ref()
                .and_then(|s| s.ready_replicas)
                .unwrap_or(0),
        }
    }

    /// Convert a raw watch event; bookmarks carry no state and yield `None`
    pub fn from_watch_event(target: &str, event: WatchEvent<Deployment>) -> Option<ClusterResult<Self>> {
        match event {
            WatchEvent::Added(d) => Some(Ok(Self::from_deployment(EventKind::Added, &d))),
            WatchEvent::Modified(d) => Some(Ok(Self::from_deployment(EventKind::Modified, &d))),
            WatchEvent::Deleted(d) => Some(Ok(Self::from_deployment(EventKind::Deleted, &d))),
            WatchEvent::Bookmark(_) => None,
            WatchEvent::Error(e) => Some(Err(ClusterError::Watch {
                target: target.to_string(),
                message: e.message,
            })),
        }
    }
}

pub type DeploymentEventStream = BoxStream<'static, ClusterResult<DeploymentEvent>>;

/// Owns one watch subscription.
///
/// [`stop`](Self::stop) releases the subscription and is idempotent.
/// Dropping the handle releases it as well, so early returns cannot leak
/// the underlying connection.
pub struct DeploymentWatch {
    target: String,
    stream: Option<DeploymentEventStream>,
}

impl DeploymentWatch {
    pub fn new(target: impl Into<String>, stream: DeploymentEventStream) -> Self {
        let target = target.into();
        debug!(target = %target, "Deployment watch opened");
        Self {
            target,
            stream: Some(stream),
        }
    }

    /// Next event, or `None` once the stream ended or the watch was stopped
    pub async fn next(&mut self) -> Option<ClusterResult<DeploymentEvent>> {
        match self.stream.as_mut() {
            Some(stream) => stream.next().await,
            None => None,
        }
    }

    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            debug!(target = %self.target, "Deployment watch stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Drop for DeploymentWatch {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for DeploymentWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentWatch")
            .field("target", &self.target)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::DeploymentStatus;
    use kube::api::ObjectMeta;

    fn deployment(ready: Option<i32>) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some("ksvc-0-00001-deployment".to_string()),
                ..Default::default()
            },
            status: Some(DeploymentStatus {
                ready_replicas: ready,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_convert_watch_events() {
        let event = DeploymentEvent::from_watch_event("t", WatchEvent::Modified(deployment(Some(2))))
            .unwrap()
            .unwrap();
        assert_eq!(event.kind, EventKind::Modified);
        assert_eq!(event.ready_replicas, 2);
        assert_eq!(event.name, "ksvc-0-00001-deployment");

        // Missing ready count means nothing is ready yet
        let event = DeploymentEvent::from_watch_event("t", WatchEvent::Added(deployment(None)))
            .unwrap()
            .unwrap();
        assert_eq!(event.ready_replicas, 0);
    }

    #[tokio::test]
    async fn test_stop_releases_stream() {
        let events = vec![Ok(DeploymentEvent::modified("d", 1)), Ok(DeploymentEvent::modified("d", 2))];
        let mut watch = DeploymentWatch::new("d", futures::stream::iter(events).boxed());

        assert_eq!(watch.next().await.unwrap().unwrap().ready_replicas, 1);
        watch.stop();
        assert!(!watch.is_active());
        assert!(watch.next().await.is_none());
        watch.stop();
    }
}
