//! Per-workload measurement session

use chrono::Utc;
use scalebench_cluster::{workload_selector, ClusterClient, DeploymentWatch, EndpointResolver};
use scalebench_core::{EndpointDescriptor, SessionResult, WorkloadRef};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::collector::PodReadinessCollector;
use crate::error::{MeasureError, MeasureResult};
use crate::probe::{ProbeDriver, ProbeOutcome, ProbeStrategy};
use crate::replica::ReplicaCurveBuilder;

/// How often a watch closed by the server is reopened within one session
const MAX_WATCH_REOPENS: u32 = 5;

/// Phases of a session, in the only order they can occur.
///
/// A probe failure goes from `Collecting` straight to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// Watch opened, endpoint being resolved
    Starting,
    /// Probe running, watch events applied to the curve
    Collecting,
    /// Probe finished, watch still applied until the delay ends
    Settling,
    /// Watch stopped, pods being collected
    Finalizing,
    Done,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Starting => "starting",
            SessionState::Collecting => "collecting",
            SessionState::Settling => "settling",
            SessionState::Finalizing => "finalizing",
            SessionState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Session knobs that do not depend on the probe strategy
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Use workload URLs directly instead of resolving through the ingress
    pub resolvable_domain: bool,
    /// Delay between probe completion and pod collection
    pub settle: Duration,
}

/// Measures one workload.
///
/// The deployment watch is acquired first and released on every exit path:
/// explicitly before finalizing, and by drop on any early return.
pub struct MeasurementSession {
    cluster: Arc<dyn ClusterClient>,
    resolver: EndpointResolver,
    collector: PodReadinessCollector,
    driver: ProbeDriver,
    workload: WorkloadRef,
    config: SessionConfig,
}

impl MeasurementSession {
    /// Build a session, selecting the probe once.
    ///
    /// An unsupported tool name fails here, affecting only this session.
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        resolver: EndpointResolver,
        workload: WorkloadRef,
        strategy: &ProbeStrategy,
        config: SessionConfig,
    ) -> MeasureResult<Self> {
        let driver = ProbeDriver::new(strategy).map_err(|source| MeasureError::Setup {
            workload: workload.clone(),
            source,
        })?;
        Ok(Self::with_driver(cluster, resolver, workload, driver, config))
    }

    pub fn with_driver(
        cluster: Arc<dyn ClusterClient>,
        resolver: EndpointResolver,
        workload: WorkloadRef,
        driver: ProbeDriver,
        config: SessionConfig,
    ) -> Self {
        Self {
            collector: PodReadinessCollector::new(cluster.clone()),
            cluster,
            resolver,
            driver,
            workload,
            config,
        }
    }

    pub fn workload(&self) -> &WorkloadRef {
        &self.workload
    }

    pub async fn run(self) -> MeasureResult<SessionResult> {
        self.run_observed(|_| {}).await
    }

    /// Run the session, reporting every state entered to `observe`
    pub async fn run_observed<F>(self, mut observe: F) -> MeasureResult<SessionResult>
    where
        F: FnMut(SessionState) + Send,
    {
        let mut state = StateTracker::new(&self.workload, &mut observe);
        let started_at = Utc::now();
        let clock = Instant::now();

        let mut reopens = 0;
        let mut watch = match self.open_watch().await {
            Ok(watch) => watch,
            Err(e) => {
                state.enter(SessionState::Done);
                return Err(e);
            }
        };

        let endpoint = match self.resolve_endpoint().await {
            Ok(endpoint) => endpoint,
            Err(e) => {
                watch.stop();
                state.enter(SessionState::Done);
                return Err(e);
            }
        };

        state.enter(SessionState::Collecting);
        let mut curve = ReplicaCurveBuilder::new(started_at);
        let outcome = match self.collect(&mut watch, &mut reopens, &mut curve, &endpoint).await {
            Ok(outcome) => outcome,
            Err(e) => {
                watch.stop();
                state.enter(SessionState::Done);
                return Err(e);
            }
        };
        let service_ready = outcome.answered_after.map(|_| clock.elapsed());

        state.enter(SessionState::Settling);
        self.settle(&mut watch, &mut reopens, &mut curve).await;

        state.enter(SessionState::Finalizing);
        watch.stop();
        let pod_results = self
            .collector
            .collect(&self.workload.namespace, &self.workload.name)
            .await
            .map_err(|source| MeasureError::Collect {
                workload: self.workload.clone(),
                source,
            });
        state.enter(SessionState::Done);
        let pod_results = pod_results?;

        let result = SessionResult {
            workload: self.workload.clone(),
            total_ready_replicas: curve.highest(),
            total_ready_pods: pod_results.len(),
            replica_results: curve.into_results(),
            pod_results,
            probe_output: outcome.output,
            service_ready,
        };

        info!(
            workload = %self.workload,
            ready_replicas = result.total_ready_replicas,
            ready_pods = result.total_ready_pods,
            service_ready_ms = result.service_ready.map(|d| d.as_millis() as u64),
            "Session finished"
        );
        Ok(result)
    }

    async fn open_watch(&self) -> MeasureResult<DeploymentWatch> {
        self.cluster
            .watch_deployments(&self.workload.namespace, &workload_selector(&self.workload.name))
            .await
            .map_err(|source| MeasureError::Watch {
                workload: self.workload.clone(),
                source,
            })
    }

    async fn resolve_endpoint(&self) -> MeasureResult<EndpointDescriptor> {
        let workload = self
            .cluster
            .get_workload(&self.workload.namespace, &self.workload.name)
            .await
            .map_err(|source| MeasureError::Lookup {
                workload: self.workload.clone(),
                source,
            })?;

        let endpoint = self
            .resolver
            .resolve(&workload, self.config.resolvable_domain)
            .await
            .map_err(|source| MeasureError::Resolve {
                workload: self.workload.clone(),
                source,
            })?;
        debug!(workload = %self.workload, %endpoint, "Endpoint resolved");
        Ok(endpoint)
    }

    /// Replace a watch whose stream ended before the session did.
    ///
    /// The API server closes watches after its own timeout, which long
    /// sustained runs outlast. Past the reopen budget, or if reopening fails,
    /// the curve stops updating and the session carries on.
    async fn reopen_watch(&self, watch: &mut DeploymentWatch, reopens: &mut u32) {
        watch.stop();
        if *reopens >= MAX_WATCH_REOPENS {
            warn!(
                workload = %self.workload,
                reopens = *reopens,
                "Watch stream ended again, replica curve stops updating"
            );
            return;
        }

        *reopens += 1;
        match self.open_watch().await {
            Ok(fresh) => {
                info!(workload = %self.workload, reopens = *reopens, "Watch stream ended early, reopened");
                *watch = fresh;
            }
            Err(e) => warn!(
                workload = %self.workload,
                "Watch stream ended and could not be reopened, replica curve stops updating: {}",
                e
            ),
        }
    }

    /// Merge watch events into the curve until the probe finishes
    async fn collect(
        &self,
        watch: &mut DeploymentWatch,
        reopens: &mut u32,
        curve: &mut ReplicaCurveBuilder,
        endpoint: &EndpointDescriptor,
    ) -> MeasureResult<ProbeOutcome> {
        let probe = self.driver.run(endpoint);
        tokio::pin!(probe);

        loop {
            tokio::select! {
                outcome = &mut probe => {
                    return outcome.map_err(|source| MeasureError::Probe {
                        workload: self.workload.clone(),
                        endpoint: endpoint.clone(),
                        source,
                    });
                }
                event = watch.next(), if watch.is_active() => match event {
                    Some(Ok(event)) => {
                        if curve.apply(&event) {
                            debug!(workload = %self.workload, ready = event.ready_replicas, "Ready replicas increased");
                        }
                    }
                    Some(Err(source)) => {
                        return Err(MeasureError::Watch {
                            workload: self.workload.clone(),
                            source,
                        });
                    }
                    None => self.reopen_watch(watch, reopens).await,
                },
            }
        }
    }

    /// Keep applying watch events until the settling delay ends
    async fn settle(&self, watch: &mut DeploymentWatch, reopens: &mut u32, curve: &mut ReplicaCurveBuilder) {
        let delay = tokio::time::sleep(self.config.settle);
        tokio::pin!(delay);

        loop {
            tokio::select! {
                _ = &mut delay => break,
                event = watch.next(), if watch.is_active() => match event {
                    Some(Ok(event)) => {
                        curve.apply(&event);
                    }
                    Some(Err(e)) => {
                        warn!(workload = %self.workload, "Watch failed while settling: {}", e);
                        watch.stop();
                    }
                    None => self.reopen_watch(watch, reopens).await,
                },
            }
        }
    }
}

/// Forward-only state bookkeeping
struct StateTracker<'a, F> {
    workload: &'a WorkloadRef,
    current: SessionState,
    observe: &'a mut F,
}

impl<'a, F: FnMut(SessionState)> StateTracker<'a, F> {
    fn new(workload: &'a WorkloadRef, observe: &'a mut F) -> Self {
        observe(SessionState::Starting);
        debug!(workload = %workload, state = %SessionState::Starting, "Session state");
        Self {
            workload,
            current: SessionState::Starting,
            observe,
        }
    }

    fn enter(&mut self, next: SessionState) {
        debug_assert!(next > self.current, "session state went from {} to {}", self.current, next);
        self.current = next;
        debug!(workload = %self.workload, state = %next, "Session state");
        (self.observe)(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use scalebench_cluster::testing::{finite_watch, modified_events, open_watch, workload_pod, MockCluster};
    use scalebench_cluster::{ClusterError, Workload};
    use scalebench_config::IngressConfig;
    use scalebench_execution::{ExternalTool, LoadTool};
    use scalebench_http::LoadSettings;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ready_workload() -> Workload {
        Workload {
            namespace: "bench-1".to_string(),
            name: "ksvc-0".to_string(),
            url: Some("http://ksvc-0.bench-1.example.com".to_string()),
            ready: true,
        }
    }

    fn session(cluster: MockCluster, driver: ProbeDriver, settle: Duration) -> MeasurementSession {
        let cluster: Arc<dyn ClusterClient> = Arc::new(cluster);
        let resolver = EndpointResolver::new(cluster.clone(), IngressConfig::default());
        MeasurementSession::with_driver(
            cluster,
            resolver,
            WorkloadRef::new("bench-1", "ksvc-0"),
            driver,
            SessionConfig {
                resolvable_domain: true,
                settle,
            },
        )
    }

    fn echo_driver() -> ProbeDriver {
        ProbeDriver::external(
            ExternalTool::new(LoadTool::Hey).with_binary("echo"),
            LoadSettings {
                rate: 4,
                workers: 2,
                duration: Duration::from_secs(1),
            },
        )
    }

    #[tokio::test]
    async fn test_successful_session_walks_every_state() {
        let mut cluster = MockCluster::new();
        cluster
            .expect_watch_deployments()
            .returning(|_, _| Ok(open_watch(modified_events(&[1, 1, 2, 3, 1]))));
        cluster.expect_get_workload().returning(|_, _| Ok(ready_workload()));
        cluster.expect_list_pods().returning(|_, _| {
            let now = Utc::now();
            Ok(vec![
                workload_pod("ksvc-0-a", now, Some(now)),
                workload_pod("ksvc-0-b", now, None),
            ])
        });

        let mut states = Vec::new();
        let result = session(cluster, echo_driver(), Duration::from_millis(50))
            .run_observed(|s| states.push(s))
            .await
            .unwrap();

        assert_eq!(
            states,
            vec![
                SessionState::Starting,
                SessionState::Collecting,
                SessionState::Settling,
                SessionState::Finalizing,
                SessionState::Done,
            ]
        );
        let counts: Vec<i32> = result.replica_results.iter().map(|r| r.ready_replicas).collect();
        assert_eq!(counts, vec![1, 2, 3]);
        assert_eq!(result.total_ready_replicas, 3);
        assert_eq!(result.total_ready_pods, 1);
        assert!(result.probe_output.contains("-host ksvc-0.bench-1.example.com"));
        assert!(result.service_ready.is_none());
    }

    #[tokio::test]
    async fn test_resolution_failure_stops_before_probing() {
        let mut cluster = MockCluster::new();
        cluster.expect_watch_deployments().returning(|_, _| Ok(finite_watch(vec![])));
        cluster.expect_get_workload().returning(|_, _| {
            Ok(Workload {
                url: None,
                ..ready_workload()
            })
        });
        cluster.expect_list_pods().never();

        let mut states = Vec::new();
        let err = session(cluster, echo_driver(), Duration::ZERO)
            .run_observed(|s| states.push(s))
            .await
            .unwrap_err();

        assert!(matches!(err, MeasureError::Resolve { .. }));
        assert_eq!(states, vec![SessionState::Starting, SessionState::Done]);
    }

    #[tokio::test]
    async fn test_probe_failure_skips_settling() {
        let mut cluster = MockCluster::new();
        cluster.expect_watch_deployments().returning(|_, _| Ok(open_watch(vec![])));
        cluster.expect_get_workload().returning(|_, _| Ok(ready_workload()));
        cluster.expect_list_pods().never();

        let failing = ProbeDriver::external(
            ExternalTool::new(LoadTool::Wrk).with_binary("false"),
            LoadSettings::default(),
        );

        let mut states = Vec::new();
        let err = session(cluster, failing, Duration::from_secs(60))
            .run_observed(|s| states.push(s))
            .await
            .unwrap_err();

        match &err {
            MeasureError::Probe { workload, endpoint, .. } => {
                assert_eq!(workload.to_string(), "bench-1/ksvc-0");
                assert_eq!(endpoint.address, "http://ksvc-0.bench-1.example.com");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(
            states,
            vec![SessionState::Starting, SessionState::Collecting, SessionState::Done]
        );
    }

    #[tokio::test]
    async fn test_watch_setup_failure() {
        let mut cluster = MockCluster::new();
        cluster.expect_watch_deployments().returning(|_, _| {
            Err(ClusterError::Watch {
                target: "deployments".to_string(),
                message: "forbidden".to_string(),
            })
        });
        cluster.expect_get_workload().never();

        let err = session(cluster, echo_driver(), Duration::ZERO).run().await.unwrap_err();
        assert!(matches!(err, MeasureError::Watch { .. }));
    }

    #[tokio::test]
    async fn test_watch_closed_by_server_is_reopened() {
        let opened = Arc::new(AtomicUsize::new(0));
        let calls = opened.clone();
        let mut cluster = MockCluster::new();
        cluster.expect_watch_deployments().returning(move |_, _| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(finite_watch(modified_events(&[1])))
            } else {
                Ok(open_watch(modified_events(&[1, 2, 3])))
            }
        });
        cluster.expect_get_workload().returning(|_, _| Ok(ready_workload()));
        cluster.expect_list_pods().returning(|_, _| Ok(vec![]));

        let result = session(cluster, echo_driver(), Duration::from_millis(50))
            .run()
            .await
            .unwrap();

        assert_eq!(opened.load(Ordering::SeqCst), 2);
        let counts: Vec<i32> = result.replica_results.iter().map(|r| r.ready_replicas).collect();
        assert_eq!(counts, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_watch_reopen_budget_is_bounded() {
        let mut cluster = MockCluster::new();
        cluster
            .expect_watch_deployments()
            .times(1 + MAX_WATCH_REOPENS as usize)
            .returning(|_, _| Ok(finite_watch(vec![])));
        cluster.expect_get_workload().returning(|_, _| Ok(ready_workload()));
        cluster.expect_list_pods().returning(|_, _| Ok(vec![]));

        let result = session(cluster, echo_driver(), Duration::from_millis(50))
            .run()
            .await
            .unwrap();

        assert_eq!(result.total_ready_replicas, 0);
        assert!(result.replica_results.is_empty());
    }
}
