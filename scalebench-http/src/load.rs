//! Fixed-rate in-process load generator

use reqwest::Client;
use scalebench_core::EndpointDescriptor;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{interval_at, sleep_until, timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::{build_client, send_request};
use crate::config::LoadSettings;
use crate::errors::ProbeError;

/// Per-request budget, also the bound on draining requests still in flight at the deadline
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type RequestOutcome = (Result<u16, ProbeError>, Duration);

/// Aggregated outcome of one load run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Requests sent before the deadline that were answered or failed
    pub requests: u64,
    /// Answers with a 2xx or 3xx status
    pub successes: u64,
    /// Requests that never got an answer
    pub transport_failures: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub mean_latency: Duration,
    pub p50_latency: Duration,
    pub p95_latency: Duration,
    pub p99_latency: Duration,
    pub max_latency: Duration,
    pub duration: Duration,
    pub achieved_rps: f64,
}

impl LoadReport {
    fn from_samples(samples: WorkerSamples, duration: Duration) -> Self {
        let WorkerSamples {
            mut latencies,
            status_codes,
            transport_failures,
        } = samples;
        latencies.sort_unstable();

        let answered: u64 = status_codes.values().sum();
        let successes = status_codes
            .iter()
            .filter(|(code, _)| (200..400).contains(*code))
            .map(|(_, count)| count)
            .sum();
        let requests = answered + transport_failures;

        let mean_latency = if latencies.is_empty() {
            Duration::ZERO
        } else {
            latencies.iter().sum::<Duration>() / latencies.len() as u32
        };

        let achieved_rps = if duration.is_zero() {
            0.0
        } else {
            requests as f64 / duration.as_secs_f64()
        };

        Self {
            requests,
            successes,
            transport_failures,
            status_codes,
            mean_latency,
            p50_latency: percentile(&latencies, 0.50),
            p95_latency: percentile(&latencies, 0.95),
            p99_latency: percentile(&latencies, 0.99),
            max_latency: latencies.last().copied().unwrap_or_default(),
            duration,
            achieved_rps,
        }
    }

    /// Human-readable summary, used as the session's probe output
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Requests:      {} ({:.2} req/s over {:.1?})",
            self.requests, self.achieved_rps, self.duration
        );
        let _ = writeln!(out, "Successes:     {}", self.successes);
        let _ = writeln!(out, "Failures:      {}", self.transport_failures);

        let codes: Vec<String> = self
            .status_codes
            .iter()
            .map(|(code, count)| format!("{}={}", code, count))
            .collect();
        let _ = writeln!(out, "Status codes:  {}", codes.join(" "));
        let _ = write!(
            out,
            "Latency:       mean {:.1?}, p50 {:.1?}, p95 {:.1?}, p99 {:.1?}, max {:.1?}",
            self.mean_latency, self.p50_latency, self.p95_latency, self.p99_latency, self.max_latency
        );
        out
    }
}

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let index = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[index.min(sorted.len() - 1)]
}

#[derive(Debug, Default)]
struct WorkerSamples {
    latencies: Vec<Duration>,
    status_codes: BTreeMap<u16, u64>,
    transport_failures: u64,
}

impl WorkerSamples {
    fn merge(&mut self, other: WorkerSamples) {
        self.latencies.extend(other.latencies);
        for (code, count) in other.status_codes {
            *self.status_codes.entry(code).or_insert(0) += count;
        }
        self.transport_failures += other.transport_failures;
    }

    fn record(&mut self, joined: Result<RequestOutcome, JoinError>) {
        match joined {
            Ok((Ok(status), latency)) => {
                self.latencies.push(latency);
                *self.status_codes.entry(status).or_insert(0) += 1;
            }
            Ok((Err(e), _)) => {
                debug!("Load request failed: {}", e);
                self.transport_failures += 1;
            }
            Err(e) => warn!("Load request task failed: {}", e),
        }
    }
}

/// Sends `rate` requests per second, spread over `workers` tasks, for `duration`
#[derive(Debug, Clone)]
pub struct LoadGenerator {
    client: Client,
    settings: LoadSettings,
}

impl LoadGenerator {
    pub fn new(settings: LoadSettings) -> Result<Self, ProbeError> {
        Ok(Self {
            client: build_client(REQUEST_TIMEOUT)?,
            settings,
        })
    }

    pub async fn run(&self, endpoint: &EndpointDescriptor) -> LoadReport {
        let workers = self.settings.workers.max(1);
        let rate = self.settings.rate.max(1);
        // Each worker fires on its own period so the aggregate hits `rate`
        let period = Duration::from_secs_f64(workers as f64 / rate as f64);

        let start = Instant::now();
        let deadline = start + self.settings.duration;

        info!(
            address = %endpoint.address,
            host = %endpoint.host_header,
            rate,
            workers,
            duration_ms = self.settings.duration.as_millis() as u64,
            "Starting sustained load"
        );

        let mut tasks = JoinSet::new();
        for worker in 0..workers {
            let client = self.client.clone();
            let endpoint = endpoint.clone();
            // Stagger workers across one period
            let offset = period.mul_f64(worker as f64 / workers as f64);
            tasks.spawn(run_worker(client, endpoint, start + offset, period, deadline));
        }

        let mut samples = WorkerSamples::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(worker_samples) => samples.merge(worker_samples),
                Err(e) => warn!("Load worker panicked: {}", e),
            }
        }

        let report = LoadReport::from_samples(samples, start.elapsed().min(self.settings.duration));
        info!(
            requests = report.requests,
            successes = report.successes,
            failures = report.transport_failures,
            "Sustained load finished"
        );
        report
    }
}

/// Fires one request per tick without waiting for earlier ones to answer.
///
/// Requests sent before `deadline` are drained afterwards, bounded by the request timeout.
async fn run_worker(
    client: Client,
    endpoint: EndpointDescriptor,
    first_tick: Instant,
    period: Duration,
    deadline: Instant,
) -> WorkerSamples {
    let endpoint = Arc::new(endpoint);
    let mut samples = WorkerSamples::default();
    let mut in_flight: JoinSet<RequestOutcome> = JoinSet::new();
    let mut ticker = interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    let stop = sleep_until(deadline);
    tokio::pin!(stop);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            _ = ticker.tick() => {
                let client = client.clone();
                let endpoint = Arc::clone(&endpoint);
                in_flight.spawn(async move {
                    let sent = Instant::now();
                    let result = send_request(&client, &endpoint).await;
                    (result, sent.elapsed())
                });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => samples.record(joined),
        }
    }

    let drain_deadline = deadline + REQUEST_TIMEOUT;
    while let Ok(Some(joined)) = timeout_at(drain_deadline, in_flight.join_next()).await {
        samples.record(joined);
    }
    if !in_flight.is_empty() {
        warn!(abandoned = in_flight.len(), "Load requests still in flight after drain");
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_ok() -> String {
        serve_after(Duration::ZERO).await
    }

    async fn serve_after(reply_delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    tokio::time::sleep(reply_delay).await;
                    let _ = socket
                        .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok")
                        .await;
                });
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_percentile() {
        let samples: Vec<Duration> = (1..=100).map(Duration::from_millis).collect();
        assert_eq!(percentile(&samples, 0.50), Duration::from_millis(51));
        assert_eq!(percentile(&samples, 0.99), Duration::from_millis(99));
        assert_eq!(percentile(&[], 0.5), Duration::ZERO);
    }

    #[test]
    fn test_report_counts_and_summary() {
        let mut samples = WorkerSamples::default();
        samples.latencies = vec![Duration::from_millis(10), Duration::from_millis(30)];
        samples.status_codes.insert(200, 1);
        samples.status_codes.insert(503, 1);
        samples.transport_failures = 2;

        let report = LoadReport::from_samples(samples, Duration::from_secs(2));
        assert_eq!(report.requests, 4);
        assert_eq!(report.successes, 1);
        assert_eq!(report.transport_failures, 2);
        assert_eq!(report.mean_latency, Duration::from_millis(20));
        assert_eq!(report.max_latency, Duration::from_millis(30));
        assert!((report.achieved_rps - 2.0).abs() < f64::EPSILON);

        let summary = report.summary();
        assert!(summary.contains("Requests:      4"));
        assert!(summary.contains("200=1 503=1"));
    }

    #[tokio::test]
    async fn test_sustained_load_against_loopback() {
        let endpoint = EndpointDescriptor::new(serve_ok().await, "ksvc-0.bench.example.com");
        let generator = LoadGenerator::new(LoadSettings {
            rate: 20,
            workers: 2,
            duration: Duration::from_secs(1),
        })
        .unwrap();

        let report = generator.run(&endpoint).await;
        assert!(report.requests >= 5, "too few requests: {}", report.requests);
        assert!(report.requests <= 25, "too many requests: {}", report.requests);
        assert_eq!(report.successes, report.requests);
        assert_eq!(report.status_codes.get(&200).copied(), Some(report.requests));
    }

    #[tokio::test]
    async fn test_rate_holds_against_slow_server() {
        let endpoint =
            EndpointDescriptor::new(serve_after(Duration::from_millis(500)).await, "ksvc-0.bench.example.com");
        let generator = LoadGenerator::new(LoadSettings {
            rate: 20,
            workers: 2,
            duration: Duration::from_secs(3),
        })
        .unwrap();

        let report = generator.run(&endpoint).await;
        // 60 requests scheduled; replies arriving after the deadline are still counted
        assert!(report.requests >= 50, "only {} of 60 requests sent", report.requests);
        assert!(report.requests <= 62, "too many requests: {}", report.requests);
        assert_eq!(report.successes, report.requests);
        assert!(report.p50_latency >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_counts_failures() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let generator = LoadGenerator::new(LoadSettings {
            rate: 10,
            workers: 1,
            duration: Duration::from_millis(500),
        })
        .unwrap();

        let report = generator.run(&EndpointDescriptor::new(address, "ksvc-0")).await;
        assert!(report.transport_failures > 0);
        assert_eq!(report.successes, 0);
        assert!(report.status_codes.is_empty());
    }
}
