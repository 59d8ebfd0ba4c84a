//! Cold-start detection probe

use reqwest::Client;
use scalebench_core::EndpointDescriptor;
use scalebench_resilience::{RetryError, RetryExecutor, RetryPolicy};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::client::{build_client, send_request};
use crate::config::ColdStartSettings;
use crate::errors::ProbeError;

/// Outcome of a probe that reached the workload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeAnswer {
    /// HTTP status of the first answer
    pub status: u16,
    pub attempts: u32,
    /// Time from the first attempt to the answer
    pub elapsed: Duration,
}

/// Repeats a single request until the workload answers.
///
/// Transport errors are retried `max_retries` times, `request_interval`
/// apart. The whole probe is bounded by `request_timeout` regardless of
/// how many attempts remain.
#[derive(Debug, Clone)]
pub struct ColdStartProbe {
    client: Client,
    retry: RetryExecutor,
    request_timeout: Duration,
}

impl ColdStartProbe {
    pub fn new(settings: &ColdStartSettings) -> Result<Self, ProbeError> {
        Ok(Self {
            client: build_client(settings.request_timeout)?,
            retry: RetryExecutor::new(RetryPolicy::fixed(
                settings.max_retries,
                settings.request_interval,
            )),
            request_timeout: settings.request_timeout,
        })
    }

    pub async fn run(&self, endpoint: &EndpointDescriptor) -> Result<ProbeAnswer, ProbeError> {
        let start = Instant::now();
        debug!(address = %endpoint.address, host = %endpoint.host_header, "Starting cold-start probe");

        let attempt = self.retry.execute_with_context(|attempt| async move {
            send_request(&self.client, endpoint).await.map(|status| (status, attempt))
        });

        match tokio::time::timeout(self.request_timeout, attempt).await {
            Ok(Ok((status, attempts))) => {
                let elapsed = start.elapsed();
                info!(
                    address = %endpoint.address,
                    host = %endpoint.host_header,
                    status,
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Workload answered"
                );
                Ok(ProbeAnswer {
                    status,
                    attempts,
                    elapsed,
                })
            }
            Ok(Err(RetryError::MaxAttemptsExceeded { attempts, last_error })) => Err(ProbeError::Exhausted {
                endpoint: endpoint.to_string(),
                attempts,
                last_error: last_error.to_string(),
            }),
            Ok(Err(RetryError::NonRetryable(e))) => Err(e),
            Err(_) => Err(ProbeError::Timeout {
                endpoint: endpoint.to_string(),
                timeout: self.request_timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `status` to every connection after hanging up on the first `drop_first`
    async fn serve(status: &'static str, drop_first: usize) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                let n = seen_clone.fetch_add(1, Ordering::SeqCst);
                if n < drop_first {
                    drop(socket);
                    continue;
                }
                let mut buf = [0u8; 4096];
                let read = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..read]).to_ascii_lowercase();
                let status = if request.contains("host: ksvc-0.bench.example.com") {
                    status
                } else {
                    "421 Misdirected Request"
                };
                let response = format!("HTTP/1.1 {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n", status);
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        (format!("http://{}", addr), seen)
    }

    fn settings(max_retries: u32) -> ColdStartSettings {
        ColdStartSettings {
            max_retries,
            request_interval: Duration::from_millis(50),
            request_timeout: Duration::from_secs(2),
        }
    }

    #[tokio::test]
    async fn test_answer_with_host_header() {
        let (address, _) = serve("200 OK", 0).await;
        let endpoint = EndpointDescriptor::new(address, "ksvc-0.bench.example.com");

        let answer = ColdStartProbe::new(&settings(3)).unwrap().run(&endpoint).await.unwrap();
        assert_eq!(answer.status, 200);
        assert_eq!(answer.attempts, 1);
    }

    #[tokio::test]
    async fn test_error_status_counts_as_answered() {
        let (address, _) = serve("503 Service Unavailable", 0).await;
        let endpoint = EndpointDescriptor::new(address, "ksvc-0.bench.example.com");

        let answer = ColdStartProbe::new(&settings(3)).unwrap().run(&endpoint).await.unwrap();
        assert_eq!(answer.status, 503);
    }

    #[tokio::test]
    async fn test_retries_until_answered() {
        let (address, seen) = serve("200 OK", 2).await;
        let endpoint = EndpointDescriptor::new(address, "ksvc-0.bench.example.com");

        let answer = ColdStartProbe::new(&settings(5)).unwrap().run(&endpoint).await.unwrap();
        assert_eq!(answer.attempts, 3);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_names_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let endpoint = EndpointDescriptor::new(address.clone(), "ksvc-0.bench.example.com");

        let err = ColdStartProbe::new(&settings(3)).unwrap().run(&endpoint).await.unwrap_err();
        match &err {
            ProbeError::Exhausted { attempts, .. } => assert_eq!(*attempts, 3),
            other => panic!("expected exhausted, got {other:?}"),
        }
        assert!(err.to_string().contains(&address));
        assert!(err.to_string().contains("ksvc-0.bench.example.com"));
    }

    #[tokio::test]
    async fn test_timeout_bounds_the_probe() {
        // Accepts connections but never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let endpoint = EndpointDescriptor::new(address, "ksvc-0.bench.example.com");
        let probe = ColdStartProbe::new(&ColdStartSettings {
            max_retries: 100,
            request_interval: Duration::from_millis(10),
            request_timeout: Duration::from_millis(300),
        })
        .unwrap();

        let started = std::time::Instant::now();
        let err = probe.run(&endpoint).await.unwrap_err();
        assert!(matches!(err, ProbeError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
