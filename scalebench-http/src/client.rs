//! Shared request plumbing

use reqwest::header::{HeaderValue, HOST};
use reqwest::Client;
use scalebench_core::EndpointDescriptor;
use std::time::Duration;

use crate::errors::ProbeError;

const USER_AGENT: &str = concat!("scalebench/", env!("CARGO_PKG_VERSION"));

/// Build a client for probing workloads.
///
/// Redirects are not followed: a redirect is already an answer from the
/// workload, and following it would leave the resolved address.
pub fn build_client(request_timeout: Duration) -> Result<Client, ProbeError> {
    Client::builder()
        .timeout(request_timeout)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(ProbeError::ClientBuild)
}

/// Issue one GET to the endpoint address with its host header.
///
/// Any HTTP status counts as answered; only transport failures are errors.
pub async fn send_request(client: &Client, endpoint: &EndpointDescriptor) -> Result<u16, ProbeError> {
    let host = HeaderValue::from_str(&endpoint.host_header)
        .map_err(|_| ProbeError::InvalidHostHeader(endpoint.host_header.clone()))?;

    let response = client
        .get(&endpoint.address)
        .header(HOST, host)
        .send()
        .await
        .map_err(|source| ProbeError::Transport {
            address: endpoint.address.clone(),
            source,
        })?;

    Ok(response.status().as_u16())
}
