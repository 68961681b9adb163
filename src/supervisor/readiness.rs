//! Readiness polling against the server's root endpoint.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::sleep;

use crate::error::LaunchError;

/// Result of a single readiness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Ready,
    NotReady(String),
}

impl ProbeResult {
    pub fn is_ready(&self) -> bool {
        matches!(self, ProbeResult::Ready)
    }
}

/// Something that can tell whether the server is up.
pub trait HealthProbe {
    fn probe(&self) -> impl Future<Output = ProbeResult>;
}

/// Probes with an HTTP GET; only a 200 counts as ready.
pub struct HttpProbe {
    client: Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: String, request_timeout: Duration) -> Result<Self, LaunchError> {
        let client = Client::builder()
            .connect_timeout(request_timeout)
            .timeout(request_timeout)
            .no_proxy()
            .build()?;
        Ok(Self { client, url })
    }
}

impl HealthProbe for HttpProbe {
    async fn probe(&self) -> ProbeResult {
        match self.client.get(&self.url).send().await {
            Ok(response) if response.status() == StatusCode::OK => ProbeResult::Ready,
            Ok(response) => ProbeResult::NotReady(format!("status {}", response.status())),
            Err(e) => ProbeResult::NotReady(e.to_string()),
        }
    }
}

/// Fixed-delay bounded retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

/// Probes until the server is ready, returning the attempt that succeeded.
///
/// `on_attempt` sees every probe result. There is no sleep after the last
/// attempt, so a server that never comes up costs at most
/// `max_attempts * (request timeout + interval)`.
pub async fn wait_until_ready<P, F>(
    probe: &P,
    policy: RetryPolicy,
    mut on_attempt: F,
) -> Result<u32, LaunchError>
where
    P: HealthProbe,
    F: FnMut(u32, &ProbeResult),
{
    for attempt in 1..=policy.max_attempts {
        let result = probe.probe().await;
        tracing::debug!(attempt, max = policy.max_attempts, ?result, "readiness probe");
        on_attempt(attempt, &result);

        if result.is_ready() {
            return Ok(attempt);
        }
        if attempt < policy.max_attempts {
            sleep(policy.interval).await;
        }
    }

    Err(LaunchError::ReadinessTimeout {
        attempts: policy.max_attempts,
    })
}
