use anyhow::Context;
use std::time::Duration;

/// The shape of a robots.txt fetch, reduced to what the resolver actually
/// branches on. `ClientError`/`ServerError` capture the status-code
/// defaults (4xx -> unrestricted, 5xx -> disallow all) without forcing the
/// resolver to depend on any particular HTTP response type.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(Vec<u8>),
    ClientError,
    ServerError,
}

/// Retrieves the robots.txt body for an origin. Swappable so tests and
/// alternate deployments don't need a live HTTP client. Returns
/// [`FetchOutcome`] instead of a raw response so the status-code branching
/// lives in one place.
#[async_trait::async_trait]
pub trait RobotsFetcher: Send + Sync {
    async fn fetch(&self, origin: &str) -> Result<FetchOutcome, anyhow::Error>;
}

/// Default fetcher: `GET {origin}/robots.txt` with a 12-second timeout,
/// via `reqwest` over rustls.
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(12)).build().context("building robots.txt http client")?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl RobotsFetcher for ReqwestFetcher {
    async fn fetch(&self, origin: &str) -> Result<FetchOutcome, anyhow::Error> {
        let url = format!("{}/robots.txt", origin.trim_end_matches('/'));
        let resp = self.client.get(&url).send().await.with_context(|| format!("fetching {url}"))?;
        let status = resp.status();
        if status.is_client_error() {
            return Ok(FetchOutcome::ClientError);
        }
        if status.is_server_error() {
            return Ok(FetchOutcome::ServerError);
        }
        let body = resp.bytes().await.with_context(|| format!("reading body of {url}"))?;
        Ok(FetchOutcome::Success(body.to_vec()))
    }
}
