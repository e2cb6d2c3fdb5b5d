use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::app::ports::SourceFetcherPort;
use crate::error::Result;

/// Fetches remote sources over HTTP(S). Non-2xx responses are errors.
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SourceFetcherPort for ReqwestFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.client.get(url).send().await?.error_for_status()?;
        let bytes = resp.bytes().await?.to_vec();
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}
