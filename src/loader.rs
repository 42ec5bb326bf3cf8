use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

/// Abstract asynchronous content loader for remotely-fetched dialog
/// fragments: a GET returning HTML or failing.
///
/// Transport failures never cross the module boundary as errors; the
/// service reports them exclusively through the ajax notifications.
#[async_trait]
pub trait ContentLoader: Send + Sync {
    async fn get(&self, url: &str) -> Result<String>;
}

/// Default loader over a pooled HTTP client.
pub struct HttpLoader {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpLoader {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("dockedmodal/0.1")
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            timeout: Duration::from_secs(60),
        }
    }

    /// Use a preconfigured client (custom proxies, headers, pools).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentLoader for HttpLoader {
    async fn get(&self, url: &str) -> Result<String> {
        let fetch = async {
            let response = self.client.get(url).send().await?.error_for_status()?;
            Ok::<String, reqwest::Error>(response.text().await?)
        };
        let html = tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| anyhow!("GET {url} timed out"))??;
        log::debug!("fetched {} bytes from {url}", html.len());
        Ok(html)
    }
}
