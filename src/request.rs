use std::time::Duration;

use reqwest::Client;

use crate::Result;

/// What came back for one accession.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page HTML.
    Page(String),
    /// The request didn't succeed. Holds a human readable reason.
    Failed(String),
}

/// Source of BioSample pages, one accession at a time.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(&self, accession: &str) -> FetchOutcome;
}

/// Fetches `<base_url>?term=<accession>` over HTTP.
#[derive(Debug, Clone)]
pub struct NcbiClient {
    client: Client,
    base_url: String,
}

impl NcbiClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Requests a page and returns a `Result<String>` containing the HTML.
    /// Non-2xx statuses are errors.
    async fn request_page_html(&self, accession: &str) -> Result<String> {
        let res = self
            .client
            .get(&self.base_url)
            .query(&[("term", accession)])
            .send()
            .await?
            .error_for_status()?;
        let html = res.text().await?;
        Ok(html)
    }
}

impl PageSource for NcbiClient {
    async fn fetch_page(&self, accession: &str) -> FetchOutcome {
        match self.request_page_html(accession).await {
            Ok(html) => FetchOutcome::Page(html),
            Err(e) => FetchOutcome::Failed(e.to_string()),
        }
    }
}
