use anyhow::Result;
use futures::{Stream, StreamExt};
use reqwest::{header, redirect, Client};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::debug;
use url::Url;

use crate::error::FetchError;
use crate::mapping;
use crate::types::{CatalogResponse, RawCatalogEntry, Source, SourceResult};

/// Sent with every upstream request; several catalog hosts refuse non-browser agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const MAX_REDIRECTS: usize = 10;

/// Fans a keyword out to every source and merges the answers in completion order.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Clone)]
pub struct Aggregator {
    client: Client,
}

impl Aggregator {
    pub fn new() -> Result<Self> {
        let client = Client::builder().redirect(redirect::Policy::limited(MAX_REDIRECTS)).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self { Self { client } }

    /// Start one fetch per source and return a stream of the non-empty results.
    ///
    /// Results arrive in the order sources finish, not the order they are listed. Failed
    /// sources are logged and skipped. The stream ends once every fetch has settled;
    /// dropping it early aborts the fetches still in flight. Must be called from within
    /// a tokio runtime.
    ///
    /// Every search made through this `Aggregator` (and its clones) uses the same
    /// connection pool, so idle keep-alive connections outlive a single search. Build a
    /// fresh `Aggregator` per search if connections must be released when it ends.
    pub fn search(&self, keyword: &str, sources: &[Source], timeout: Duration) -> SearchStream {
        let (tx, rx) = mpsc::channel(sources.len().max(1));
        let mut tasks = JoinSet::new();
        for source in sources {
            let client = self.client.clone();
            let tx = tx.clone();
            let source = source.clone();
            let keyword = keyword.to_string();
            let timeout = source.timeout.map(Duration::from_secs).unwrap_or(timeout);
            tasks.spawn(async move {
                match fetch_one(&client, &source, &keyword, timeout).await {
                    Ok(result) => {
                        debug!(source = %source.name, titles = result.titles.len(), "source answered");
                        // receiver gone means the consumer lost interest; nothing to do
                        let _ = tx.send(result).await;
                    }
                    Err(e) => debug!(source = %source.name, error = %e, "source skipped"),
                }
            });
        }
        // the channel closes when the last task drops its sender
        drop(tx);
        SearchStream { rx, tasks }
    }

    /// Convenience for callers that want everything at once.
    pub async fn search_all(&self, keyword: &str, sources: &[Source], timeout: Duration) -> Vec<SourceResult> {
        self.search(keyword, sources, timeout).collect().await
    }

    pub async fn fetch_one(&self, source: &Source, keyword: &str, timeout: Duration) -> Result<SourceResult, FetchError> {
        fetch_one(&self.client, source, keyword, timeout).await
    }
}

/// Results of one search, yielded as each source completes.
///
/// Owns the fetch tasks: dropping the stream aborts any that are still running.
pub struct SearchStream {
    rx: mpsc::Receiver<SourceResult>,
    tasks: JoinSet<()>,
}

impl SearchStream {
    /// Abort outstanding fetches now instead of waiting for drop.
    pub fn cancel(&mut self) {
        self.tasks.abort_all();
        self.rx.close();
    }
}

impl Stream for SearchStream {
    type Item = SourceResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// `<base_url>?ac=detail&wd=<keyword>`, keeping any query the base url already has.
pub fn search_url(base_url: &str, keyword: &str) -> Result<Url, FetchError> {
    let mut url = Url::parse(base_url).map_err(|_| FetchError::InvalidUrl(base_url.to_string()))?;
    url.query_pairs_mut().append_pair("ac", "detail").append_pair("wd", keyword);
    Ok(url)
}

async fn fetch_one(client: &Client, source: &Source, keyword: &str, timeout: Duration) -> Result<SourceResult, FetchError> {
    let url = search_url(&source.base_url, keyword)?;
    let response = client
        .get(url)
        .header(header::USER_AGENT, USER_AGENT)
        .timeout(timeout)
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() { return Err(FetchError::Status(status)); }

    let body = response.bytes().await?;
    let catalog: CatalogResponse = serde_json::from_slice(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;
    if !catalog.is_ok() { return Err(FetchError::Malformed(format!("unexpected code {:?}", catalog.code))); }
    let list = match catalog.list {
        Some(list) if !list.is_empty() => list,
        _ => return Err(FetchError::Malformed("missing or empty list".to_string())),
    };

    // an entry that is not even an object is skipped like any other unusable entry
    let entries: Vec<RawCatalogEntry> = list.into_iter().filter_map(|v| serde_json::from_value(v).ok()).collect();
    let result = mapping::parse(&source.name, &entries);
    if result.is_empty() { return Err(FetchError::Empty); }
    Ok(result)
}
