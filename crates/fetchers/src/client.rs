//! Shared upstream HTTP plumbing.

use std::time::Duration;

use hamclock_common::{FetchError, FetchResult};
use reqwest::Client;

/// Some upstreams refuse the default reqwest agent.
pub const BROWSER_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36";

/// Build the client every fetcher shares. Individual requests override
/// the timeout per feed (5-30 s).
pub fn build_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("hamclock-backend/0.1")
        .build()
        .expect("reqwest client")
}

pub(crate) fn map_reqwest(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = err.status() {
        FetchError::HttpStatus(status.as_u16())
    } else {
        FetchError::Parse(err.to_string())
    }
}

/// GET a text body with a per-request timeout.
pub async fn get_text(client: &Client, url: &str, timeout: Duration) -> FetchResult<String> {
    let resp = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(map_reqwest)?;
    if !resp.status().is_success() {
        return Err(FetchError::HttpStatus(resp.status().as_u16()));
    }
    resp.text().await.map_err(map_reqwest)
}

/// GET a binary body with a per-request timeout.
pub async fn get_bytes(client: &Client, url: &str, timeout: Duration) -> FetchResult<Vec<u8>> {
    let resp = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(map_reqwest)?;
    if !resp.status().is_success() {
        return Err(FetchError::HttpStatus(resp.status().as_u16()));
    }
    Ok(resp.bytes().await.map_err(map_reqwest)?.to_vec())
}

/// GET and deserialize a JSON body.
pub async fn get_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> FetchResult<T> {
    let text = get_text(client, url, timeout).await?;
    serde_json::from_str(&text).map_err(|e| FetchError::Parse(e.to_string()))
}
