use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::WeatherError;

/// Single-attempt HTTP GET with status validation.
///
/// Retries and fallbacks belong to the caller; this layer only reports what
/// happened.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }

    /// GET `url` and decode the JSON body into `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, url: &Url) -> Result<T, WeatherError> {
        let body = self.get_checked(url).await?.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            debug!(url = %redact(url), body = %truncate_body(&body), "undecodable response body");
            WeatherError::Decode(e.to_string())
        })
    }

    /// GET `url` and return the raw body.
    pub async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, WeatherError> {
        let bytes = self.get_checked(url).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn get_checked(&self, url: &Url) -> Result<reqwest::Response, WeatherError> {
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| WeatherError::connection(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(
                url = %redact(url),
                status = status.as_u16(),
                body = %truncate_body(&body),
                "request failed"
            );
            return Err(WeatherError::status(status.as_u16()));
        }

        Ok(res)
    }
}

/// A source of raw asset bytes (icons).
#[async_trait]
pub trait AssetSource: Send + Sync + std::fmt::Debug {
    async fn fetch_asset(&self, url: &Url) -> Result<Vec<u8>, WeatherError>;
}

#[async_trait]
impl AssetSource for HttpFetcher {
    async fn fetch_asset(&self, url: &Url) -> Result<Vec<u8>, WeatherError> {
        self.fetch_bytes(url).await
    }
}

/// Strip the credential from a URL before it reaches a log line.
pub(crate) fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "appid" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();

    if !pairs.is_empty() {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }

    shown.to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_hides_the_api_key() {
        let url = Url::parse("https://example.com/weather?q=Paris&appid=SECRET").unwrap();
        let shown = redact(&url);

        assert!(shown.contains("q=Paris"));
        assert!(!shown.contains("SECRET"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let cut = truncate_body(&long);

        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
