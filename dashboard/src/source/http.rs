use super::{
    ApiFuture,
    PingResponse,
    ProcessStatsResponse,
    Stats,
    StatsApi,
};
use eyre::{
    Context as _,
    Result,
};
use nanograph_config::Config;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// [`StatsApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStatsClient {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpStatsClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.server_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .wrap_err_with(|| format!("Invalid endpoint {path:?} for {}", self.base_url))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.endpoint(path, query)?;
        trace!(%url, "GET");
        self.client
            .get(url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .wrap_err_with(|| format!("Request to {url} failed"))?
            .json()
            .await
            .wrap_err_with(|| format!("Failed to parse response from {url}"))
    }
}

impl StatsApi for HttpStatsClient {
    fn stats(&self) -> ApiFuture<'_, Stats> {
        Box::pin(async move { self.get_json("stats", &[]).await })
    }

    fn ping<'a>(&'a self, host: &'a str) -> ApiFuture<'a, PingResponse> {
        Box::pin(async move { self.get_json("ping", &[("host", host)]).await })
    }

    fn process_stats<'a>(&'a self, pid: &'a str, include_children: bool) -> ApiFuture<'a, ProcessStatsResponse> {
        Box::pin(async move {
            let include_children = if include_children { "true" } else { "false" };
            self.get_json("process_stats", &[("pid", pid), ("include_children", include_children)])
                .await
        })
    }

    fn shutdown(&self) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            let url = self.endpoint("shutdown", &[])?;
            debug!(%url, "Asking stats service to shut down");
            self.client
                .post(url.clone())
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .wrap_err_with(|| format!("Request to {url} failed"))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client(base: &str) -> HttpStatsClient {
        HttpStatsClient::new(base.parse().unwrap(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn endpoints_are_joined_onto_the_base_url() {
        let client = client("http://127.0.0.1:8000");
        assert_eq!(client.endpoint("stats", &[]).unwrap().as_str(), "http://127.0.0.1:8000/stats");
        assert_eq!(
            client
                .endpoint("process_stats", &[("pid", "42"), ("include_children", "true")])
                .unwrap()
                .as_str(),
            "http://127.0.0.1:8000/process_stats?pid=42&include_children=true"
        );
    }

    #[test]
    fn query_values_are_encoded() {
        let client = client("http://localhost:8000/");
        assert_eq!(
            client.endpoint("ping", &[("host", "a b&c")]).unwrap().as_str(),
            "http://localhost:8000/ping?host=a+b%26c"
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error() {
        let client = client("http://127.0.0.1:9");
        assert!(client.stats().await.is_err());
    }
}
