use crate::error::PipelineError;
use crate::traits::LibraryApi;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const CLIENT_IDENTIFIER: &str = "plex2letterboxd";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct PlexHttpClient {
    client: Client,
    base_url: String,
    token: String,
}

impl PlexHttpClient {
    pub fn new(base_url: &str, token: String) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/xml"),
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-client-identifier"),
                    reqwest::header::HeaderValue::from_static(CLIENT_IDENTIFIER),
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-product"),
                    reqwest::header::HeaderValue::from_static(CLIENT_IDENTIFIER),
                );
                headers
            })
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_xml(&self, path: &str, query: &[(&str, &str)]) -> Result<String, PipelineError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(path, "Requesting Plex library endpoint");

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("X-Plex-Token", self.token.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Transport(format!(
                "GET {} returned HTTP {}",
                path, status
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl LibraryApi for PlexHttpClient {
    async fn fetch_sections(&self) -> Result<String, PipelineError> {
        self.get_xml("/library/sections", &[]).await
    }

    async fn fetch_section_items(&self, section_key: &str) -> Result<String, PipelineError> {
        let path = format!("/library/sections/{}/all", section_key);
        self.get_xml(&path, &[("includeGuids", "1")]).await
    }
}
