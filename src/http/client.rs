use anyhow::{Context, Result};
use reqwest::header::{IF_MATCH, IF_NONE_MATCH};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use std::time::Duration;
use urlencoding::encode;

use crate::config::RemoteSettings;

/// Condition a PUT is made under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Create or replace
    None,
    /// Only if no document with the id exists (`If-None-Match: *`)
    Absent,
    /// Only if the document exists (`If-Match: *`)
    Present,
}

/// HTTP client for the document server's `/v1` API
pub struct DocumentClient {
    client: Client,
    base_url: String,
}

impl DocumentClient {
    pub fn new(settings: &RemoteSettings) -> Result<Self> {
        let client = Self::build_client(settings.user_agent, settings.timeout_secs)?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_client(user_agent: &str, timeout_secs: u64) -> Result<Client> {
        Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/v1/{}", self.base_url, encode(collection))
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), encode(id))
    }

    pub async fn list(&self, collection: &str) -> Result<Response> {
        let url = self.collection_url(collection);
        self.send(self.client.get(&url), &url).await
    }

    pub async fn get(&self, collection: &str, id: &str) -> Result<Response> {
        let url = self.document_url(collection, id);
        self.send(self.client.get(&url), &url).await
    }

    pub async fn put<T: Serialize + ?Sized>(
        &self,
        collection: &str,
        id: &str,
        body: &T,
        precondition: Precondition,
    ) -> Result<Response> {
        let url = self.document_url(collection, id);
        let request = self.client.put(&url).json(body);
        let request = match precondition {
            Precondition::None => request,
            Precondition::Absent => request.header(IF_NONE_MATCH, "*"),
            Precondition::Present => request.header(IF_MATCH, "*"),
        };
        self.send(request, &url).await
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<Response> {
        let url = self.document_url(collection, id);
        self.send(self.client.delete(&url), &url).await
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))
    }
}
