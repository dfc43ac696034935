use crate::gateway::traits::Transport;
use crate::gateway::types::{ApiRequest, ApiResponse, ClientConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, warn};

/// Transport backed by a pooled `reqwest` client
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", request.url))?;

        let status = response.status().as_u16();
        let response = response_from_parts(status, response.text().await);

        debug!("{} {} -> {} ({} bytes)", request.method, request.url, status, response.body.len());

        Ok(response)
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

/// A status was received, so this is a response even if the body was lost
/// on the way; the client then judges it by status alone.
fn response_from_parts<E: Display>(status: u16, body: Result<String, E>) -> ApiResponse {
    let body = body.unwrap_or_else(|e| {
        warn!("Failed to read body of {} response: {}", status, e);
        String::new()
    });
    ApiResponse { status, body }
}
