use std::time::Duration;

use reqwest::{Client, Proxy, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::{NetError, Result};

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: Config,
}

impl HttpClient {
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));

        if let Some(socks_addr) = &config.socks_addr {
            let proxy_url = format!("socks5h://{}", socks_addr);
            let proxy = Proxy::all(&proxy_url)
                .map_err(|e| NetError::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        if !config.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| NetError::Config(format!("Failed to build client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub async fn get(&self, url: &str) -> Result<Response> {
        tracing::debug!("GET {}", url);
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| NetError::Http(format!("GET request failed: {}", e)))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get(url).await?;
        Self::read_json(response).await
    }

    pub async fn post<T: Serialize>(&self, url: &str, body: &T) -> Result<Response> {
        tracing::debug!("POST {}", url);
        self.client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| NetError::Http(format!("POST request failed: {}", e)))
    }

    pub async fn post_json<T: Serialize, R: DeserializeOwned>(&self, url: &str, body: &T) -> Result<R> {
        let response = self.post(url, body).await?;
        Self::read_json(response).await
    }

    /// Non-success statuses keep the response body so callers can recover a
    /// structured error payload from the peer.
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetError::Status {
                code: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .await
            .map_err(|e| NetError::Http(format!("JSON parse failed: {}", e)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
