//! Figma REST API client
//!
//! Only the two endpoints the export needs are wrapped. The pipeline talks to the
//! API through the [`DesignApi`] trait so it can run against an in-memory document
//! in tests.

use crate::error::{Error, Result};
use crate::types::{FileResponse, ImageFormat, ImagesResponse};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Header carrying the personal access token
const TOKEN_HEADER: &str = "X-Figma-Token";

/// Remote source of documents and rendered images
#[async_trait]
pub trait DesignApi: Send + Sync {
    /// Fetch the full document tree of a file
    async fn get_file(&self, file_id: &str) -> Result<FileResponse>;

    /// Render the given nodes and return their image URLs
    async fn get_images(
        &self,
        file_id: &str,
        ids: &[String],
        scale: u32,
        format: ImageFormat,
    ) -> Result<ImagesResponse>;
}

/// Error body returned by the API on failure (`{"status": 403, "err": "Invalid token"}`)
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    err: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the Figma REST API
#[derive(Clone, Debug)]
pub struct FigmaClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl FigmaClient {
    /// Create a client for `base_url` (e.g. `https://api.figma.com/v1`)
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if `base_url` does not parse, or `Error::Network`
    /// if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        Url::parse(base_url)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn endpoint(&self, resource: &str, file_id: &str) -> Result<Url> {
        let raw = format!(
            "{}/{}/{}",
            self.base_url,
            resource,
            urlencoding::encode(file_id)
        );
        Ok(Url::parse(&raw)?)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(url = %url, "API request");
        let response = self
            .http
            .get(url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: ApiErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .err
                .or(body.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl DesignApi for FigmaClient {
    async fn get_file(&self, file_id: &str) -> Result<FileResponse> {
        let url = self.endpoint("files", file_id)?;
        self.get_json(url).await
    }

    async fn get_images(
        &self,
        file_id: &str,
        ids: &[String],
        scale: u32,
        format: ImageFormat,
    ) -> Result<ImagesResponse> {
        let mut url = self.endpoint("images", file_id)?;
        url.query_pairs_mut()
            .append_pair("ids", &ids.join(","))
            .append_pair("scale", &scale.to_string())
            .append_pair("format", format.as_str());

        let response: ImagesResponse = self.get_json(url).await?;
        if let Some(err) = response.err.as_deref().filter(|e| !e.is_empty()) {
            return Err(Error::Api {
                status: 200,
                message: err.to_string(),
            });
        }
        Ok(response)
    }
}
