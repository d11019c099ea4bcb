//! WebHDFS client for the distributed store.
//!
//! Talks to the namenode's REST API. Data operations (CREATE, OPEN) are
//! two-step: the namenode answers with a 307 redirect to a datanode and the
//! payload moves in the second request, so the client is built with redirect
//! following disabled and handles the hop itself. Every request carries the
//! configured `user.name` principal and is bounded by the configured timeout.

use std::path::Path;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::header::LOCATION;
use reqwest::{Response, StatusCode};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::config::HdfsConfig;
use crate::error::{AppError, AppResult};
use crate::services::store::{ByteStream, DistributedStore};

/// WebHDFS client wrapper.
#[derive(Clone)]
pub struct HdfsClient {
    http: reqwest::Client,
    base: String,
    user: String,
}

impl HdfsClient {
    /// Create a new WebHDFS client from configuration.
    pub fn new(config: &HdfsConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::Storage(format!("Failed to build HDFS HTTP client: {}", e)))?;

        Ok(HdfsClient {
            http,
            base: config.url.trim_end_matches('/').to_string(),
            user: config.user.clone(),
        })
    }

    /// Build a WebHDFS operation URL for an absolute HDFS path.
    fn op_url(&self, path: &str, op: &str, params: &[(&str, &str)]) -> String {
        let encoded_path = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let mut url = format!(
            "{}/webhdfs/v1{}?op={}&user.name={}",
            self.base,
            encoded_path,
            op,
            urlencoding::encode(&self.user)
        );
        for (key, value) in params {
            url.push_str(&format!("&{}={}", key, value));
        }
        url
    }

    /// Extract the datanode location from a namenode 307 response.
    fn redirect_location(response: &Response, op: &str, path: &str) -> AppResult<String> {
        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                AppError::Storage(format!(
                    "HDFS {} for '{}' redirected without a Location header",
                    op, path
                ))
            })
    }

    /// Render a failed response into a storage error.
    async fn response_error(response: Response, op: &str, path: &str) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        AppError::Storage(format!(
            "HDFS {} for '{}' failed with {}: {}",
            op, path, status, body
        ))
    }
}

#[async_trait]
impl DistributedStore for HdfsClient {
    async fn status(&self, path: &str) -> AppResult<bool> {
        let url = self.op_url(path, "GETFILESTATUS", &[]);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("HDFS status request failed: {}", e)))?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::response_error(response, "GETFILESTATUS", path).await),
        }
    }

    async fn mkdirs(&self, path: &str) -> AppResult<()> {
        let url = self.op_url(path, "MKDIRS", &[]);
        let response = self
            .http
            .put(&url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("HDFS mkdirs request failed: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::response_error(response, "MKDIRS", path).await)
        }
    }

    async fn write(&self, path: &str, source: &Path) -> AppResult<()> {
        let url = self.op_url(path, "CREATE", &[("overwrite", "true")]);
        let response = self
            .http
            .put(&url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("HDFS create request failed: {}", e)))?;

        if response.status() != StatusCode::TEMPORARY_REDIRECT {
            return Err(Self::response_error(response, "CREATE", path).await);
        }
        let location = Self::redirect_location(&response, "CREATE", path)?;
        debug!("HDFS CREATE for '{}' redirected to datanode", path);

        let file = tokio::fs::File::open(source)
            .await
            .map_err(|e| AppError::FileSystem(format!("Failed to open staged file: {}", e)))?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let response = self
            .http
            .put(&location)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("HDFS write to datanode failed: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::response_error(response, "CREATE (data)", path).await)
        }
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let url = self.op_url(path, "OPEN", &[]);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("HDFS open request failed: {}", e)))?;

        // HttpFS gateways answer with the data directly; a namenode redirects.
        let response = if response.status() == StatusCode::TEMPORARY_REDIRECT {
            let location = Self::redirect_location(&response, "OPEN", path)?;
            self.http
                .get(&location)
                .send()
                .await
                .map_err(|e| AppError::Storage(format!("HDFS read from datanode failed: {}", e)))?
        } else {
            response
        };

        match response.status() {
            StatusCode::OK => {
                let stream = response
                    .bytes_stream()
                    .map_err(|e| AppError::Storage(format!("HDFS read stream error: {}", e)))
                    .boxed();
                Ok(stream)
            }
            StatusCode::NOT_FOUND => Err(AppError::NotFound(format!("HDFS file '{}'", path))),
            _ => Err(Self::response_error(response, "OPEN", path).await),
        }
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let url = self.op_url(path, "DELETE", &[("recursive", "false")]);
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("HDFS delete request failed: {}", e)))?;

        // A 200 with {"boolean": false} means the path was already gone,
        // which callers treat as success.
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::response_error(response, "DELETE", path).await)
        }
    }
}
