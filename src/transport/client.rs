//! `reqwest`-backed transport.

use crate::config::SwiftConfig;
use crate::errors::{SwiftError, SwiftResult};
use crate::transport::{Request, Response, Transport};
use async_trait::async_trait;
use http::HeaderValue;
use reqwest::{Client, Url};
use tracing::{debug, error};

pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Sends requests to a Swift endpoint over HTTP(S).
///
/// Path segments are percent-encoded individually, so object names may carry
/// spaces, `?` or `#` while `/` keeps separating pseudo-directories.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    base_url: String,
    auth_token: Option<HeaderValue>,
}

impl HttpTransport {
    pub fn new(config: &SwiftConfig) -> SwiftResult<Self> {
        let base_url = config.storage_url.trim_end_matches('/').to_string();
        let endpoint = Url::parse(&base_url)
            .map_err(|err| SwiftError::Config(format!("storage url `{}`: {}", base_url, err)))?;
        if endpoint.cannot_be_a_base() {
            return Err(SwiftError::Config(format!(
                "storage url `{}` cannot carry a path",
                base_url
            )));
        }

        let auth_token = config
            .auth_token
            .as_deref()
            .map(|token| {
                let mut value = HeaderValue::from_str(token)
                    .map_err(|_| SwiftError::InvalidHeader(AUTH_TOKEN_HEADER.to_string()))?;
                value.set_sensitive(true);
                Ok::<_, SwiftError>(value)
            })
            .transpose()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| SwiftError::Config(format!("building http client: {}", err)))?;

        Ok(Self {
            client,
            endpoint,
            base_url,
            auth_token,
        })
    }

    /// Absolute URL for a path relative to the endpoint.
    ///
    /// URL parsing resolves `.` and `..` segments, even percent-encoded ones,
    /// so paths containing them would reach a different resource. They are
    /// refused instead.
    fn url(&self, path: &str) -> SwiftResult<Url> {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        if segments.iter().any(|segment| matches!(*segment, "." | "..")) {
            return Err(SwiftError::UnaddressablePath(path.to_string()));
        }

        let mut url = self.endpoint.clone();
        if let Ok(mut url_segments) = url.path_segments_mut() {
            url_segments.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: Request) -> SwiftResult<Response> {
        debug!("{}", request);

        let Request {
            method,
            path,
            query,
            headers,
            body,
        } = request;

        let url = self.url(&path)?;
        let mut builder = self.client.request(method.clone(), url).headers(headers);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(token) = &self.auth_token {
            builder = builder.header(AUTH_TOKEN_HEADER, token.clone());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(source) => {
                error!("{} {} failed: {}", method, path, source);
                return Err(SwiftError::Transport {
                    method,
                    path,
                    source,
                });
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|source| SwiftError::Transport {
                method: method.clone(),
                path: path.clone(),
                source,
            })?;

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
