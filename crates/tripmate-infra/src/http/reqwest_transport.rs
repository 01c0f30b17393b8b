//! ReqwestTransport -- concrete [`HttpTransport`] over `reqwest`.
//!
//! The client owns a cookie jar, which is where the server's HTTP-only
//! refresh cookie lives. Nothing above this layer reads or writes it; the
//! jar can only be exported and re-imported as an opaque string so a
//! session survives process restarts.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::AUTHORIZATION;

use tripmate_core::http::{ApiRequest, HttpTransport, Method, RawResponse};
use tripmate_types::error::{ConfigError, HttpError};

pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    /// Cookies are scoped to this URL when exported and re-imported.
    cookie_url: Url,
    jar: Arc<Jar>,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let cookie_url = Url::parse(&format!("{base_url}/auth/refresh"))
            .map_err(|_| ConfigError::InvalidUrl(base_url.clone()))?;
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            cookie_url,
            jar,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The cookies the server would receive on a refresh call, as a
    /// `name=value; name2=value2` string.
    pub fn export_cookies(&self) -> Option<String> {
        let header = self.jar.cookies(&self.cookie_url)?;
        header.to_str().ok().map(str::to_string)
    }

    /// Re-import cookies produced by [`export_cookies`](Self::export_cookies).
    pub fn import_cookies(&self, cookies: &str) {
        for pair in cookies.split(';').map(str::trim).filter(|p| p.contains('=')) {
            self.jar.add_cookie_str(pair, &self.cookie_url);
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> impl std::future::Future<Output = Result<RawResponse, HttpError>> + Send {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, self.url(&request.path));
        if let Some(bearer) = bearer {
            builder = builder.header(AUTHORIZATION, bearer);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let request_id = request.id;

        async move {
            let response = builder.send().await.map_err(|e| {
                tracing::debug!(%request_id, error = %e, "no response from server");
                HttpError::Network(e.to_string())
            })?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| HttpError::Network(e.to_string()))?;
            tracing::debug!(%request_id, status, bytes = body.len(), "response received");
            Ok(RawResponse::new(status, body.to_vec()))
        }
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}
