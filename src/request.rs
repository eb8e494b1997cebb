//! Request construction
//!
//! Builds the [`RequestTemplate`] shared by every request of a run: one HTTP client, the
//! method, the fully composed target URL and the configured headers. The executor only
//! adds the per-item body.

use crate::config::{Config, TransportConfig};
use crate::error::{Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

/// Reusable request description for one run
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    client: Client,
    method: Method,
    url: Url,
    headers: HeaderMap,
    request_type: HeaderValue,
}

impl RequestTemplate {
    /// Build the template described by `config`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unparseable endpoint, method or header, and
    /// [`Error::Network`] if the HTTP client cannot be initialized.
    pub fn from_config(config: &Config) -> Result<Self> {
        let url = compose_url(
            &config.endpoint,
            config.resource.as_deref(),
            &config.query_params,
        )?;
        let method = parse_method(&config.method)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value("response_type", &config.response_type)?);
        for (name, value) in &config.headers {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::config("headers", format!("invalid header name '{name}': {e}")))?;
            headers.insert(header, header_value("headers", value)?);
            debug!(header = %name, value = %value, "header");
        }

        let request_type = header_value("request_type", &config.request_type)?;
        let client = build_client(&config.transport)?;

        Ok(Self {
            client,
            method,
            url,
            headers,
            request_type,
        })
    }

    /// The request method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The composed target URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Headers sent with every request
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Request carrying `body`, typed with the configured request content-type
    pub fn with_body(&self, body: Vec<u8>) -> RequestBuilder {
        let mut headers = self.headers.clone();
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, self.request_type.clone());
        }
        self.client
            .request(self.method.clone(), self.url.clone())
            .headers(headers)
            .body(body)
    }

    /// Request without a body
    pub fn without_body(&self) -> RequestBuilder {
        self.client
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone())
    }
}

/// Compose endpoint, resource path and query parameters into one URL
///
/// Exactly one `/` separates the endpoint path from the resource. Query pairs embedded
/// in the resource come first, followed by `query` in map order.
pub fn compose_url(
    endpoint: &str,
    resource: Option<&str>,
    query: &BTreeMap<String, String>,
) -> Result<Url> {
    let mut url = Url::parse(endpoint.trim())
        .map_err(|e| Error::config("endpoint", format!("invalid endpoint '{endpoint}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::config(
            "endpoint",
            format!("endpoint '{endpoint}' cannot carry a resource path"),
        ));
    }

    if let Some(resource) = resource.map(str::trim).filter(|r| !r.is_empty()) {
        debug!(resource, "setting resource");
        let (path, embedded_query) = match resource.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (resource, None),
        };

        let joined = join_path(url.path(), path);
        url.set_path(&joined);

        if let Some(embedded) = embedded_query.filter(|q| !q.is_empty()) {
            let merged = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{embedded}"),
                _ => embedded.to_string(),
            };
            url.set_query(Some(&merged));
        }
    }

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
            debug!(param = %key, value = %value, "query parameter");
        }
    }

    Ok(url)
}

fn join_path(base: &str, resource: &str) -> String {
    let resource = resource.trim_start_matches('/');
    if resource.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), resource)
}

fn parse_method(method: &str) -> Result<Method> {
    let normalized = method.trim().to_ascii_uppercase();
    Method::from_bytes(normalized.as_bytes())
        .map_err(|e| Error::config("method", format!("invalid method '{method}': {e}")))
}

fn header_value(key: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::config(key, format!("invalid header value '{value}': {e}")))
}

fn build_client(transport: &TransportConfig) -> Result<Client> {
    let redirect = if transport.follow_redirects {
        reqwest::redirect::Policy::limited(transport.max_redirects)
    } else {
        reqwest::redirect::Policy::none()
    };

    let mut builder = Client::builder()
        .redirect(redirect)
        .danger_accept_invalid_certs(transport.accept_invalid_certs);
    if let Some(timeout) = transport.timeout {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}
