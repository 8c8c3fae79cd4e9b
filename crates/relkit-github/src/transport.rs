use relkit_core::GithubConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::form_urlencoded;

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to build HTTP client")]
    Client { source: reqwest::Error },

    #[error("{method} {url} failed")]
    Request {
        method: Method,
        url: String,
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(serde_json::Value),
    Bytes {
        content_type: String,
        data: Vec<u8>,
    },
}

/// Percent-encode each `/`-separated segment of `path`, keeping the slashes.
///
/// `#`, `?` and `%` are legal in branch and file names but not in a URL path.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn encode_segment(segment: &str) -> String {
    // form encoding writes spaces as `+`; a literal `+` is already `%2B`
    form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// `k=v&…` with form-encoded keys and values, without the leading `?`.
pub fn query_string(pairs: &[(&str, &str)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// A GitHub REST call.
///
/// `url` is either relative to the API root (`repos/acme/api/git/refs`) or
/// absolute (release upload URLs live on a different host).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Body,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: Body::Empty,
        }
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            url: url.into(),
            body: Body::Empty,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Body::Empty,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Body::Json(body),
        }
    }

    pub fn put_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Put,
            url: url.into(),
            body: Body::Json(body),
        }
    }

    pub fn post_bytes(url: impl Into<String>, content_type: &str, data: Vec<u8>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Body::Bytes {
                content_type: content_type.to_owned(),
                data,
            },
        }
    }

    /// JSON body, if any.
    pub fn json(&self) -> Option<&serde_json::Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Status and raw body of a response.
///
/// Non-2xx statuses are not transport errors: 404 and 409 carry meaning
/// for the callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// Abstraction over HTTP calls to the GitHub API for testability.
///
/// Production code uses [`HttpTransport`], tests use mockall-generated mocks
/// or in-memory fakes.
#[allow(async_fn_in_trait)]
pub trait GithubTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// reqwest-backed transport authenticated with a bearer token.
pub struct HttpTransport {
    client: reqwest::Client,
    api_url: String,
    token: SecretString,
}

impl HttpTransport {
    pub fn new(config: &GithubConfig, token: SecretString) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::Client { source: e })?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            token,
        })
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("https://") || url.starts_with("http://") {
            url.to_owned()
        } else {
            format!("{}/{}", self.api_url, url.trim_start_matches('/'))
        }
    }
}

impl GithubTransport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.resolve(&request.url);
        let method = request.method;

        let builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        let builder = builder
            .bearer_auth(self.token.expose_secret())
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION);

        let builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Bytes { content_type, data } => builder
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(data),
        };

        let to_error = |e| TransportError::Request {
            method,
            url: url.clone(),
            source: e,
        };

        let response = builder.send().await.map_err(to_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(to_error)?;

        tracing::debug!(%method, %url, status, "github api call");
        Ok(ApiResponse { status, body })
    }
}
