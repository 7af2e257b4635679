use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::{ApiConfig, ConfigError, BASE_URL_VAR};
use crate::models::{ItemResponse, ListParams, ListResponse, StatusChangeRequest};
use super::errors::RepositoryError;
use super::resource::ResourceRepositoryTrait;

/// Path suffix of the status toggle endpoint of every collection
pub const CHANGE_STATUS_SEGMENT: &str = "change-status";

/// Error body the backend sends with non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Option<serde_json::Map<String, Value>>,
}

/// REST transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpResourceRepository {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpResourceRepository {
    /// Build the HTTP client described by `config`
    pub fn new(config: &ApiConfig) -> Result<Self, RepositoryError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        // A trailing slash keeps the last base segment when joining resource paths
        let base = if config.base_url.ends_with('/') {
            config.base_url.clone()
        } else {
            format!("{}/", config.base_url)
        };
        let base_url = Url::parse(&base).map_err(|e| ConfigError::InvalidValue {
            name: BASE_URL_VAR.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
        })
    }

    /// Resolve a resource path (optionally followed by more segments) against the base URL
    fn endpoint(&self, path: &str, tail: Option<&str>) -> Result<Url, RepositoryError> {
        let mut relative = path.trim_matches('/').to_string();
        if let Some(tail) = tail {
            relative.push('/');
            relative.push_str(tail);
        }

        self.base_url
            .join(&relative)
            .map_err(|e| RepositoryError::Transport(format!("invalid endpoint '{}': {}", relative, e)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send the request and return the JSON body, `None` for an empty 2xx body
    async fn execute(&self, request: RequestBuilder) -> Result<Option<Value>, RepositoryError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.bytes().await?;

        if !status.is_success() {
            let error = error_from_body(status, &body);
            warn!("{} responded with {}: {}", url, status, error);
            return Err(error);
        }

        debug!("{} responded with {} ({} bytes)", url, status, body.len());

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&body)?))
    }

    async fn execute_item(&self, request: RequestBuilder) -> Result<ItemResponse<Value>, RepositoryError> {
        let body = self
            .execute(request)
            .await?
            .ok_or_else(|| RepositoryError::Decode("empty response body".to_string()))?;
        Ok(serde_json::from_value(body)?)
    }
}

#[async_trait]
impl ResourceRepositoryTrait for HttpResourceRepository {
    async fn fetch_page(
        &self,
        path: &str,
        params: &ListParams,
    ) -> Result<ListResponse<Value>, RepositoryError> {
        let url = self.endpoint(path, None)?;
        debug!("GET {} with {:?}", url, params);

        let body = self
            .execute(self.http.get(url).query(&params.to_query_pairs()))
            .await?
            .ok_or_else(|| RepositoryError::Decode("empty response body".to_string()))?;
        Ok(serde_json::from_value(body)?)
    }

    async fn fetch_one(&self, path: &str, id: u64) -> Result<ItemResponse<Value>, RepositoryError> {
        let url = self.endpoint(path, Some(&id.to_string()))?;
        debug!("GET {}", url);
        self.execute_item(self.http.get(url)).await
    }

    async fn create(&self, path: &str, item: Value) -> Result<ItemResponse<Value>, RepositoryError> {
        let url = self.endpoint(path, None)?;
        debug!("POST {}", url);
        self.execute_item(self.http.post(url).json(&item)).await
    }

    async fn update(
        &self,
        path: &str,
        id: u64,
        item: Value,
    ) -> Result<ItemResponse<Value>, RepositoryError> {
        let url = self.endpoint(path, Some(&id.to_string()))?;
        debug!("PUT {}", url);
        self.execute_item(self.http.put(url).json(&item)).await
    }

    async fn change_status(
        &self,
        path: &str,
        request: StatusChangeRequest,
    ) -> Result<Option<Value>, RepositoryError> {
        let url = self.endpoint(path, Some(CHANGE_STATUS_SEGMENT))?;
        debug!("POST {} for id {}", url, request.id);

        let body = self.execute(self.http.post(url).json(&request)).await?;
        Ok(body.and_then(|mut body| body.get_mut("data").map(Value::take)))
    }
}

/// Turn a non-2xx response into the matching error variant
fn error_from_body(status: StatusCode, body: &[u8]) -> RepositoryError {
    let parsed: Option<ErrorBody> = serde_json::from_slice(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|body| body.message.clone())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    match status {
        StatusCode::UNPROCESSABLE_ENTITY => {
            let details = parsed
                .and_then(|body| body.errors)
                .map(|errors| {
                    errors
                        .iter()
                        .map(|(field, messages)| format!("{}: {}", field, join_messages(messages)))
                        .collect::<Vec<String>>()
                        .join("; ")
                })
                .filter(|details| !details.is_empty());
            RepositoryError::Validation(details.unwrap_or(message))
        }
        StatusCode::NOT_FOUND => RepositoryError::NotFound(message),
        _ => RepositoryError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

fn join_messages(messages: &Value) -> String {
    match messages {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()))
            .collect::<Vec<String>>()
            .join(", "),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
