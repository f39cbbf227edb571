//! Thin JSON client for the inventory REST API.

use std::time::Duration;

use reqwest::{Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::AppConfig,
    session::SessionHandle,
    validation::{FieldErrors, FORM_FIELD},
    Error, Result,
};

/// HTTP client bound to one API base URL and the current session.
///
/// Every request takes a fresh [`Credentials`](crate::session::Credentials)
/// snapshot and sends it as a bearer token. Failures are logged here, once,
/// and then handed to the caller untouched.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionHandle,
}

impl ApiClient {
    /// Build a client from configuration, reading credentials from `session`.
    pub fn new(config: &AppConfig, session: SessionHandle) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session this client reads credentials from.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// `GET path`, decoding the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        require_body(path, read_json(response).await?)
    }

    /// `POST path` with a JSON body, decoding the JSON response.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, Some(body)).await?;
        require_body(path, read_json(response).await?)
    }

    /// `POST path`, tolerating an empty response body.
    pub async fn post_optional<B, T>(&self, path: &str, body: &B) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, Some(body)).await?;
        read_json(response).await
    }

    /// `PUT path` with a JSON body, decoding the JSON response.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PUT, path, Some(body)).await?;
        require_body(path, read_json(response).await?)
    }

    /// `DELETE path`, ignoring any response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(credentials) = self.session.credentials() {
            request = request.bearer_auth(credentials.token());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%method, path, error = %err, "API request failed");
                return Err(Error::Network(err));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(%method, path, status = status.as_u16(), "API request completed");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = error_from_response(status, &body);
        warn!(%method, path, status = status.as_u16(), error = %error, "API error");
        Err(error)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<Option<T>> {
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&body)?))
}

fn require_body<T>(path: &str, body: Option<T>) -> Result<T> {
    body.ok_or_else(|| Error::Server {
        status: StatusCode::NO_CONTENT.as_u16(),
        message: format!("empty response from {path}"),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<Value>,
}

/// Map a non-success response onto the error taxonomy.
pub(crate) fn error_from_response(status: StatusCode, body: &str) -> Error {
    let payload: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = payload
        .detail
        .as_ref()
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| payload.message.clone())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(message),
        StatusCode::NOT_FOUND => Error::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            let mut errors = FieldErrors::new();
            for source in [payload.errors.as_ref(), payload.detail.as_ref()]
                .into_iter()
                .flatten()
            {
                collect_field_errors(source, &mut errors);
            }
            if errors.is_empty() {
                errors.insert(FORM_FIELD, message);
            }
            Error::Validation(errors)
        }
        _ => Error::Server {
            status: status.as_u16(),
            message,
        },
    }
}

/// Accepts `{field: msg | [msg]}` maps and `[{field|path|param|loc, message|msg}]` lists.
fn collect_field_errors(source: &Value, errors: &mut FieldErrors) {
    match source {
        Value::Object(map) => {
            for (field, value) in map {
                if let Some(message) = first_message(value) {
                    errors.insert(field.as_str(), message);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                if let (Some(field), Some(message)) = (field_name(item), first_message(item)) {
                    errors.insert(field, message);
                }
            }
        }
        _ => {}
    }
}

fn field_name(item: &Value) -> Option<String> {
    ["field", "path", "param"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| {
            item.get("loc")
                .and_then(Value::as_array)
                .and_then(|loc| loc.iter().rev().find_map(Value::as_str))
                .map(str::to_string)
        })
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(message) => Some(message.clone()),
        Value::Array(items) => items.iter().find_map(first_message),
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
