//! REST record store backed by `reqwest`.
//!
//! Routes follow the backend's Express layout:
//! `POST /<resource>`, `PUT /<resource>/<id>`, `GET /<resource>/<id>` and
//! `GET /<resource>` relative to the configured base url (usually
//! `http://localhost:5000/api`).
//!
//! Error mapping:
//! - connection problems and timeouts become `PersistenceError::Transport`
//! - `404` on a single record becomes `PersistenceError::NotFound`
//! - any other non-2xx status becomes `PersistenceError::Rejected`, carrying
//!   the server's `message` field when the body has one

use std::time::Duration;

use field_gate::prelude::*;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid api base url `{0}` (expected http:// or https://)")]
    BaseUrl(String),
    #[error(transparent)]
    Build(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    client: Client,
    base_url: String,
}

impl HttpRecordStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::BaseUrl(base_url));
        }
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(concat!("farm-records/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, resource: &str, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{}/{}/{}", self.base_url, resource, id),
            None => format!("{}/{}", self.base_url, resource),
        }
    }

    async fn send(&self, request: RequestBuilder, id: Option<&str>) -> Result<Response, PersistenceError> {
        let response = request.send().await.map_err(|error| {
            warn!(%error, "request to record store failed");
            if error.is_timeout() {
                PersistenceError::Transport("the server did not answer in time".into())
            } else {
                PersistenceError::Transport(error.to_string())
            }
        })?;

        let status = response.status();
        debug!(url = %response.url(), %status, "record store response");
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(PersistenceError::NotFound(id.to_string()));
            }
        }

        let body = response.text().await.unwrap_or_default();
        Err(PersistenceError::Rejected {
            status: Some(status.as_u16()),
            message: server_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            }),
        })
    }

    async fn body(response: Response) -> Result<Value, PersistenceError> {
        response
            .json::<Value>()
            .await
            .map_err(|error| PersistenceError::Transport(format!("invalid response body: {error}")))
    }
}

/// `{"message": "..."}` or `{"error": "..."}`, else the raw text if short.
fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return ["message", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string);
    }
    (trimmed.len() <= 200).then(|| trimmed.to_string())
}

/// Single records come back bare or wrapped in `{"data": {...}}`.
fn into_record(value: Value) -> Result<Record, PersistenceError> {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Object(inner)) if !map.contains_key("_id") => Ok(inner),
            Some(other) => {
                map.insert("data".into(), other);
                Ok(map)
            }
            None => Ok(map),
        },
        other => Err(PersistenceError::Transport(format!(
            "expected a record object, got {other}"
        ))),
    }
}

/// Lists come back bare or wrapped in `{"data": [...]}`.
fn into_records(value: Value) -> Result<Vec<Record>, PersistenceError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(PersistenceError::Transport(
                    "expected a list of records".into(),
                ))
            }
        },
        _ => {
            return Err(PersistenceError::Transport(
                "expected a list of records".into(),
            ))
        }
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect())
}

impl PersistenceAdapter for HttpRecordStore {
    async fn create(&self, resource: &str, payload: &Payload) -> Result<(), PersistenceError> {
        let request = self.client.post(self.url(resource, None)).json(payload);
        self.send(request, None).await.map(|_| ())
    }

    async fn update(
        &self,
        resource: &str,
        id: &str,
        payload: &Payload,
    ) -> Result<(), PersistenceError> {
        let request = self.client.put(self.url(resource, Some(id))).json(payload);
        self.send(request, Some(id)).await.map(|_| ())
    }

    async fn get(&self, resource: &str, id: &str) -> Result<Record, PersistenceError> {
        let request = self.client.get(self.url(resource, Some(id)));
        let response = self.send(request, Some(id)).await?;
        into_record(Self::body(response).await?)
    }

    async fn list(&self, resource: &str) -> Result<Vec<Record>, PersistenceError> {
        let request = self.client.get(self.url(resource, None));
        let response = self.send(request, None).await?;
        into_records(Self::body(response).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base_url_must_be_http() {
        assert!(matches!(
            HttpRecordStore::new("localhost:5000", Duration::from_secs(1)),
            Err(ClientError::BaseUrl(_))
        ));
        let store = HttpRecordStore::new("http://localhost:5000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(store.url("yield", Some("42")), "http://localhost:5000/api/yield/42");
        assert_eq!(store.url("harvest", None), "http://localhost:5000/api/harvest");
    }

    #[test]
    fn server_message_prefers_json_message() {
        assert_eq!(
            server_message(r#"{"message":"duplicate"}"#),
            Some("duplicate".to_string())
        );
        assert_eq!(server_message("Bad things"), Some("Bad things".to_string()));
        assert_eq!(server_message("  "), None);
    }

    #[test]
    fn wrapped_and_bare_lists_are_accepted() {
        let wrapped = into_records(json!({"data": [{"a": 1}, 3]})).unwrap();
        assert_eq!(wrapped.len(), 1);
        let bare = into_records(json!([{"a": 1}, {"a": 2}])).unwrap();
        assert_eq!(bare.len(), 2);
        assert!(into_records(json!({"items": []})).is_err());
    }

    #[test]
    fn wrapped_record_is_unwrapped() {
        let record = into_record(json!({"data": {"_id": "1", "unit": "Kg"}})).unwrap();
        assert_eq!(record.get("unit"), Some(&json!("Kg")));
        let bare = into_record(json!({"_id": "1", "data": "x"})).unwrap();
        assert_eq!(bare.get("data"), Some(&json!("x")));
    }
}
