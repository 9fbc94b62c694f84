// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client as HttpClient;
use reqwest::{Method, StatusCode, header};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use ticklist_app::{Checklist, ChecklistId, ChecklistItem, ItemId};

pub mod config;
pub mod credentials;

pub use config::Config;
pub use credentials::{CredentialStore, MemoryStore, TokenFile};

/// The two credential-free endpoints. Every other path requires a stored
/// bearer token and carries an Authorization header.
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";

#[derive(Debug, Error)]
pub enum RequestError {
    /// No token for a protected call, or the server rejected the token.
    /// Callers treat this as a forced logout.
    #[error("not authenticated; log in first")]
    Auth,
    /// The request never produced an HTTP response.
    #[error("cannot reach {url} ({source})")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Non-2xx response whose body is not JSON; the raw body is kept for
    /// diagnosis.
    #[error("server error ({status}): {body}")]
    Transport { status: u16, body: String },
    /// Well-formed error payload; the message is surfaced verbatim.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// 2xx response with a malformed body.
    #[error("invalid response body: {0}")]
    Protocol(String),
    /// Local precondition failure; never reaches the network.
    #[error("{0}")]
    Validation(String),
    #[error("credential storage failed: {0}")]
    Credential(String),
}

/// Authenticated-request executor shared by every higher-level operation.
/// Consults the credential store for the token on each call; never writes to
/// it except on successful login.
pub struct Client {
    base_url: String,
    http: HttpClient,
    credentials: Box<dyn CredentialStore>,
}

impl Client {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Box<dyn CredentialStore>,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            http,
            credentials,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let store = config.token_file()?;
        Self::new(config.base_url(), config.timeout()?, Box::new(store))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &dyn CredentialStore {
        self.credentials.as_ref()
    }

    /// Single entry point for every remote call. Builds headers, issues the
    /// request, reads the body as text and classifies the outcome. The parsed
    /// body is returned unmodified; callers extract the payload shape they
    /// expect via [`decode_collection`] or [`decode_entity`].
    pub fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, RequestError> {
        self.dispatch(method, path, body).map(|(_, parsed)| parsed)
    }

    fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<(u16, Value), RequestError> {
        let public = path == LOGIN_PATH || path == REGISTER_PATH;
        let url = format!("{}{}", self.base_url, path);
        log::debug!("{method} {url}");

        let mut request = self
            .http
            .request(method, &url)
            .header(header::CONTENT_TYPE, "application/json");
        if !public {
            // Fail before the network when unauthenticated. Public endpoints
            // never send Authorization, even when a token exists.
            let Some(token) = self.credentials.get() else {
                return Err(RequestError::Auth);
            };
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|source| RequestError::Network {
            url: url.clone(),
            source,
        })?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|source| RequestError::Network { url, source })?;

        if !status.is_success() {
            let error = classify_failure(status, &text, path, public);
            log::warn!("{path}: {error}");
            return Err(error);
        }

        if text.trim().is_empty() {
            // Delete endpoints answer 2xx with an empty body.
            return Ok((status.as_u16(), Value::Null));
        }

        match serde_json::from_str(&text) {
            Ok(parsed) => Ok((status.as_u16(), parsed)),
            Err(error) => Err(RequestError::Protocol(error.to_string())),
        }
    }

    /// Authenticates and stores the returned bearer token. A 2xx body without
    /// a token is a protocol failure, not a success.
    pub fn login(&self, username: &str, password: &str) -> Result<(), RequestError> {
        let body = json!({ "username": username, "password": password });
        let parsed = self.call(Method::POST, LOGIN_PATH, Some(&body))?;

        let token = extract_token(&parsed).ok_or_else(|| {
            RequestError::Protocol("login response did not include a token".to_owned())
        })?;
        self.credentials
            .set(token)
            .map_err(|error| RequestError::Credential(error.to_string()))?;
        log::debug!("login succeeded; token stored");
        Ok(())
    }

    pub fn register(&self, email: &str, username: &str, password: &str) -> Result<(), RequestError> {
        let body = json!({ "email": email, "username": username, "password": password });
        let (status, parsed) = self.dispatch(Method::POST, REGISTER_PATH, Some(&body))?;

        if body_signals_success(&parsed) {
            return Ok(());
        }
        Err(RequestError::Api {
            status,
            message: error_message(&parsed, REGISTER_PATH),
        })
    }

    pub fn list_checklists(&self) -> Result<Vec<Checklist>, RequestError> {
        let parsed = self.call(Method::GET, "/checklist", None)?;
        decode_collection(&parsed)
    }

    pub fn create_checklist(&self, name: &str) -> Result<(), RequestError> {
        let body = json!({ "name": name });
        self.call(Method::POST, "/checklist", Some(&body))?;
        Ok(())
    }

    pub fn delete_checklist(&self, id: ChecklistId) -> Result<(), RequestError> {
        self.call(Method::DELETE, &format!("/checklist/{id}"), None)?;
        Ok(())
    }

    pub fn list_items(&self, checklist: ChecklistId) -> Result<Vec<ChecklistItem>, RequestError> {
        let parsed = self.call(Method::GET, &format!("/checklist/{checklist}/item"), None)?;
        decode_collection(&parsed)
    }

    pub fn fetch_item(
        &self,
        checklist: ChecklistId,
        item: ItemId,
    ) -> Result<ChecklistItem, RequestError> {
        let parsed = self.call(
            Method::GET,
            &format!("/checklist/{checklist}/item/{item}"),
            None,
        )?;
        decode_entity(&parsed)
    }

    pub fn create_item(&self, checklist: ChecklistId, name: &str) -> Result<(), RequestError> {
        let body = json!({ "itemName": name });
        self.call(
            Method::POST,
            &format!("/checklist/{checklist}/item"),
            Some(&body),
        )?;
        Ok(())
    }

    /// Status update is a bodyless PUT; the server flips the completion flag
    /// itself.
    pub fn toggle_item(&self, checklist: ChecklistId, item: ItemId) -> Result<(), RequestError> {
        self.call(
            Method::PUT,
            &format!("/checklist/{checklist}/item/{item}"),
            None,
        )?;
        Ok(())
    }

    pub fn delete_item(&self, checklist: ChecklistId, item: ItemId) -> Result<(), RequestError> {
        self.call(
            Method::DELETE,
            &format!("/checklist/{checklist}/item/{item}"),
            None,
        )?;
        Ok(())
    }

    pub fn rename_item(
        &self,
        checklist: ChecklistId,
        item: ItemId,
        name: &str,
    ) -> Result<(), RequestError> {
        let body = json!({ "itemName": name });
        self.call(
            Method::PUT,
            &format!("/checklist/{checklist}/item/rename/{item}"),
            Some(&body),
        )?;
        Ok(())
    }
}

/// A 401 means a rejected token only on protected paths; on the public
/// endpoints it is an ordinary server rejection (wrong password, unknown
/// user) and keeps the server's message.
fn classify_failure(status: StatusCode, body: &str, path: &str, public: bool) -> RequestError {
    if status == StatusCode::UNAUTHORIZED && !public {
        return RequestError::Auth;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(parsed) => RequestError::Api {
            status: status.as_u16(),
            message: error_message(&parsed, path),
        },
        Err(_) => RequestError::Transport {
            status: status.as_u16(),
            body: body.to_owned(),
        },
    }
}

fn error_message(parsed: &Value, path: &str) -> String {
    for key in ["message", "errorMessage"] {
        if let Some(message) = parsed.get(key).and_then(Value::as_str)
            && !message.is_empty()
        {
            return message.to_owned();
        }
    }
    format!("request to {path} failed")
}

fn extract_token(parsed: &Value) -> Option<&str> {
    parsed
        .pointer("/data/token")
        .or_else(|| parsed.get("token"))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
}

/// The service reports success through either of two numeric statusCode
/// sentinels or a boolean `success` flag; all variants are accepted.
pub fn body_signals_success(parsed: &Value) -> bool {
    if matches!(
        parsed.get("statusCode").and_then(Value::as_i64),
        Some(2000 | 2110)
    ) {
        return true;
    }
    parsed.get("success").and_then(Value::as_bool) == Some(true)
}

/// Normalizes the two payload shapes the service answers with: a collection
/// wrapped under `data`, or a bare array. Anything else is an empty
/// collection, never an error; the upstream inconsistency is tolerated by
/// design and this is the single place that absorbs it.
pub fn decode_collection<T: DeserializeOwned>(body: &Value) -> Result<Vec<T>, RequestError> {
    let payload = match body.get("data") {
        Some(data) if data.is_array() => data,
        _ if body.is_array() => body,
        _ => return Ok(Vec::new()),
    };
    serde_json::from_value(payload.clone()).map_err(|error| RequestError::Protocol(error.to_string()))
}

/// Single-entity counterpart of [`decode_collection`]: the payload may sit
/// under `data` or be the body itself.
pub fn decode_entity<T: DeserializeOwned>(body: &Value) -> Result<T, RequestError> {
    let payload = match body.get("data") {
        Some(data) if data.is_object() => data,
        _ => body,
    };
    serde_json::from_value(payload.clone()).map_err(|error| RequestError::Protocol(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{
        RequestError, body_signals_success, classify_failure, decode_collection, decode_entity,
        error_message, extract_token,
    };
    use reqwest::StatusCode;
    use serde_json::json;
    use ticklist_app::{Checklist, ChecklistId, ChecklistItem};

    #[test]
    fn decode_collection_accepts_enveloped_payload() {
        let body = json!({ "data": [{ "id": 1, "name": "Groceries" }] });
        let lists: Vec<Checklist> = decode_collection(&body).expect("decode enveloped");
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id, ChecklistId::new(1));
    }

    #[test]
    fn decode_collection_accepts_bare_array() {
        let body = json!([{ "id": 2, "name": "Chores" }]);
        let lists: Vec<Checklist> = decode_collection(&body).expect("decode bare");
        assert_eq!(lists[0].name, "Chores");
    }

    #[test]
    fn decode_collection_treats_other_shapes_as_empty() {
        for body in [json!({ "data": "nope" }), json!({}), json!(42), json!(null)] {
            let lists: Vec<Checklist> = decode_collection(&body).expect("tolerant decode");
            assert!(lists.is_empty(), "expected empty for {body}");
        }
    }

    #[test]
    fn decode_collection_rejects_malformed_elements() {
        let body = json!([{ "name": "missing id" }]);
        let error = decode_collection::<Checklist>(&body).expect_err("malformed element");
        assert!(matches!(error, RequestError::Protocol(_)));
    }

    #[test]
    fn decode_entity_accepts_enveloped_and_bare_objects() {
        let enveloped = json!({ "data": { "id": 3, "itemName": "Buy milk" } });
        let bare = json!({ "id": 3, "name": "Buy milk" });
        let from_enveloped: ChecklistItem = decode_entity(&enveloped).expect("enveloped");
        let from_bare: ChecklistItem = decode_entity(&bare).expect("bare");
        assert_eq!(from_enveloped, from_bare);
    }

    #[test]
    fn extract_token_prefers_enveloped_location() {
        let body = json!({ "data": { "token": "abc" }, "token": "outer" });
        assert_eq!(extract_token(&body), Some("abc"));
    }

    #[test]
    fn extract_token_falls_back_to_top_level() {
        assert_eq!(extract_token(&json!({ "token": "xyz" })), Some("xyz"));
    }

    #[test]
    fn extract_token_rejects_missing_or_empty() {
        assert_eq!(extract_token(&json!({})), None);
        assert_eq!(extract_token(&json!({ "token": "" })), None);
    }

    #[test]
    fn success_sentinels_all_accepted() {
        assert!(body_signals_success(&json!({ "statusCode": 2000 })));
        assert!(body_signals_success(&json!({ "statusCode": 2110 })));
        assert!(body_signals_success(&json!({ "success": true })));
        assert!(!body_signals_success(&json!({ "statusCode": 4000 })));
        assert!(!body_signals_success(&json!({ "success": false })));
        assert!(!body_signals_success(&json!({})));
    }

    #[test]
    fn error_message_prefers_message_then_error_message() {
        assert_eq!(
            error_message(&json!({ "message": "nope" }), "/checklist"),
            "nope",
        );
        assert_eq!(
            error_message(&json!({ "errorMessage": "denied" }), "/checklist"),
            "denied",
        );
        assert_eq!(
            error_message(&json!({}), "/checklist"),
            "request to /checklist failed",
        );
    }

    #[test]
    fn unauthorized_status_on_protected_path_classifies_as_auth() {
        let error = classify_failure(StatusCode::UNAUTHORIZED, "{}", "/checklist", false);
        assert!(matches!(error, RequestError::Auth));
    }

    #[test]
    fn unauthorized_status_on_public_path_keeps_server_message() {
        let error = classify_failure(
            StatusCode::UNAUTHORIZED,
            r#"{"message":"incorrect username or password"}"#,
            "/login",
            true,
        );
        match error {
            RequestError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "incorrect username or password");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn json_error_body_classifies_as_api() {
        let error = classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"message":"name taken"}"#,
            "/checklist",
            false,
        );
        match error {
            RequestError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "name taken");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn non_json_error_body_classifies_as_transport() {
        let error = classify_failure(
            StatusCode::BAD_GATEWAY,
            "<html>oops</html>",
            "/checklist",
            false,
        );
        match error {
            RequestError::Transport { status, body } => {
                assert_eq!(status, 502);
                assert!(body.contains("oops"));
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }
}
