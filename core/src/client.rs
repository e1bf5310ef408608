//! Authenticated HTTP client for the object-storage API.
//!
//! # Design
//! `StorageClient` owns the credentials, the transport and a cached session
//! token. Every verb method calls `authenticate_if_needed` first, so the
//! token endpoint is hit at most once per client in the common case. The
//! token is never refreshed: a client lives for one provider configuration.
//!
//! The cache sits behind a `parking_lot::RwLock` because one client is shared
//! by every resource operation of a configured provider, and those may run
//! concurrently. After the first successful authentication all access is
//! read-only.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{ErrorEnvelope, TokenRequest, TokenResponse};

/// Path of the token endpoint, relative to the base URL.
pub const TOKEN_PATH: &str = "token";

/// Header carrying the session token on every request.
pub const TOKEN_HEADER: &str = "token";

/// Username and password exchanged for a session token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Blocking, lazily authenticated client bound to one base URL.
pub struct StorageClient {
    base_url: String,
    credentials: Credentials,
    token: RwLock<Option<String>>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl StorageClient {
    /// Client using the default `ureq` transport.
    pub fn new(base_url: &str, credentials: Credentials) -> Self {
        Self::with_transport(base_url, credentials, Arc::new(UreqTransport::new()))
    }

    pub fn with_transport(
        base_url: &str,
        credentials: Credentials,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            token: RwLock::new(None),
            transport,
        }
    }

    /// The cached session token, if authentication has succeeded.
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// Obtain a session token unless one is already cached.
    ///
    /// Request failures propagate. A success status other than 200, or a 200
    /// carrying an empty token, leaves the client unauthenticated: later
    /// calls go out with an empty `token` header and retry authentication.
    pub fn authenticate_if_needed(&self) -> Result<(), ApiError> {
        if self.is_authenticated() {
            return Ok(());
        }

        let payload = TokenRequest {
            username: self.credentials.username.clone(),
            password: self.credentials.password.clone(),
        };
        let body = to_json(&payload)?;

        debug!(username = %self.credentials.username, "requesting session token");
        let response = self.request(HttpMethod::Post, TOKEN_PATH, Some(body))?;

        if response.status != 200 {
            warn!(
                status = response.status,
                "token endpoint did not return 200; continuing unauthenticated"
            );
            return Ok(());
        }

        let TokenResponse { token } = response.json()?;
        if token.is_empty() {
            warn!("token endpoint returned an empty token; continuing unauthenticated");
            return Ok(());
        }

        let mut cached = self.token.write();
        if cached.is_none() {
            *cached = Some(token);
            info!("authenticated against {}", self.base_url);
        }
        Ok(())
    }

    /// Send one request and classify the response.
    ///
    /// Statuses in `[200, 400)` are returned as-is. Anything else becomes
    /// `ApiError::Http` with the server's `message`, or the raw body when the
    /// body carries no usable message.
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> Result<HttpResponse, ApiError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let mut headers = vec![(TOKEN_HEADER.to_string(), self.token().unwrap_or_default())];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }

        debug!(
            method = method.as_str(),
            %url,
            payload_bytes = body.as_ref().map_or(0, String::len),
            "sending request"
        );

        let request = HttpRequest {
            method,
            url,
            headers,
            body,
        };
        let response = self.transport.execute(&request)?;
        check_status(response, path)
    }

    pub fn get(&self, path: &str) -> Result<HttpResponse, ApiError> {
        self.authenticate_if_needed()?;
        self.request(HttpMethod::Get, path, None)
    }

    pub fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<HttpResponse, ApiError> {
        self.authenticate_if_needed()?;
        self.request(HttpMethod::Post, path, Some(to_json(body)?))
    }

    pub fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<HttpResponse, ApiError> {
        self.authenticate_if_needed()?;
        self.request(HttpMethod::Put, path, Some(to_json(body)?))
    }

    /// `PUT` without a body.
    pub fn put_only(&self, path: &str) -> Result<HttpResponse, ApiError> {
        self.authenticate_if_needed()?;
        self.request(HttpMethod::Put, path, None)
    }

    pub fn delete(&self, path: &str) -> Result<HttpResponse, ApiError> {
        self.authenticate_if_needed()?;
        self.request(HttpMethod::Delete, path, None)
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Map statuses outside `[200, 400)` to `ApiError::Http`.
fn check_status(response: HttpResponse, endpoint: &str) -> Result<HttpResponse, ApiError> {
    if (200..400).contains(&response.status) {
        return Ok(response);
    }

    debug!(status = response.status, body = %response.body, "error response");

    let message = serde_json::from_str::<ErrorEnvelope>(&response.body)
        .ok()
        .and_then(|env| env.message)
        .filter(|m| !m.is_empty())
        .unwrap_or(response.body);

    Err(ApiError::Http {
        status: response.status,
        endpoint: endpoint.to_string(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use parking_lot::Mutex;

    use super::*;

    /// Replays canned responses and records every request it sees.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn push(&self, status: u16, body: &str) {
            self.responses.lock().push_back(Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            }));
        }

        fn push_err(&self, err: ApiError) {
            self.responses.lock().push_back(Err(err));
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.lock().push(request.clone());
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Transport("no scripted response".to_string())))
        }
    }

    fn client(transport: &Arc<ScriptedTransport>) -> StorageClient {
        StorageClient::with_transport(
            "http://localhost:8084/",
            Credentials::new("alice", "s3cret"),
            transport.clone(),
        )
    }

    #[test]
    fn authenticate_twice_requests_token_once() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(200, r#"{"token":"tok-1"}"#);
        let client = client(&transport);

        client.authenticate_if_needed().unwrap();
        client.authenticate_if_needed().unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].url, "http://localhost:8084/token");
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"username": "alice", "password": "s3cret"}));
        assert_eq!(client.token().as_deref(), Some("tok-1"));
    }

    #[test]
    fn token_is_attached_to_subsequent_calls() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(200, r#"{"token":"tok-1"}"#);
        transport.push(200, "{}");
        transport.push(200, "{}");
        let client = client(&transport);

        client.get("accounts/1").unwrap();
        client.delete("accounts/1").unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].header(TOKEN_HEADER), Some(""));
        assert_eq!(requests[1].header(TOKEN_HEADER), Some("tok-1"));
        assert_eq!(requests[1].url, "http://localhost:8084/accounts/1");
        assert_eq!(requests[2].method, HttpMethod::Delete);
        assert_eq!(requests[2].header(TOKEN_HEADER), Some("tok-1"));
    }

    #[test]
    fn content_type_only_when_body_present() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(200, r#"{"token":"tok-1"}"#);
        transport.push(200, "");
        transport.push(200, "");
        let client = client(&transport);

        client
            .put("accounts/1", &serde_json::json!({"name": "group", "value": "G2"}))
            .unwrap();
        client.put_only("accounts/1").unwrap();

        let requests = transport.requests();
        assert_eq!(requests[1].header("content-type"), Some("application/json"));
        assert!(requests[2].body.is_none());
        assert_eq!(requests[2].header("content-type"), None);
    }

    #[test]
    fn non_200_token_response_leaves_client_unauthenticated() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(204, "");
        transport.push(200, "{}");
        let client = client(&transport);

        client.get("accounts/1").unwrap();

        assert!(!client.is_authenticated());
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].header(TOKEN_HEADER), Some(""));
    }

    #[test]
    fn null_token_leaves_client_unauthenticated() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(200, r#"{"token":null}"#);
        transport.push(200, "{}");
        let client = client(&transport);

        client.get("accounts/1").unwrap();

        assert!(!client.is_authenticated());
        assert_eq!(transport.requests()[1].header(TOKEN_HEADER), Some(""));
    }

    #[test]
    fn rejected_credentials_short_circuit_the_call() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(401, r#"{"message":"invalid credentials"}"#);
        let client = client(&transport);

        let err = client.get("accounts/1").unwrap_err();

        match err {
            ApiError::Http {
                status,
                endpoint,
                message,
            } => {
                assert_eq!(status, 401);
                assert_eq!(endpoint, "token");
                assert_eq!(message, "invalid credentials");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn transport_failure_during_auth_propagates() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push_err(ApiError::Transport("connection refused".to_string()));
        let client = client(&transport);

        let err = client.post("accounts", &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn malformed_token_body_is_a_deserialization_error() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(200, "not json");
        let client = client(&transport);

        let err = client.authenticate_if_needed().unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
        assert!(!client.is_authenticated());
    }

    #[test]
    fn success_range_includes_redirect_statuses() {
        for status in [200u16, 201, 204, 302, 399] {
            let response = HttpResponse {
                status,
                headers: Vec::new(),
                body: String::new(),
            };
            assert!(check_status(response, "accounts").is_ok(), "status {status}");
        }
    }

    #[test]
    fn error_statuses_carry_status_and_endpoint() {
        for status in [100u16, 199, 400, 404, 500, 503] {
            let response = HttpResponse {
                status,
                headers: Vec::new(),
                body: r#"{"message":"boom"}"#.to_string(),
            };
            let err = check_status(response, "accounts/9").unwrap_err();
            match err {
                ApiError::Http {
                    status: s,
                    endpoint,
                    message,
                } => {
                    assert_eq!(s, status);
                    assert_eq!(endpoint, "accounts/9");
                    assert_eq!(message, "boom");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        let response = HttpResponse {
            status: 502,
            headers: Vec::new(),
            body: "<html>bad gateway</html>".to_string(),
        };
        let err = check_status(response, "accounts").unwrap_err();
        assert!(matches!(err, ApiError::Http { ref message, .. } if message == "<html>bad gateway</html>"));
    }

    /// Issues a fresh token on every token request and answers `{}` elsewhere.
    #[derive(Default)]
    struct TokenMintingTransport {
        issued: Mutex<usize>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl Transport for TokenMintingTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.lock().push(request.clone());
            let body = if request.url.ends_with("/token") {
                let mut issued = self.issued.lock();
                *issued += 1;
                let n = *issued;
                format!(r#"{{"token":"tok-{n}"}}"#)
            } else {
                "{}".to_string()
            };
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body,
            })
        }
    }

    #[test]
    fn shared_client_uses_one_token_across_threads() {
        let transport = Arc::new(TokenMintingTransport::default());
        let client = Arc::new(StorageClient::with_transport(
            "http://localhost:8084",
            Credentials::new("alice", "s3cret"),
            transport.clone(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let client = Arc::clone(&client);
                std::thread::spawn(move || client.get(&format!("accounts/{i}")).map(|_| ()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let token = client.token().unwrap();
        let calls: Vec<_> = transport
            .requests
            .lock()
            .iter()
            .filter(|r| r.method == HttpMethod::Get)
            .cloned()
            .collect();
        assert_eq!(calls.len(), 8);
        for call in &calls {
            assert_eq!(call.header(TOKEN_HEADER), Some(token.as_str()), "{}", call.url);
        }

        // Later calls reuse the cached token without another exchange.
        let issued = *transport.issued.lock();
        client.get("accounts/9").unwrap();
        assert_eq!(*transport.issued.lock(), issued);
        assert_eq!(client.token().as_deref(), Some(token.as_str()));
    }

    #[test]
    fn debug_output_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("alice", "s3cret"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("s3cret"));
    }
}
