use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub id: String,
    pub source: String,
    pub group: String,
    pub ask_id: String,
    pub description: String,
    pub no_of_buckets: i64,
    pub no_of_objects: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccount {
    #[serde(default)]
    pub source: Option<String>,
    pub group: String,
    pub ask_id: String,
    pub description: String,
}

#[derive(Deserialize)]
pub struct PatchField {
    pub name: String,
    pub value: String,
}

#[derive(Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub message: String,
}

/// Status plus `{message}` body.
pub struct Failure(StatusCode, &'static str);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.1.to_string(),
        };
        (self.0, Json(body)).into_response()
    }
}

#[derive(Default)]
struct Inner {
    accounts: RwLock<HashMap<String, AccountRecord>>,
    tokens: RwLock<HashSet<String>>,
    token_requests: AtomicUsize,
}

/// Shared server state. Clones share the same accounts and tokens.
#[derive(Clone)]
pub struct AppState {
    username: String,
    password: String,
    inner: Arc<Inner>,
}

impl AppState {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            inner: Arc::default(),
        }
    }

    /// Number of `POST /token` calls received, successful or not.
    pub fn token_requests(&self) -> usize {
        self.inner.token_requests.load(Ordering::SeqCst)
    }

    pub async fn account(&self, id: &str) -> Option<AccountRecord> {
        self.inner.accounts.read().await.get(id).cloned()
    }

    /// Overwrite the computed counters of an account.
    pub async fn set_usage(&self, id: &str, buckets: i64, objects: i64) -> bool {
        match self.inner.accounts.write().await.get_mut(id) {
            Some(account) => {
                account.no_of_buckets = buckets;
                account.no_of_objects = objects;
                true
            }
            None => false,
        }
    }

    async fn authorize(&self, headers: &HeaderMap) -> Result<(), Failure> {
        let token = headers
            .get("token")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if self.inner.tokens.read().await.contains(token) {
            Ok(())
        } else {
            Err(Failure(StatusCode::UNAUTHORIZED, "invalid token"))
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    }
}

pub fn app() -> Router {
    router(AppState::default())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/token", post(issue_token))
        .route("/accounts", post(create_account))
        .route(
            "/accounts/{id}",
            get(get_account).put(update_account).delete(delete_account),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, AppState::default()).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

async fn issue_token(
    State(state): State<AppState>,
    Json(input): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, Failure> {
    state.inner.token_requests.fetch_add(1, Ordering::SeqCst);
    if input.username != state.username || input.password != state.password {
        debug!(username = %input.username, "rejected credentials");
        return Err(Failure(StatusCode::UNAUTHORIZED, "invalid credentials"));
    }
    let token = Uuid::new_v4().to_string();
    state.inner.tokens.write().await.insert(token.clone());
    Ok(Json(TokenResponse { token }))
}

async fn create_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateAccount>,
) -> Result<(StatusCode, Json<AccountRecord>), Failure> {
    state.authorize(&headers).await?;
    let account = AccountRecord {
        id: Uuid::new_v4().to_string(),
        source: input
            .source
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "terraform".to_string()),
        group: input.group,
        ask_id: input.ask_id,
        description: input.description,
        no_of_buckets: 0,
        no_of_objects: 0,
    };
    info!(id = %account.id, "account created");
    state
        .inner
        .accounts
        .write()
        .await
        .insert(account.id.clone(), account.clone());
    Ok((StatusCode::CREATED, Json(account)))
}

async fn get_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<AccountRecord>, Failure> {
    state.authorize(&headers).await?;
    state
        .account(&id)
        .await
        .map(Json)
        .ok_or(Failure(StatusCode::NOT_FOUND, "account not found"))
}

async fn update_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<PatchField>,
) -> Result<Json<AccountRecord>, Failure> {
    state.authorize(&headers).await?;
    let mut accounts = state.inner.accounts.write().await;
    let account = accounts
        .get_mut(&id)
        .ok_or(Failure(StatusCode::NOT_FOUND, "account not found"))?;
    match input.name.as_str() {
        "source" => account.source = input.value,
        "group" => account.group = input.value,
        "askId" => account.ask_id = input.value,
        "description" => account.description = input.value,
        _ => return Err(Failure(StatusCode::BAD_REQUEST, "unknown field")),
    }
    Ok(Json(account.clone()))
}

async fn delete_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, Failure> {
    state.authorize(&headers).await?;
    state
        .inner
        .accounts
        .write()
        .await
        .remove(&id)
        .map(|_| StatusCode::OK)
        .ok_or(Failure(StatusCode::NOT_FOUND, "account not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_record_serializes_camel_case() {
        let account = AccountRecord {
            id: "1".to_string(),
            source: "terraform".to_string(),
            group: "G1".to_string(),
            ask_id: "A1".to_string(),
            description: "D1".to_string(),
            no_of_buckets: 0,
            no_of_objects: 0,
        };
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["askId"], "A1");
        assert_eq!(json["noOfBuckets"], 0);
        assert_eq!(json["noOfObjects"], 0);
    }

    #[test]
    fn create_account_source_is_optional() {
        let input: CreateAccount =
            serde_json::from_str(r#"{"group":"G","askId":"A","description":"D"}"#).unwrap();
        assert!(input.source.is_none());
        assert_eq!(input.ask_id, "A");
    }

    #[test]
    fn create_account_rejects_missing_group() {
        let result: Result<CreateAccount, _> =
            serde_json::from_str(r#"{"askId":"A","description":"D"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn patch_field_requires_name_and_value() {
        let result: Result<PatchField, _> = serde_json::from_str(r#"{"name":"group"}"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn set_usage_on_unknown_account_is_false() {
        let state = AppState::default();
        assert!(!state.set_usage("missing", 1, 2).await);
    }
}
