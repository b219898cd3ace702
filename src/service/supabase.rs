use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::broadcast;

use super::session::SessionHolder;
use super::{AuthService, ServiceError, ServiceResult, TodoService};
use crate::io::storage::LocalStorage;
use crate::model::{AuthChange, NewTodo, Session, Todo, TodoPatch, User};

const TODOS_TABLE: &str = "todos";

/// Client for a hosted Supabase project: GoTrue for auth, PostgREST for the
/// `todos` table. Row-level security scopes rows to the bearer's user.
#[derive(Debug)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: SessionHolder,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in.unwrap_or(3600)));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Human message from an error response body. GoTrue and PostgREST use
/// different keys, so try each.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["error_description", "msg", "message", "error"] {
            if let Some(Value::String(msg)) = map.get(key)
                && !msg.is_empty()
            {
                return msg.clone();
            }
        }
    }
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        body.to_string()
    }
}

/// The user in a signup response: either the whole body (email confirmation
/// pending) or its `user` field (auto-confirmed, session included)
fn signup_user(body: &Value) -> Option<User> {
    let candidate = match body.get("user") {
        Some(user) if user.is_object() => user,
        _ => body,
    };
    candidate.get("id")?;
    serde_json::from_value(candidate.clone()).ok()
}

fn network_error(e: reqwest::Error) -> ServiceError {
    ServiceError::Network(e.to_string())
}

impl SupabaseClient {
    pub fn new(url: &str, anon_key: &str, storage: Option<LocalStorage>) -> Self {
        SupabaseClient {
            http: reqwest::Client::new(),
            base_url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: SessionHolder::new(storage),
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TODOS_TABLE)
    }

    /// Request with the project key; `token` switches the bearer from the
    /// anon key to a user's access token
    fn request(&self, method: reqwest::Method, url: String, token: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, (StatusCode, String)> {
        let resp = req
            .send()
            .await
            .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::warn!(status = status.as_u16(), %message, "supabase request failed");
        Err((status, message))
    }

    async fn send_auth(&self, req: RequestBuilder) -> ServiceResult<Response> {
        self.send(req)
            .await
            .map_err(|(status, message)| match status {
                StatusCode::SERVICE_UNAVAILABLE => ServiceError::Network(message),
                _ => ServiceError::Auth(message),
            })
    }

    async fn send_rest(&self, req: RequestBuilder) -> ServiceResult<Response> {
        self.send(req)
            .await
            .map_err(|(status, message)| match status {
                StatusCode::SERVICE_UNAVAILABLE => ServiceError::Network(message),
                _ => ServiceError::Api {
                    status: status.as_u16(),
                    message,
                },
            })
    }

    async fn access_token(&self) -> ServiceResult<String> {
        self.get_session()
            .await?
            .map(|s| s.access_token)
            .ok_or(ServiceError::NotAuthenticated)
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> ServiceResult<Session> {
        let req = self
            .request(reqwest::Method::POST, self.auth_url("token"), None)
            .query(&[("grant_type", grant_type)])
            .json(&body);
        let token: TokenResponse = self
            .send_auth(req)
            .await?
            .json()
            .await
            .map_err(network_error)?;
        Ok(token.into_session(Utc::now()))
    }
}

#[async_trait]
impl TodoService for SupabaseClient {
    async fn current_user(&self) -> ServiceResult<User> {
        let token = self.access_token().await?;
        let req = self.request(reqwest::Method::GET, self.auth_url("user"), Some(&token));
        self.send_auth(req)
            .await?
            .json()
            .await
            .map_err(network_error)
    }

    async fn select_todos(&self) -> ServiceResult<Vec<Todo>> {
        let token = self.access_token().await?;
        let req = self
            .request(reqwest::Method::GET, self.rest_url(), Some(&token))
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        self.send_rest(req)
            .await?
            .json()
            .await
            .map_err(network_error)
    }

    async fn insert_todo(&self, todo: NewTodo) -> ServiceResult<()> {
        let token = self.access_token().await?;
        let req = self
            .request(reqwest::Method::POST, self.rest_url(), Some(&token))
            .header("Prefer", "return=minimal")
            .json(&[todo]);
        self.send_rest(req).await?;
        Ok(())
    }

    async fn update_todo(&self, id: &str, patch: TodoPatch) -> ServiceResult<()> {
        let token = self.access_token().await?;
        let req = self
            .request(reqwest::Method::PATCH, self.rest_url(), Some(&token))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=minimal")
            .json(&patch);
        self.send_rest(req).await?;
        Ok(())
    }

    async fn delete_todo(&self, id: &str) -> ServiceResult<()> {
        let token = self.access_token().await?;
        let req = self
            .request(reqwest::Method::DELETE, self.rest_url(), Some(&token))
            .query(&[("id", format!("eq.{}", id))]);
        self.send_rest(req).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthService for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> ServiceResult<Option<User>> {
        let req = self
            .request(reqwest::Method::POST, self.auth_url("signup"), None)
            .json(&json!({ "email": email, "password": password }));
        let body: Value = self
            .send_auth(req)
            .await?
            .json()
            .await
            .map_err(network_error)?;
        Ok(signup_user(&body))
    }

    async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<Session> {
        let session = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;
        self.session.publish(AuthChange::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> ServiceResult<()> {
        if let Some(session) = self.session.current() {
            let req = self.request(
                reqwest::Method::POST,
                self.auth_url("logout"),
                Some(&session.access_token),
            );
            // The local session is dropped even if the server call fails
            if let Err(e) = self.send_auth(req).await {
                tracing::warn!(error = %e, "remote sign-out failed");
            }
        }
        self.session.publish(AuthChange::SignedOut);
        Ok(())
    }

    async fn get_session(&self) -> ServiceResult<Option<Session>> {
        let Some(session) = self.session.current() else {
            return Ok(None);
        };
        if !session.is_expired() {
            return Ok(Some(session));
        }
        tracing::debug!("access token expired, refreshing");
        match self
            .token_grant(
                "refresh_token",
                json!({ "refresh_token": session.refresh_token }),
            )
            .await
        {
            Ok(fresh) => {
                self.session
                    .publish(AuthChange::TokenRefreshed(fresh.clone()));
                Ok(Some(fresh))
            }
            Err(ServiceError::Network(e)) => Err(ServiceError::Network(e)),
            Err(e) => {
                self.session.publish(AuthChange::SignedOut);
                Err(e)
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.session.subscribe()
    }
}
