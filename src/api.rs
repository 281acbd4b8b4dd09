//! HTTP client for the remote garden API.

use crate::errors::ApiError;
use crate::local_store::{LocalStore, AUTH_TOKEN_KEY};
use crate::models::{
    ApiEnvelope, CalendarTasks, CreatedTask, LoginRequest, LoginResponse, NewTask,
    RegisterRequest, Task, TaskList, User,
};
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Which auth deployment the client talks to. Selected once from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    Postgres,
    #[default]
    Hosted,
}

impl Backend {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Postgres => "/pg",
            Self::Hosted => "/sb",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres => f.write_str("postgres"),
            Self::Hosted => f.write_str("hosted"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pg" | "postgres" | "postgresql" => Ok(Self::Postgres),
            "sb" | "hosted" | "supabase" => Ok(Self::Hosted),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    backend: Backend,
    storage: LocalStore,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, backend: Backend, storage: LocalStore) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            backend,
            storage,
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn storage(&self) -> &LocalStore {
        &self.storage
    }

    /// Picks up whatever token local storage currently holds.
    pub async fn reload_token(&self) {
        let stored = self.storage.get(AUTH_TOKEN_KEY).await;
        *self.token.write().await = stored;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub async fn set_token(&self, token: &str) -> Result<(), ApiError> {
        *self.token.write().await = Some(token.to_string());
        self.storage
            .set(AUTH_TOKEN_KEY, token)
            .await
            .map_err(|err| ApiError::Storage(err.to_string()))
    }

    pub async fn clear_token(&self) -> Result<(), ApiError> {
        *self.token.write().await = None;
        self.storage
            .remove(AUTH_TOKEN_KEY)
            .await
            .map_err(|err| ApiError::Storage(err.to_string()))
    }

    /// Forgets the token and drops every stored auth entry.
    pub async fn logout(&self) -> Result<(), ApiError> {
        *self.token.write().await = None;
        self.storage
            .clear_auth()
            .await
            .map_err(|err| ApiError::Storage(err.to_string()))
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<LoginResponse, ApiError> {
        let path = format!("{}/auth/register", self.backend.prefix());
        let response: LoginResponse = self
            .call(Method::POST, &path, Some(request), "Registration failed")
            .await?;
        self.set_token(&response.token).await?;
        info!("registered {} against the {} backend", response.user.email, self.backend);
        Ok(response)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let path = format!("{}/auth/login", self.backend.prefix());
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .call(Method::POST, &path, Some(&body), "Login failed")
            .await?;
        self.set_token(&response.token).await?;
        info!("logged in {} against the {} backend", response.user.email, self.backend);
        Ok(response)
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        let path = format!("{}/auth/me", self.backend.prefix());
        self.call::<(), User>(Method::GET, &path, None, "Failed to get user info")
            .await
    }

    pub async fn user_tasks(&self, user_id: &str) -> Result<Vec<Task>, ApiError> {
        let path = format!("/tasks/user/{}", urlencoding::encode(user_id));
        let list: TaskList = self
            .call::<(), _>(Method::GET, &path, None, "Failed to fetch tasks")
            .await?;
        Ok(list.tasks)
    }

    pub async fn create_task(&self, user_id: &str, task: &NewTask) -> Result<Task, ApiError> {
        let path = format!("/tasks/user/{}", urlencoding::encode(user_id));
        let created: CreatedTask = self
            .call(Method::POST, &path, Some(task), "Failed to create task")
            .await?;
        Ok(created.task)
    }

    pub async fn complete_task(&self, task_id: &str) -> Result<(), ApiError> {
        let path = format!("/tasks/{}/complete", urlencoding::encode(task_id));
        self.send::<(), serde_json::Value>(Method::PATCH, &path, None)
            .await
            .map(|_| ())
    }

    pub async fn calendar_tasks(
        &self,
        user_id: &str,
    ) -> Result<BTreeMap<String, Vec<Task>>, ApiError> {
        let path = format!("/tasks/calendar/{}", urlencoding::encode(user_id));
        let calendar: CalendarTasks = self
            .call::<(), _>(Method::GET, &path, None, "Failed to fetch calendar tasks")
            .await?;
        Ok(calendar.tasks)
    }

    /// Sends a request whose success envelope must carry `data`.
    async fn call<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        fallback: &str,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let envelope = self.send::<B, T>(method, path, body).await?;
        match envelope.data {
            Some(data) => Ok(data),
            None if envelope.message.is_empty() => Err(ApiError::Rejected(fallback.to_string())),
            None => Err(ApiError::Rejected(envelope.message)),
        }
    }

    /// Sends a request and unwraps the envelope status. `data` may be absent.
    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiEnvelope<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .request(method, &url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = self.token().await {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let result = execute::<T>(request).await;

        if let Err(err) = &result {
            error!("API request failed: {path}: {err}");
        }
        result
    }
}

async fn execute<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<ApiEnvelope<T>, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16()));
    }

    let envelope: ApiEnvelope<T> = response.json().await?;
    if !envelope.is_success() {
        return Err(ApiError::Rejected(envelope.message));
    }
    Ok(envelope)
}
