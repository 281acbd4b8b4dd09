//! Authentication and profile state shared by every page.

use crate::api::ApiClient;
use crate::errors::ApiError;
use crate::local_store::{StorageEvent, AUTH_TOKEN_KEY};
use crate::models::{ProfileData, ProfileUpdate, RegisterRequest, User};
use crate::plants::today;
use crate::profile::{apply_update, sync_user_to_profile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Authenticated,
    Anonymous,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub profile: Option<ProfileData>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub phase: SessionPhase,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            profile: None,
            is_loading: true,
            error: None,
            phase: SessionPhase::Uninitialized,
        }
    }
}

impl AuthState {
    fn signed_out() -> Self {
        Self {
            is_loading: false,
            phase: SessionPhase::Anonymous,
            ..Self::default()
        }
    }
}

/// Raw sign-up form input, checked before anything is sent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub agreed: Option<String>,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<RegisterRequest, String> {
        let required = [
            &self.name,
            &self.email,
            &self.password,
            &self.confirm_password,
            &self.city,
            &self.birth_date,
        ];
        if required.iter().any(|value| value.trim().is_empty()) {
            return Err("Please fill in all fields".to_string());
        }
        if self.password != self.confirm_password {
            return Err("Passwords do not match".to_string());
        }
        if self.agreed.is_none() {
            return Err("You must agree to the terms".to_string());
        }

        Ok(RegisterRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
            city: Some(self.city.trim().to_string()),
            birth_date: Some(self.birth_date.trim().to_string()),
        })
    }
}

pub struct Session {
    api: ApiClient,
    state: RwLock<AuthState>,
}

impl Session {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: RwLock::new(AuthState::default()),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    /// Runs once; later calls are no-ops until [`Session::reinitialize`].
    pub async fn initialize(&self) {
        {
            let mut state = self.state.write().await;
            if state.phase != SessionPhase::Uninitialized {
                return;
            }
            Self::mark_loading(&mut state);
        }
        self.load().await;
    }

    pub async fn reinitialize(&self) {
        Self::mark_loading(&mut *self.state.write().await);
        self.load().await;
    }

    fn mark_loading(state: &mut AuthState) {
        state.phase = SessionPhase::Loading;
        state.is_loading = true;
        state.error = None;
    }

    async fn load(&self) {
        self.api.reload_token().await;
        if !self.api.is_authenticated().await {
            *self.state.write().await = AuthState::signed_out();
            return;
        }

        match self.restore().await {
            Ok((user, profile)) => {
                info!("restored session for {}", user.email);
                *self.state.write().await = AuthState {
                    is_authenticated: true,
                    user: Some(user),
                    profile: Some(profile),
                    is_loading: false,
                    error: None,
                    phase: SessionPhase::Authenticated,
                };
            }
            Err(err) => {
                error!("failed to initialize auth: {err}");
                self.logout().await;
                let mut state = self.state.write().await;
                state.error = Some("Failed to initialize authentication".to_string());
                state.phase = SessionPhase::Failed;
            }
        }
    }

    async fn restore(&self) -> Result<(User, ProfileData), ApiError> {
        let user = self.api.current_user().await?;
        let storage = self.api.storage();
        storage
            .save_user(&user)
            .await
            .map_err(|err| ApiError::Storage(err.to_string()))?;
        let profile = match storage.load_profile().await {
            Some(profile) => profile,
            None => sync_user_to_profile(storage, &user, today())
                .await
                .map_err(|err| ApiError::Storage(err.to_string()))?,
        };
        Ok((user, profile))
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        let response = self.api.register(request).await?;
        self.set_user(response.user.clone()).await?;
        Ok(response.user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let response = self.api.login(email, password).await?;
        self.set_user(response.user.clone()).await?;
        Ok(response.user)
    }

    /// Caches `user`, syncs the stored profile from it and marks the session signed in.
    pub async fn set_user(&self, user: User) -> Result<ProfileData, ApiError> {
        let storage = self.api.storage();
        storage
            .save_user(&user)
            .await
            .map_err(|err| ApiError::Storage(err.to_string()))?;
        let profile = sync_user_to_profile(storage, &user, today())
            .await
            .map_err(|err| ApiError::Storage(err.to_string()))?;

        *self.state.write().await = AuthState {
            is_authenticated: true,
            user: Some(user),
            profile: Some(profile.clone()),
            is_loading: false,
            error: None,
            phase: SessionPhase::Authenticated,
        };
        Ok(profile)
    }

    /// Shallow-merges `update` into the current profile. Without a profile nothing happens.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Option<ProfileData> {
        let updated = {
            let mut state = self.state.write().await;
            let current = state.profile.as_ref()?;
            let updated = apply_update(current, update);
            state.profile = Some(updated.clone());
            updated
        };
        if let Err(err) = self.api.storage().save_profile(&updated).await {
            error!("failed to persist profile: {err}");
        }
        Some(updated)
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    pub async fn logout(&self) {
        if let Err(err) = self.api.logout().await {
            error!("failed to clear stored session: {err}");
        }
        *self.state.write().await = AuthState::signed_out();
    }

    /// Reacts to a token change made through another handle onto the same storage.
    pub async fn handle_storage_event(&self, event: &StorageEvent) {
        if event.origin == self.api.storage().origin() || event.key != AUTH_TOKEN_KEY {
            return;
        }
        match &event.new_value {
            None => {
                info!("token removed elsewhere, signing out");
                self.logout().await;
            }
            Some(_) => {
                info!("token changed elsewhere, reloading session");
                self.reinitialize().await;
            }
        }
    }

    pub fn spawn_storage_listener(self: Arc<Self>) -> JoinHandle<()> {
        let session = self;
        let mut events = session.api.storage().subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => session.handle_storage_event(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("storage listener skipped {skipped} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Backend;
    use crate::local_store::{LocalStore, PROFILE_KEY, USER_KEY};

    // Nothing listens on the discard port, so any request fails fast.
    const DEAD_URL: &str = "http://127.0.0.1:9";

    fn session(storage: LocalStore) -> Session {
        Session::new(ApiClient::new(DEAD_URL, Backend::Hosted, storage))
    }

    fn user() -> User {
        User {
            id: "u1".into(),
            name: "A".into(),
            email: "a@b.com".into(),
            city: Some("Bandung".into()),
            birth_date: None,
            created_at: None,
        }
    }

    fn form() -> RegistrationForm {
        RegistrationForm {
            name: "A".into(),
            email: "a@b.com".into(),
            password: "pw".into(),
            confirm_password: "pw".into(),
            city: "Bandung".into(),
            birth_date: "1990-01-01".into(),
            agreed: Some("on".into()),
        }
    }

    #[tokio::test]
    async fn initialize_without_token_is_anonymous() {
        let session = session(LocalStore::in_memory());
        session.initialize().await;
        let state = session.state().await;
        assert_eq!(state.phase, SessionPhase::Anonymous);
        assert!(!state.is_authenticated);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn failed_initialization_forces_logout() {
        let storage = LocalStore::in_memory();
        storage.set(AUTH_TOKEN_KEY, "stale").await.unwrap();
        storage.save_user(&user()).await.unwrap();
        let session = session(storage.clone());

        session.initialize().await;

        let state = session.state().await;
        assert_eq!(state.phase, SessionPhase::Failed);
        assert!(!state.is_authenticated);
        assert!(state.user.is_none());
        assert!(state.error.is_some());
        assert_eq!(storage.get(AUTH_TOKEN_KEY).await, None);
        assert_eq!(storage.get(USER_KEY).await, None);
    }

    #[tokio::test]
    async fn clear_error_keeps_the_phase() {
        let storage = LocalStore::in_memory();
        storage.set(AUTH_TOKEN_KEY, "stale").await.unwrap();
        let session = session(storage);
        session.initialize().await;
        assert!(session.state().await.error.is_some());

        session.clear_error().await;

        let state = session.state().await;
        assert!(state.error.is_none());
        assert_eq!(state.phase, SessionPhase::Failed);
    }

    #[tokio::test]
    async fn logout_clears_storage_and_state() {
        let storage = LocalStore::in_memory();
        let session = session(storage.clone());
        session.api().set_token("t").await.unwrap();
        session.set_user(user()).await.unwrap();
        assert!(session.state().await.is_authenticated);

        session.logout().await;

        let state = session.state().await;
        assert!(!state.is_authenticated);
        assert!(state.user.is_none());
        assert!(state.profile.is_none());
        assert!(state.error.is_none());
        for key in [AUTH_TOKEN_KEY, USER_KEY, PROFILE_KEY] {
            assert_eq!(storage.get(key).await, None, "{key} should be cleared");
        }
    }

    #[tokio::test]
    async fn update_profile_requires_a_profile() {
        let session = session(LocalStore::in_memory());
        let update = ProfileUpdate {
            bio: Some("hello".into()),
            ..ProfileUpdate::default()
        };
        assert!(session.update_profile(&update).await.is_none());

        session.set_user(user()).await.unwrap();
        let updated = session.update_profile(&update).await.unwrap();
        assert_eq!(updated.bio, "hello");
        assert_eq!(session.api().storage().load_profile().await, Some(updated));
    }

    #[tokio::test]
    async fn token_removal_in_another_tab_signs_out() {
        let storage = LocalStore::in_memory();
        let this_tab = session(storage.new_tab());
        this_tab.set_user(user()).await.unwrap();
        let other_tab = storage.new_tab();

        other_tab.remove(AUTH_TOKEN_KEY).await.unwrap();
        this_tab
            .handle_storage_event(&StorageEvent {
                origin: other_tab.origin(),
                key: AUTH_TOKEN_KEY.to_string(),
                new_value: None,
            })
            .await;

        assert!(!this_tab.state().await.is_authenticated);
    }

    #[tokio::test]
    async fn own_events_and_other_keys_are_ignored() {
        let storage = LocalStore::in_memory();
        let tab = session(storage.clone());
        tab.set_user(user()).await.unwrap();

        tab.handle_storage_event(&StorageEvent {
            origin: storage.origin(),
            key: AUTH_TOKEN_KEY.to_string(),
            new_value: None,
        })
        .await;
        tab.handle_storage_event(&StorageEvent {
            origin: 99,
            key: "theme".to_string(),
            new_value: None,
        })
        .await;

        assert!(tab.state().await.is_authenticated);
    }

    #[test]
    fn registration_form_checks_fields() {
        assert!(form().validate().is_ok());

        let mut missing = form();
        missing.city.clear();
        assert_eq!(missing.validate().unwrap_err(), "Please fill in all fields");

        let mut mismatch = form();
        mismatch.confirm_password = "other".into();
        assert_eq!(mismatch.validate().unwrap_err(), "Passwords do not match");

        let mut unchecked = form();
        unchecked.agreed = None;
        assert_eq!(unchecked.validate().unwrap_err(), "You must agree to the terms");
    }
}
