use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::error::AuthError;
use crate::types::Identity;

/// Sign-up request: credentials plus the profile attributes copied onto the
/// profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: Identity,
    pub expires_at: DateTime<Utc>,
}

/// Server side of the identity provider: issues and resolves bearer tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, request: SignUp) -> Result<AuthSession, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Resolve a token to its user. Unknown or expired tokens yield `None`.
    async fn user(&self, access_token: &str) -> Result<Option<Identity>, AuthError>;
}

/// Session change delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
    UserUpdated(Identity),
}

impl AuthEvent {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthEvent::SignedIn(user) | AuthEvent::UserUpdated(user) => Some(user),
            AuthEvent::SignedOut => None,
        }
    }
}

/// Registration of one session listener.
///
/// The listener stays registered until [`AuthSubscription::unsubscribe`] is
/// called or the subscription is dropped.
#[derive(Debug)]
pub struct AuthSubscription {
    receiver: Option<broadcast::Receiver<AuthEvent>>,
}

impl AuthSubscription {
    pub fn new(receiver: broadcast::Receiver<AuthEvent>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// Wait for the next event. Returns `None` once unsubscribed or when the
    /// sending side is gone.
    pub async fn next(&mut self) -> Option<AuthEvent> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "auth subscriber lagged, dropping old events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    pub fn unsubscribe(&mut self) {
        self.receiver = None;
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }
}

/// Client side of the identity provider: holds the current session and
/// notifies subscribers when it changes.
#[async_trait]
pub trait SessionClient: Send + Sync {
    async fn sign_up(&self, request: SignUp) -> Result<Identity, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The stored session, if it is still accepted by the provider.
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError>;

    /// Re-read the user behind the current session and announce it.
    async fn refresh_user(&self) -> Result<Option<Identity>, AuthError>;

    fn subscribe(&self) -> AuthSubscription;
}

const EVENT_CAPACITY: usize = 16;

/// In-process [`SessionClient`] over any [`IdentityProvider`].
pub struct LocalSessionClient {
    provider: Arc<dyn IdentityProvider>,
    session: Mutex<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl LocalSessionClient {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            provider,
            session: Mutex::new(None),
            events,
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    pub fn access_token(&self) -> Option<String> {
        self.lock_session().as_ref().map(|s| s.access_token.clone())
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, Option<AuthSession>> {
        // A poisoned lock only means a panic elsewhere; the session value is still usable.
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn store(&self, session: Option<AuthSession>) {
        *self.lock_session() = session;
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl SessionClient for LocalSessionClient {
    async fn sign_up(&self, request: SignUp) -> Result<Identity, AuthError> {
        let session = self.provider.sign_up(request).await?;
        let user = session.user.clone();
        self.store(Some(session));
        self.emit(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let session = self.provider.sign_in(email, password).await?;
        let user = session.user.clone();
        self.store(Some(session));
        self.emit(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(token) = self.access_token() {
            self.provider.sign_out(&token).await?;
        }
        self.store(None);
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        let Some(session) = self.lock_session().clone() else {
            return Ok(None);
        };

        if session.expires_at <= Utc::now() {
            self.store(None);
            return Ok(None);
        }

        match self.provider.user(&session.access_token).await? {
            Some(user) => {
                let refreshed = AuthSession { user, ..session };
                self.store(Some(refreshed.clone()));
                Ok(Some(refreshed))
            }
            None => {
                self.store(None);
                Ok(None)
            }
        }
    }

    async fn refresh_user(&self) -> Result<Option<Identity>, AuthError> {
        let session = self.current_session().await?;
        let user = session.map(|s| s.user);
        if let Some(user) = &user {
            self.emit(AuthEvent::UserUpdated(user.clone()));
        }
        Ok(user)
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(self.events.subscribe())
    }
}
