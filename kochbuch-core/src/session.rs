//! Application state held by a client for its whole lifetime.
//!
//! [`AppStore`] is the single place the state lives. It is written through
//! its methods and read through snapshots or a `watch` receiver.
//! [`SessionHolder`] drives it: it runs the start-up fetches, listens to
//! session events through an [`AuthSubscription`] and releases the
//! subscription on shutdown.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::backend::{AuthEvent, AuthSubscription, SessionClient, SignUp};
use crate::error::DataError;
use crate::kitchen::Kitchen;
use crate::routes::{Access, Route};
use crate::types::{Identity, Recipe};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The initial session check has not finished.
    Loading,
    Authenticated(Identity),
    Anonymous,
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppSnapshot {
    pub session: SessionState,
    pub recipes: Vec<Recipe>,
    pub recipes_loading: bool,
    pub route: Route,
    /// Message of the most recent failed background fetch.
    pub last_error: Option<String>,
}

impl Default for AppSnapshot {
    fn default() -> Self {
        Self {
            session: SessionState::Loading,
            recipes: Vec::new(),
            recipes_loading: true,
            route: Route::Home,
            last_error: None,
        }
    }
}

impl AppSnapshot {
    pub fn is_logged_in(&self) -> bool {
        self.session.identity().is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.session.is_loading() || self.recipes_loading
    }
}

pub struct AppStore {
    state: watch::Sender<AppSnapshot>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AppSnapshot::default());
        Self { state }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppSnapshot> {
        self.state.subscribe()
    }

    pub fn update(&self, f: impl FnOnce(&mut AppSnapshot)) {
        self.state.send_modify(f);
    }

    pub fn set_session(&self, session: SessionState) {
        self.update(|s| s.session = session);
    }

    pub fn set_recipes(&self, recipes: Result<Vec<Recipe>, DataError>) {
        self.update(|s| {
            s.recipes_loading = false;
            match recipes {
                Ok(recipes) => {
                    s.recipes = recipes;
                    s.last_error = None;
                }
                Err(e) => s.last_error = Some(e.to_string()),
            }
        });
    }

    /// Move to `route`, or to where the guard sends us instead.
    pub fn navigate(&self, route: Route) -> Access {
        let mut access = Access::Render;
        self.update(|s| {
            access = route.access(&s.session);
            s.route = match access {
                Access::Redirect(target) => target,
                _ => route,
            };
        });
        access
    }

    fn apply(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(user) | AuthEvent::UserUpdated(user) => {
                self.set_session(SessionState::Authenticated(user))
            }
            AuthEvent::SignedOut => self.set_session(SessionState::Anonymous),
        }
    }
}

/// Where the recipe list shown on the home route comes from.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, DataError>;
}

#[async_trait]
impl RecipeSource for Kitchen {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, DataError> {
        Kitchen::list_recipes(self).await
    }
}

type Listener = (oneshot::Sender<()>, JoinHandle<()>);

pub struct SessionHolder {
    app: Arc<AppStore>,
    client: Arc<dyn SessionClient>,
    recipes: Arc<dyn RecipeSource>,
    listener: Mutex<Option<Listener>>,
}

impl SessionHolder {
    pub fn new(client: Arc<dyn SessionClient>, recipes: Arc<dyn RecipeSource>) -> Self {
        Self {
            app: Arc::new(AppStore::new()),
            client,
            recipes,
            listener: Mutex::new(None),
        }
    }

    pub fn app(&self) -> &Arc<AppStore> {
        &self.app
    }

    pub fn snapshot(&self) -> AppSnapshot {
        self.app.snapshot()
    }

    /// Subscribe to session events, then fetch recipes and check the session
    /// concurrently.
    pub async fn start(&self) {
        self.listen();

        let (recipes, session) =
            tokio::join!(self.recipes.list_recipes(), self.client.current_session());

        if let Err(e) = &recipes {
            tracing::warn!("Initial recipe fetch failed: {}", e);
        }
        self.app.set_recipes(recipes);

        let resolved = match session {
            Ok(Some(session)) => SessionState::Authenticated(session.user),
            Ok(None) => SessionState::Anonymous,
            Err(e) => {
                tracing::warn!("Session check failed: {}", e);
                SessionState::Anonymous
            }
        };
        // An event may already have settled the session.
        self.app.update(|s| {
            if s.session.is_loading() {
                s.session = resolved;
            }
        });
    }

    fn listen(&self) {
        let mut listener = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        if listener.is_some() {
            return;
        }

        let subscription = self.client.subscribe();
        let app = self.app.clone();
        let (stop, stopped) = oneshot::channel();
        let handle = tokio::spawn(run_listener(subscription, app, stopped));
        *listener = Some((stop, handle));
    }

    /// Wait until the initial session check has finished.
    pub async fn ready(&self) -> AppSnapshot {
        let mut rx = self.app.subscribe();
        let settled = rx.wait_for(|s| !s.session.is_loading()).await;
        match settled {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.app.snapshot(),
        }
    }

    pub fn guard(&self, route: Route) -> Access {
        route.access(&self.app.snapshot().session)
    }

    pub fn navigate(&self, route: Route) -> Access {
        self.app.navigate(route)
    }

    /// The signed-in identity, or `Unauthenticated`.
    pub fn current_user(&self) -> Result<Identity, DataError> {
        self.app
            .snapshot()
            .session
            .identity()
            .cloned()
            .ok_or(DataError::Unauthenticated)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, DataError> {
        let user = self.client.sign_in(email, password).await?;
        self.app.set_session(SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    pub async fn sign_up(&self, request: SignUp) -> Result<Identity, DataError> {
        let user = self.client.sign_up(request).await?;
        self.app.set_session(SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    /// Clear the identity everywhere and go home.
    pub async fn sign_out(&self) -> Result<(), DataError> {
        self.client.sign_out().await?;
        self.app.update(|s| {
            s.session = SessionState::Anonymous;
            s.route = Route::Home;
        });
        Ok(())
    }

    /// Re-read the user after a profile change.
    pub async fn refresh_user(&self) -> Result<(), DataError> {
        match self.client.refresh_user().await? {
            Some(user) => self.app.set_session(SessionState::Authenticated(user)),
            None => self.app.set_session(SessionState::Anonymous),
        }
        Ok(())
    }

    /// Re-fetch the recipe list after a mutation.
    pub async fn refresh_recipes(&self) {
        let recipes = self.recipes.list_recipes().await;
        if let Err(e) = &recipes {
            tracing::warn!("Recipe refresh failed: {}", e);
        }
        self.app.set_recipes(recipes);
    }

    /// Stop listening and release the session subscription.
    pub async fn shutdown(&self) {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some((stop, handle)) = listener {
            let _ = stop.send(());
            if let Err(e) = handle.await {
                tracing::warn!("Session listener ended abnormally: {}", e);
            }
        }
    }
}

async fn run_listener(
    mut subscription: AuthSubscription,
    app: Arc<AppStore>,
    mut stopped: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut stopped => break,
            event = subscription.next() => match event {
                Some(event) => {
                    tracing::debug!(?event, "Session event");
                    app.apply(event);
                }
                None => break,
            },
        }
    }
    subscription.unsubscribe();
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            image_url: None,
        }
    }

    #[test]
    fn test_snapshot_defaults_to_loading() {
        let app = AppStore::new();
        let snap = app.snapshot();
        assert!(snap.is_loading());
        assert!(!snap.is_logged_in());
        assert_eq!(snap.route, Route::Home);
    }

    #[test]
    fn test_navigate_redirects_when_anonymous() {
        let app = AppStore::new();
        app.set_session(SessionState::Anonymous);
        assert_eq!(app.navigate(Route::Profile), Access::Redirect(Route::Login));
        assert_eq!(app.snapshot().route, Route::Login);

        app.set_session(SessionState::Authenticated(identity()));
        assert_eq!(app.navigate(Route::Profile), Access::Render);
        assert_eq!(app.snapshot().route, Route::Profile);
    }

    #[test]
    fn test_failed_fetch_keeps_previous_recipes() {
        let app = AppStore::new();
        app.set_recipes(Ok(Vec::new()));
        app.set_recipes(Err(DataError::NotFound));
        let snap = app.snapshot();
        assert!(!snap.recipes_loading);
        assert_eq!(snap.last_error.as_deref(), Some("Not found"));
    }

    #[test]
    fn test_events_drive_session() {
        let app = AppStore::new();
        let user = identity();
        app.apply(AuthEvent::SignedIn(user.clone()));
        assert_eq!(app.snapshot().session, SessionState::Authenticated(user));
        app.apply(AuthEvent::SignedOut);
        assert_eq!(app.snapshot().session, SessionState::Anonymous);
    }
}
