//! Session client that talks to the server and keeps the session in a file
//! between invocations.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use kochbuch_core::{
    AuthError, AuthEvent, AuthSession, AuthSubscription, Identity, SessionClient, SignUp,
};
use tokio::sync::broadcast;

use crate::client::ApiClient;

pub const SESSION_FILE_ENV: &str = "KOCHBUCH_SESSION_FILE";

/// `$KOCHBUCH_SESSION_FILE`, else `~/.kochbuch/session.json`.
pub fn default_session_file() -> PathBuf {
    if let Ok(path) = std::env::var(SESSION_FILE_ENV) {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kochbuch")
        .join("session.json")
}

fn load(path: &Path) -> Option<AuthSession> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("Failed to read session file {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!("Ignoring unreadable session file {}: {}", path.display(), e);
            None
        }
    }
}

/// The file holds a bearer token: owner-only on unix.
#[cfg(unix)]
fn write_private(path: &Path, text: &str) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::DirBuilder::new().recursive(true).mode(0o700).create(parent)?;
    }
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies to new files.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(text.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)
}

fn save(path: &Path, session: Option<&AuthSession>) -> Result<(), AuthError> {
    let result = match session {
        Some(session) => {
            let text = serde_json::to_string_pretty(session)
                .map_err(|e| AuthError::Provider(e.to_string()))?;
            write_private(path, &text)
        }
        None => match fs::remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        },
    };
    result.map_err(|e| AuthError::Provider(format!("{}: {}", path.display(), e)))
}

pub struct RemoteSession {
    api: ApiClient,
    path: PathBuf,
    session: Mutex<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl RemoteSession {
    pub fn new(api: ApiClient, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = load(&path);
        let (events, _) = broadcast::channel(16);
        Self {
            api,
            path,
            session: Mutex::new(session),
            events,
        }
    }

    /// Token of the stored session, without checking it with the server.
    pub fn access_token(&self) -> Option<String> {
        self.lock().as_ref().map(|s| s.access_token.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<AuthSession>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn store(&self, session: Option<AuthSession>) -> Result<(), AuthError> {
        save(&self.path, session.as_ref())?;
        *self.lock() = session;
        Ok(())
    }

    fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    fn signed_in(&self, session: AuthSession) -> Result<Identity, AuthError> {
        let user = session.user.clone();
        self.store(Some(session))?;
        self.emit(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }
}

#[async_trait]
impl SessionClient for RemoteSession {
    async fn sign_up(&self, request: SignUp) -> Result<Identity, AuthError> {
        let session = self.api.sign_up(&request).await?;
        self.signed_in(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let session = self.api.sign_in(email, password).await?;
        self.signed_in(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(token) = self.access_token() {
            self.api.with_token(token).sign_out().await?;
        }
        self.store(None)?;
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        let Some(session) = self.lock().clone() else {
            return Ok(None);
        };

        if session.expires_at <= Utc::now() {
            self.store(None)?;
            return Ok(None);
        }

        match self.api.with_token(&session.access_token).session_user().await? {
            Some(user) => {
                let refreshed = AuthSession { user, ..session };
                self.store(Some(refreshed.clone()))?;
                Ok(Some(refreshed))
            }
            None => {
                self.store(None)?;
                Ok(None)
            }
        }
    }

    async fn refresh_user(&self) -> Result<Option<Identity>, AuthError> {
        let user = self.current_session().await?.map(|s| s.user);
        if let Some(user) = &user {
            self.emit(AuthEvent::UserUpdated(user.clone()));
        }
        Ok(user)
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(self.events.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::Duration;
    use uuid::Uuid;

    fn temp_file() -> PathBuf {
        std::env::temp_dir()
            .join(format!("kochbuch-cli-{}", Uuid::new_v4()))
            .join("session.json")
    }

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "erika@example.com".into(),
            username: "erika".into(),
            first_name: "Erika".into(),
            last_name: "Mustermann".into(),
            image_url: None,
        }
    }

    fn session(expires_in: Duration) -> AuthSession {
        AuthSession {
            access_token: "token".into(),
            user: identity(),
            expires_at: Utc::now() + expires_in,
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_session_file_round_trip() {
        let path = temp_file();
        let stored = session(Duration::hours(1));
        save(&path, Some(&stored)).unwrap();
        assert_eq!(load(&path), Some(stored));

        save(&path, None).unwrap();
        assert_eq!(load(&path), None);
        // Clearing twice is fine.
        save(&path, None).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_file();
        let parent = path.parent().unwrap().to_path_buf();
        save(&path, Some(&session(Duration::hours(1)))).unwrap();

        let file_mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o777, 0o600);
        let dir_mode = fs::metadata(&parent).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o700);

        // A world-readable leftover gets tightened on the next save.
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        save(&path, Some(&session(Duration::hours(2)))).unwrap();
        let file_mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o777, 0o600);
    }

    #[test]
    fn test_garbage_session_file_is_ignored() {
        let path = temp_file();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        assert_eq!(load(&path), None);
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped_without_a_request() {
        let path = temp_file();
        save(&path, Some(&session(-Duration::minutes(1)))).unwrap();

        // Nothing listens here; a request would fail.
        let remote = RemoteSession::new(ApiClient::new("http://127.0.0.1:9"), &path);
        assert_eq!(remote.current_session().await, Ok(None));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_rejected_token_clears_the_file() {
        let base = serve(Router::new().route(
            "/api/auth/session",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"error": "Invalid or expired token"})),
                )
            }),
        ))
        .await;

        let path = temp_file();
        save(&path, Some(&session(Duration::hours(1)))).unwrap();
        let remote = RemoteSession::new(ApiClient::new(&base), &path);

        assert_eq!(remote.current_session().await, Ok(None));
        assert_eq!(remote.access_token(), None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_accepted_token_refreshes_the_user() {
        let renamed = Identity {
            username: "erika-neu".into(),
            ..identity()
        };
        let served = renamed.clone();
        let base = serve(Router::new().route(
            "/api/auth/session",
            get(move || {
                let user = served.clone();
                async move { Json(user) }
            }),
        ))
        .await;

        let path = temp_file();
        save(&path, Some(&session(Duration::hours(1)))).unwrap();
        let remote = RemoteSession::new(ApiClient::new(&base), &path);

        let current = remote.current_session().await.unwrap().unwrap();
        assert_eq!(current.user.username, "erika-neu");
        assert_eq!(load(&path).unwrap().user.username, "erika-neu");
    }
}
