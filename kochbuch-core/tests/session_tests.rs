//! Session state machine driven by the in-memory identity provider.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{sign_up, soup, Fixture};
use kochbuch_core::{
    Access, AuthEvent, DataError, IdentityProvider, LocalSessionClient, Route, SessionClient,
    SessionHolder, SessionState,
};

fn holder(fx: &Fixture) -> (Arc<LocalSessionClient>, SessionHolder) {
    let client = Arc::new(LocalSessionClient::new(fx.backend.identity.clone()));
    let holder = SessionHolder::new(client.clone(), Arc::new(fx.kitchen.clone()));
    (client, holder)
}

async fn settle<F: Fn(&SessionState) -> bool>(holder: &SessionHolder, f: F) {
    let mut rx = holder.app().subscribe();
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| f(&s.session)))
        .await
        .expect("session settled in time")
        .expect("store alive");
}

#[tokio::test]
async fn test_start_without_session_is_anonymous() {
    let fx = Fixture::new();
    let cook = fx.user("cook").await;
    fx.kitchen.create_recipe(&cook, soup(&fx.soups)).await.unwrap();
    let (_client, holder) = holder(&fx);

    assert_eq!(holder.guard(Route::Favorites), Access::Placeholder);
    holder.start().await;

    let snap = holder.ready().await;
    assert_eq!(snap.session, SessionState::Anonymous);
    assert_eq!(snap.recipes.len(), 1);
    assert!(!snap.is_loading());
    assert_eq!(holder.guard(Route::Favorites), Access::Redirect(Route::Login));
    assert_eq!(holder.current_user(), Err(DataError::Unauthenticated));
    holder.shutdown().await;
}

#[tokio::test]
async fn test_start_with_existing_session_is_authenticated() {
    let fx = Fixture::new();
    let (client, holder) = holder(&fx);
    let user = client.sign_up(sign_up("ada")).await.unwrap();

    holder.start().await;
    let snap = holder.ready().await;
    assert_eq!(snap.session, SessionState::Authenticated(user.clone()));
    assert_eq!(holder.current_user().unwrap().id, user.id);
    assert_eq!(holder.guard(Route::MyRecipes), Access::Render);
    holder.shutdown().await;
}

#[tokio::test]
async fn test_sign_out_on_gated_view_redirects_to_login() {
    let fx = Fixture::new();
    let (_client, holder) = holder(&fx);
    holder.start().await;
    holder.ready().await;

    holder.sign_up(sign_up("ada")).await.unwrap();
    assert_eq!(holder.navigate(Route::Favorites), Access::Render);
    assert_eq!(holder.snapshot().route, Route::Favorites);

    holder.sign_out().await.unwrap();

    let snap = holder.snapshot();
    assert_eq!(snap.session, SessionState::Anonymous);
    assert_eq!(snap.route, Route::Home);
    assert_eq!(holder.guard(Route::Favorites), Access::Redirect(Route::Login));
    assert_eq!(holder.navigate(Route::Favorites), Access::Redirect(Route::Login));
    assert_eq!(holder.snapshot().route, Route::Login);
    holder.shutdown().await;
}

#[tokio::test]
async fn test_events_from_other_callers_reach_the_holder() {
    let fx = Fixture::new();
    let (client, holder) = holder(&fx);
    holder.start().await;
    holder.ready().await;

    // Sign in through the client directly, bypassing the holder.
    fx.backend.identity.sign_up(sign_up("ada")).await.unwrap();
    let user = client.sign_in("ada@example.com", "hunter22").await.unwrap();
    settle(&holder, |s| s.identity().is_some()).await;
    assert_eq!(holder.current_user().unwrap(), user);

    client.sign_out().await.unwrap();
    settle(&holder, |s| *s == SessionState::Anonymous).await;
    holder.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_releases_subscription() {
    let fx = Fixture::new();
    let (client, holder) = holder(&fx);
    assert_eq!(client.subscriber_count(), 0);

    holder.start().await;
    assert_eq!(client.subscriber_count(), 1);

    holder.shutdown().await;
    assert_eq!(client.subscriber_count(), 0);
}

#[tokio::test]
async fn test_subscription_unsubscribe_stops_delivery() {
    let fx = Fixture::new();
    let client = LocalSessionClient::new(fx.backend.identity.clone());
    let mut subscription = client.subscribe();

    let user = client.sign_up(sign_up("ada")).await.unwrap();
    assert_eq!(subscription.next().await, Some(AuthEvent::SignedIn(user)));

    subscription.unsubscribe();
    assert!(!subscription.is_active());
    assert_eq!(client.subscriber_count(), 0);
    client.sign_out().await.unwrap();
    assert_eq!(subscription.next().await, None);
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let fx = Fixture::new();
    let (_client, holder) = holder(&fx);
    holder.start().await;
    holder.ready().await;
    fx.backend.identity.sign_up(sign_up("ada")).await.unwrap();

    let result = holder.sign_in("ada@example.com", "wrong").await;
    assert!(matches!(result, Err(DataError::Auth(_))));
    assert_eq!(holder.snapshot().session, SessionState::Anonymous);
    holder.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_sign_up_fails() {
    let fx = Fixture::new();
    fx.user("ada").await;
    let result = fx.backend.identity.sign_up(sign_up("ada")).await;
    assert_eq!(result.unwrap_err(), kochbuch_core::AuthError::EmailTaken);
}

#[tokio::test]
async fn test_failed_sign_up_leaves_no_account() {
    let fx = Fixture::new();
    fx.backend.store.set_unavailable(true);
    let result = fx.backend.identity.sign_up(sign_up("ada")).await;
    assert!(matches!(result, Err(kochbuch_core::AuthError::Provider(_))));

    fx.backend.store.set_unavailable(false);
    let result = fx
        .backend
        .identity
        .sign_in("ada@example.com", "hunter22")
        .await;
    assert_eq!(result.unwrap_err(), kochbuch_core::AuthError::InvalidCredentials);

    let session = fx.backend.identity.sign_up(sign_up("ada")).await.unwrap();
    assert_eq!(session.user.username, "ada");
}

#[tokio::test]
async fn test_refresh_recipes_after_mutation() {
    let fx = Fixture::new();
    let (_client, holder) = holder(&fx);
    holder.start().await;
    let user = holder.sign_up(sign_up("ada")).await.unwrap();
    assert!(holder.snapshot().recipes.is_empty());

    fx.kitchen.create_recipe(&user, soup(&fx.soups)).await.unwrap();
    holder.refresh_recipes().await;
    assert_eq!(holder.snapshot().recipes.len(), 1);
    holder.shutdown().await;
}
