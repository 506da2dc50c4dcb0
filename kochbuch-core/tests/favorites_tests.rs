mod common;

use common::{soup, Fixture};
use kochbuch_core::DataError;
use uuid::Uuid;

#[tokio::test]
async fn test_check_favorite_states() {
    let fx = Fixture::new();
    let cook = fx.user("cook").await;
    let fan = fx.user("fan").await;
    let recipe = fx.kitchen.create_recipe(&cook, soup(&fx.soups)).await.unwrap();
    let other = fx.kitchen.create_recipe(&cook, soup(&fx.soups)).await.unwrap();

    // No list at all.
    assert!(!fx.kitchen.is_favorite(&fan, recipe.id).await.unwrap());

    // List exists, but without this recipe.
    fx.kitchen.add_favorite(&fan, other.id).await.unwrap();
    assert!(!fx.kitchen.is_favorite(&fan, recipe.id).await.unwrap());

    fx.kitchen.add_favorite(&fan, recipe.id).await.unwrap();
    assert!(fx.kitchen.is_favorite(&fan, recipe.id).await.unwrap());
}

#[tokio::test]
async fn test_add_favorite_is_idempotent() {
    let fx = Fixture::new();
    let fan = fx.user("fan").await;
    let recipe = fx.kitchen.create_recipe(&fan, soup(&fx.soups)).await.unwrap();

    fx.kitchen.add_favorite(&fan, recipe.id).await.unwrap();
    fx.kitchen.add_favorite(&fan, recipe.id).await.unwrap();

    assert_eq!(fx.backend.store.favorite_item_count(recipe.id), 1);
    assert_eq!(fx.backend.store.favorites_list_count(fan.id), 1);
}

#[tokio::test]
async fn test_concurrent_first_favorites_share_one_list() {
    let fx = Fixture::new();
    let fan = fx.user("fan").await;
    let a = fx.kitchen.create_recipe(&fan, soup(&fx.soups)).await.unwrap();
    let b = fx.kitchen.create_recipe(&fan, soup(&fx.soups)).await.unwrap();

    let (ra, rb) = tokio::join!(
        fx.kitchen.add_favorite(&fan, a.id),
        fx.kitchen.add_favorite(&fan, b.id)
    );
    ra.unwrap();
    rb.unwrap();

    assert_eq!(fx.backend.store.favorites_list_count(fan.id), 1);
    assert_eq!(fx.kitchen.list_favorites(&fan).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_add_unknown_recipe_is_not_found() {
    let fx = Fixture::new();
    let fan = fx.user("fan").await;
    assert_eq!(
        fx.kitchen.add_favorite(&fan, Uuid::new_v4()).await,
        Err(DataError::NotFound)
    );
    assert_eq!(fx.backend.store.favorites_list_count(fan.id), 0);
}

#[tokio::test]
async fn test_remove_favorite() {
    let fx = Fixture::new();
    let fan = fx.user("fan").await;
    let recipe = fx.kitchen.create_recipe(&fan, soup(&fx.soups)).await.unwrap();

    assert!(!fx.kitchen.remove_favorite(&fan, recipe.id).await.unwrap());
    fx.kitchen.add_favorite(&fan, recipe.id).await.unwrap();
    assert!(fx.kitchen.remove_favorite(&fan, recipe.id).await.unwrap());
    assert!(!fx.kitchen.is_favorite(&fan, recipe.id).await.unwrap());
}

#[tokio::test]
async fn test_list_favorites_most_recent_first() {
    let fx = Fixture::new();
    let fan = fx.user("fan").await;
    assert!(fx.kitchen.list_favorites(&fan).await.unwrap().is_empty());

    let older = fx.kitchen.create_recipe(&fan, soup(&fx.soups)).await.unwrap();
    let newer = fx.kitchen.create_recipe(&fan, soup(&fx.soups)).await.unwrap();
    fx.kitchen.add_favorite(&fan, older.id).await.unwrap();
    fx.kitchen.add_favorite(&fan, newer.id).await.unwrap();

    let ids: Vec<_> = fx
        .kitchen
        .list_favorites(&fan)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, [newer.id, older.id]);
}

#[tokio::test]
async fn test_deleting_recipe_removes_favorite_items() {
    let fx = Fixture::new();
    let cook = fx.user("cook").await;
    let fan = fx.user("fan").await;
    let recipe = fx.kitchen.create_recipe(&cook, soup(&fx.soups)).await.unwrap();
    fx.kitchen.add_favorite(&fan, recipe.id).await.unwrap();

    fx.kitchen.delete_recipe(&cook, recipe.id).await.unwrap();

    assert_eq!(fx.backend.store.favorite_item_count(recipe.id), 0);
    assert!(fx.kitchen.list_favorites(&fan).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_check_favorite_reports_store_failure() {
    let fx = Fixture::new();
    let fan = fx.user("fan").await;
    fx.backend.store.set_unavailable(true);
    assert!(matches!(
        fx.kitchen.is_favorite(&fan, Uuid::new_v4()).await,
        Err(DataError::Store(_))
    ));
}
