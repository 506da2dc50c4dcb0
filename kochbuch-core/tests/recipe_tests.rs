//! Recipe operations against the in-memory backend.

mod common;

use common::{ingredient, soup, Fixture};
use kochbuch_core::DataError;
use uuid::Uuid;

#[tokio::test]
async fn test_soup_create_then_delete() {
    let fx = Fixture::new();
    let cook = fx.user("cook").await;

    let recipe = fx.kitchen.create_recipe(&cook, soup(&fx.soups)).await.unwrap();
    assert_eq!(recipe.ingredients.len(), 1);
    assert_eq!(recipe.ingredients[0].name, "Water");
    assert_eq!(recipe.ingredients[0].quantity, Some(1.0));
    assert_eq!(recipe.ingredients[0].unit.as_deref(), Some("l"));
    assert_eq!(recipe.category.as_deref(), Some("Suppen"));
    assert_eq!(recipe.user_id, cook.id);

    fx.kitchen.delete_recipe(&cook, recipe.id).await.unwrap();

    assert_eq!(
        fx.kitchen.get_recipe(recipe.id).await,
        Err(DataError::NotFound)
    );
    assert_eq!(fx.backend.store.ingredient_count(recipe.id), 0);
}

#[tokio::test]
async fn test_ingredient_count_matches_named_rows() {
    let fx = Fixture::new();
    let cook = fx.user("cook").await;

    for names in [vec!["Water"], vec!["Water", "", "Salt"], vec!["a", "b", "c", " "]] {
        let mut draft = soup(&fx.soups);
        draft.ingredients = names.iter().map(|n| ingredient(n, None, None)).collect();
        let expected = names.iter().filter(|n| !n.trim().is_empty()).count();

        let recipe = fx.kitchen.create_recipe(&cook, draft).await.unwrap();
        assert_eq!(recipe.ingredients.len(), expected);
        assert_eq!(fx.backend.store.ingredient_count(recipe.id), expected);
    }
}

#[tokio::test]
async fn test_create_without_named_ingredient_never_reaches_store() {
    let fx = Fixture::new();
    let cook = fx.user("cook").await;
    let mut draft = soup(&fx.soups);
    draft.ingredients = vec![ingredient("  ", Some(2.0), None)];

    // Any store call would fail with Store(Unavailable).
    fx.backend.store.set_unavailable(true);
    let result = fx.kitchen.create_recipe(&cook, draft).await;
    assert!(matches!(result, Err(DataError::Validation(_))));
}

#[tokio::test]
async fn test_negative_quantity_is_rejected_on_create_and_update() {
    let fx = Fixture::new();
    let cook = fx.user("cook").await;
    let recipe = fx.kitchen.create_recipe(&cook, soup(&fx.soups)).await.unwrap();

    let mut draft = soup(&fx.soups);
    draft.ingredients = vec![ingredient("Water", Some(-3.0), Some("l"))];
    assert!(matches!(
        fx.kitchen.create_recipe(&cook, draft.clone()).await,
        Err(DataError::Validation(_))
    ));
    assert!(matches!(
        fx.kitchen.update_recipe(&cook, recipe.id, draft).await,
        Err(DataError::Validation(_))
    ));

    let stored = fx.kitchen.get_recipe(recipe.id).await.unwrap();
    assert_eq!(stored.ingredients[0].quantity, Some(1.0));
}

#[tokio::test]
async fn test_create_with_unknown_category_is_rejected() {
    let fx = Fixture::new();
    let cook = fx.user("cook").await;
    let mut draft = soup(&fx.soups);
    draft.category_id = Uuid::new_v4();

    let result = fx.kitchen.create_recipe(&cook, draft).await;
    assert!(matches!(result, Err(DataError::Validation(_))));
    assert!(fx.kitchen.list_recipes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_by_non_owner_changes_nothing() {
    let fx = Fixture::new();
    let owner = fx.user("owner").await;
    let intruder = fx.user("intruder").await;
    let recipe = fx.kitchen.create_recipe(&owner, soup(&fx.soups)).await.unwrap();

    let mut draft = soup(&fx.desserts);
    draft.name = "Hijacked".to_string();
    draft.ingredients = vec![ingredient("Sugar", None, None)];

    let result = fx.kitchen.update_recipe(&intruder, recipe.id, draft).await;
    assert_eq!(result, Err(DataError::Unauthorized));

    let stored = fx.kitchen.get_recipe(recipe.id).await.unwrap();
    assert_eq!(stored.name, "Soup");
    assert_eq!(stored.category_id, fx.soups.id);
    assert_eq!(stored.ingredients.len(), 1);
    assert_eq!(stored.ingredients[0].name, "Water");
}

#[tokio::test]
async fn test_delete_by_non_owner_is_rejected() {
    let fx = Fixture::new();
    let owner = fx.user("owner").await;
    let intruder = fx.user("intruder").await;
    let recipe = fx.kitchen.create_recipe(&owner, soup(&fx.soups)).await.unwrap();

    assert_eq!(
        fx.kitchen.delete_recipe(&intruder, recipe.id).await,
        Err(DataError::Unauthorized)
    );
    assert!(fx.kitchen.get_recipe(recipe.id).await.is_ok());
}

#[tokio::test]
async fn test_update_replaces_ingredients_wholesale() {
    let fx = Fixture::new();
    let cook = fx.user("cook").await;
    let recipe = fx.kitchen.create_recipe(&cook, soup(&fx.soups)).await.unwrap();

    let mut draft = soup(&fx.desserts);
    draft.name = "Pudding".to_string();
    draft.servings = 6;
    draft.ingredients = vec![
        ingredient("Milk", Some(0.5), Some("l")),
        ingredient("Sugar", Some(80.0), Some("g")),
    ];
    let updated = fx.kitchen.update_recipe(&cook, recipe.id, draft).await.unwrap();

    assert_eq!(updated.name, "Pudding");
    assert_eq!(updated.servings, 6);
    assert_eq!(updated.category.as_deref(), Some("Desserts"));
    let names: Vec<_> = updated.ingredients.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Milk", "Sugar"]);
    assert_eq!(fx.backend.store.ingredient_count(recipe.id), 2);
}

#[tokio::test]
async fn test_update_and_delete_missing_recipe() {
    let fx = Fixture::new();
    let cook = fx.user("cook").await;
    let missing = Uuid::new_v4();

    assert_eq!(
        fx.kitchen.update_recipe(&cook, missing, soup(&fx.soups)).await,
        Err(DataError::NotFound)
    );
    assert_eq!(
        fx.kitchen.delete_recipe(&cook, missing).await,
        Err(DataError::NotFound)
    );
}

#[tokio::test]
async fn test_get_includes_creator_summary() {
    let fx = Fixture::new();
    let cook = fx.user("cook").await;
    let recipe = fx.kitchen.create_recipe(&cook, soup(&fx.soups)).await.unwrap();

    let fetched = fx.kitchen.get_recipe(recipe.id).await.unwrap();
    let creator = fetched.creator.expect("creator summary");
    assert_eq!(creator.username, "cook");
    assert_eq!(creator.image_url, None);
}

#[tokio::test]
async fn test_lists_are_newest_first_and_scoped() {
    let fx = Fixture::new();
    let alice = fx.user("alice").await;
    let bob = fx.user("bob").await;

    let mut first = soup(&fx.soups);
    first.name = "First".to_string();
    let first = fx.kitchen.create_recipe(&alice, first).await.unwrap();
    let mut second = soup(&fx.soups);
    second.name = "Second".to_string();
    let second = fx.kitchen.create_recipe(&bob, second).await.unwrap();

    let all: Vec<_> = fx
        .kitchen
        .list_recipes()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(all, [second.id, first.id]);

    let mine = fx.kitchen.list_my_recipes(&alice).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, first.id);
    assert_eq!(mine[0].ingredients.len(), 1);
}

#[tokio::test]
async fn test_store_failure_is_not_an_empty_list() {
    let fx = Fixture::new();
    fx.backend.store.set_unavailable(true);
    assert!(matches!(
        fx.kitchen.list_recipes().await,
        Err(DataError::Store(_))
    ));
    assert!(matches!(
        fx.kitchen.get_recipe(Uuid::new_v4()).await,
        Err(DataError::Store(_))
    ));
}

#[tokio::test]
async fn test_categories_sorted_by_name() {
    let fx = Fixture::new();
    let names: Vec<_> = fx
        .kitchen
        .list_categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["Desserts", "Suppen"]);
}
