mod common;

use common::Fixture;
use kochbuch_core::DataError;
use uuid::Uuid;

#[tokio::test]
async fn test_add_to_cart_increments_quantity() {
    let fx = Fixture::new();
    let shopper = fx.user("shopper").await;
    let tomato = fx
        .backend
        .store
        .add_product("Tomaten", Some(2.5), Some("Bio"), Some("Gemüse"));
    let bread = fx.backend.store.add_product("Brot", None, None, None);

    assert_eq!(fx.kitchen.cart(&shopper).await.unwrap().cart_id, None);

    fx.kitchen.add_to_cart(&shopper, tomato.id).await.unwrap();
    fx.kitchen.add_to_cart(&shopper, bread.id).await.unwrap();
    let cart = fx.kitchen.add_to_cart(&shopper, tomato.id).await.unwrap();

    assert!(cart.cart_id.is_some());
    assert_eq!(cart.items.len(), 2);
    let tomatoes = cart
        .items
        .iter()
        .find(|l| l.product.id == tomato.id)
        .unwrap();
    assert_eq!(tomatoes.quantity, 2);
    assert!((cart.total - 5.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_remove_cart_item() {
    let fx = Fixture::new();
    let shopper = fx.user("shopper").await;
    let other = fx.user("other").await;
    let milk = fx.backend.store.add_product("Milch", Some(1.2), None, None);

    let cart = fx.kitchen.add_to_cart(&shopper, milk.id).await.unwrap();
    let line = cart.items[0].id;

    // Someone else's cart cannot be touched.
    fx.kitchen.add_to_cart(&other, milk.id).await.unwrap();
    assert_eq!(
        fx.kitchen.remove_cart_item(&other, line).await,
        Err(DataError::NotFound)
    );

    let cart = fx.kitchen.remove_cart_item(&shopper, line).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, 0.0);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let fx = Fixture::new();
    let shopper = fx.user("shopper").await;
    assert_eq!(
        fx.kitchen.add_to_cart(&shopper, Uuid::new_v4()).await,
        Err(DataError::NotFound)
    );
}

#[tokio::test]
async fn test_product_search_is_case_insensitive() {
    let fx = Fixture::new();
    fx.backend.store.add_product("Tomaten", None, None, None);
    fx.backend.store.add_product("Kirschtomaten", None, None, None);
    fx.backend.store.add_product("Gurke", None, None, None);

    assert_eq!(fx.kitchen.list_products(None).await.unwrap().len(), 3);
    assert_eq!(fx.kitchen.list_products(Some("TOMATE")).await.unwrap().len(), 2);
    assert_eq!(fx.kitchen.list_products(Some("  ")).await.unwrap().len(), 3);
}
