//! Product catalogue and per-user shopping cart.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::DataError;
use crate::kitchen::{store_failure, Kitchen};
use crate::types::{CartLine, CartView, Identity, Product};

impl Kitchen {
    /// Products, optionally filtered by a case-insensitive title search.
    pub async fn list_products(&self, search: Option<&str>) -> Result<Vec<Product>, DataError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        self.store
            .list_products(search)
            .await
            .map_err(store_failure("list products"))
    }

    /// Put one unit of a product in the cart, creating the cart on first use.
    pub async fn add_to_cart(
        &self,
        user: &Identity,
        product_id: Uuid,
    ) -> Result<CartView, DataError> {
        let known = self
            .store
            .products_by_ids(&[product_id])
            .await
            .map_err(store_failure("fetch product"))?;
        if known.is_empty() {
            return Err(DataError::NotFound);
        }

        let cart = self
            .store
            .get_or_create_cart(user.id)
            .await
            .map_err(store_failure("create cart"))?;
        self.store
            .add_cart_item(cart.id, product_id)
            .await
            .map_err(store_failure("add cart item"))?;

        self.cart(user).await
    }

    /// Cart lines with their products and the price total.
    pub async fn cart(&self, user: &Identity) -> Result<CartView, DataError> {
        let Some(cart) = self
            .store
            .find_cart(user.id)
            .await
            .map_err(store_failure("fetch cart"))?
        else {
            return Ok(CartView::default());
        };

        let items = self
            .store
            .cart_items(cart.id)
            .await
            .map_err(store_failure("list cart items"))?;
        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, Product> = self
            .store
            .products_by_ids(&product_ids)
            .await
            .map_err(store_failure("fetch cart products"))?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let lines: Vec<CartLine> = items
            .into_iter()
            .filter_map(|item| {
                products.get(&item.product_id).map(|product| CartLine {
                    id: item.id,
                    quantity: item.quantity,
                    product: product.clone(),
                })
            })
            .collect();

        Ok(CartView {
            cart_id: Some(cart.id),
            total: cart_total(&lines),
            items: lines,
        })
    }

    pub async fn remove_cart_item(
        &self,
        user: &Identity,
        item_id: Uuid,
    ) -> Result<CartView, DataError> {
        let cart = self
            .store
            .find_cart(user.id)
            .await
            .map_err(store_failure("fetch cart"))?
            .ok_or(DataError::NotFound)?;

        let removed = self
            .store
            .delete_cart_item(cart.id, item_id)
            .await
            .map_err(store_failure("remove cart item"))?;
        if removed == 0 {
            return Err(DataError::NotFound);
        }

        self.cart(user).await
    }
}

/// Sum of price times quantity. Products without a price count as free.
pub fn cart_total(lines: &[CartLine]) -> f64 {
    lines
        .iter()
        .map(|l| l.product.price.unwrap_or(0.0) * f64::from(l.quantity))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: Option<f64>, quantity: i32) -> CartLine {
        CartLine {
            id: Uuid::new_v4(),
            quantity,
            product: Product {
                id: Uuid::new_v4(),
                title: "Tomaten".to_string(),
                price,
                quality: None,
                category: None,
            },
        }
    }

    #[test]
    fn test_total_ignores_missing_prices() {
        let lines = vec![line(Some(1.5), 2), line(None, 5), line(Some(0.25), 4)];
        assert!((cart_total(&lines) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_total_of_empty_cart() {
        assert_eq!(cart_total(&[]), 0.0);
    }
}
