//! Cart Store: the only writer of cart records.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{AddOutcome, Cart, CartError, Category, Product, Quantity, Review};
use crate::services::locks::KeyedLocks;
use crate::storage::{CartRepository, CategoryRepository, ProductRepository, ReviewRepository, Store};
use crate::{Result, TechMarketError};

/// Cart line joined with the product it points at.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
    pub product: Option<Product>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProductDetails {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
    pub reviews: Vec<Review>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FullCart {
    #[serde(flatten)]
    pub cart: Cart,
    pub products: Vec<ProductDetails>,
}

#[derive(Clone)]
pub struct CartStore {
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
    categories: Arc<dyn CategoryRepository>,
    reviews: Arc<dyn ReviewRepository>,
    locks: KeyedLocks,
}

impl CartStore {
    pub fn new(store: &Store) -> Self {
        Self {
            carts: store.carts.clone(),
            products: store.products.clone(),
            categories: store.categories.clone(),
            reviews: store.reviews.clone(),
            locks: KeyedLocks::new(),
        }
    }

    /// Adds `quantity` of a product to the user's cart, opening the cart on first use.
    #[instrument(skip(self))]
    pub async fn add_item(&self, user_id: Uuid, product_id: Uuid, quantity: Quantity) -> Result<(Cart, AddOutcome)> {
        if self.products.find_by_id(product_id).await?.is_none() {
            return Err(TechMarketError::not_found("Product not found"));
        }

        let _guard = self.locks.lock(user_id).await;
        let (cart, outcome) = match self.carts.find_by_user(user_id).await? {
            Some(mut cart) => {
                let outcome = cart.add_item(product_id, quantity)?;
                (cart, outcome)
            }
            None => (Cart::open(user_id, product_id, quantity), AddOutcome::Created),
        };
        self.carts.save(&cart).await?;

        info!(cart_id = %cart.id(), ?outcome, quantity = ?cart.quantity_of(product_id), "cart item added");
        Ok((cart, outcome))
    }

    /// Overwrites the quantity of a product that is already in the cart.
    #[instrument(skip(self))]
    pub async fn set_item_quantity(&self, cart_id: Uuid, product_id: Uuid, quantity: Quantity) -> Result<Cart> {
        self.mutate(cart_id, move |cart| cart.set_quantity(product_id, quantity)).await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, cart_id: Uuid, product_id: Uuid) -> Result<Cart> {
        self.mutate(cart_id, move |cart| cart.remove_item(product_id)).await
    }

    /// Deletes a whole cart. Deleting an absent cart succeeds.
    #[instrument(skip(self))]
    pub async fn delete_cart(&self, cart_id: Uuid) -> Result<()> {
        let Some(cart) = self.carts.find_by_id(cart_id).await? else {
            debug!("cart already absent");
            return Ok(());
        };
        let _guard = self.locks.lock(cart.user_id()).await;
        self.carts.delete(cart_id).await?;

        info!(user_id = %cart.user_id(), "cart deleted");
        Ok(())
    }

    /// Line items of the user's cart joined with their products.
    pub async fn get_cart(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
        let cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .filter(|c| !c.is_empty())
            .ok_or_else(|| TechMarketError::not_found("Cart is empty for this user"))?;

        let products = self.products.find_many(cart.product_ids()).await?;
        Ok(cart
            .lines()
            .map(|(product_id, quantity)| CartLine {
                product_id,
                quantity,
                product: products.iter().find(|p| p.id == product_id).cloned(),
            })
            .collect())
    }

    /// The cart record plus every product in it with category and reviews.
    pub async fn get_full_cart(&self, user_id: Uuid) -> Result<FullCart> {
        let cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| TechMarketError::not_found("Cart not found for this user"))?;

        let mut found = self.products.find_many(cart.product_ids()).await?;
        let mut products = Vec::with_capacity(found.len());
        for id in cart.product_ids() {
            let Some(pos) = found.iter().position(|p| p.id == *id) else { continue };
            let product = found.swap_remove(pos);
            let category = match product.category_id {
                Some(category_id) => self.categories.find_by_id(category_id).await?,
                None => None,
            };
            let reviews = self.reviews.find_by_product(product.id).await?;
            products.push(ProductDetails { product, category, reviews });
        }

        Ok(FullCart { cart, products })
    }

    async fn load(&self, cart_id: Uuid) -> Result<Cart> {
        self.carts
            .find_by_id(cart_id)
            .await?
            .ok_or_else(|| TechMarketError::not_found("Cart not found"))
    }

    async fn mutate<F>(&self, cart_id: Uuid, change: F) -> Result<Cart>
    where
        F: FnOnce(&mut Cart) -> std::result::Result<(), CartError> + Send,
    {
        let owner = self.load(cart_id).await?.user_id();
        let _guard = self.locks.lock(owner).await;

        // Re-read under the lock; the cart may have changed or vanished meanwhile.
        let mut cart = self.load(cart_id).await?;
        change(&mut cart)?;
        self.carts.save(&cart).await?;

        info!(%cart_id, items = cart.product_ids().len(), "cart updated");
        Ok(cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewProduct, NewReview, Rating};
    use rust_decimal::Decimal;
    use serde_json::Map;

    async fn seeded() -> (Store, CartStore, Vec<Uuid>) {
        let store = Store::memory();
        let mut ids = Vec::new();
        for (i, name) in ["Keyboard", "Monitor", "Headset"].iter().enumerate() {
            let p = Product::create(NewProduct { name: (*name).into(), price: Decimal::new(100 * (i as i64 + 1), 0), category_id: None, attributes: Map::new() });
            store.products.insert(&p).await.unwrap();
            ids.push(p.id);
        }
        let carts = CartStore::new(&store);
        (store, carts, ids)
    }

    fn qty(n: i64) -> Quantity { Quantity::new(n).unwrap() }

    #[tokio::test]
    async fn test_add_walks_through_all_three_outcomes() {
        let (_, carts, p) = seeded().await;
        let user = Uuid::now_v7();

        let (_, first) = carts.add_item(user, p[0], qty(2)).await.unwrap();
        let (_, second) = carts.add_item(user, p[1], qty(1)).await.unwrap();
        let (cart, third) = carts.add_item(user, p[0], qty(3)).await.unwrap();

        assert_eq!((first, second, third), (AddOutcome::Created, AddOutcome::ProductAdded, AddOutcome::QuantityUpdated));
        assert_eq!(cart.product_ids(), &[p[0], p[1]]);
        assert_eq!(cart.quantity_of(p[0]), Some(5));
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_not_found() {
        let (store, carts, _) = seeded().await;
        let user = Uuid::now_v7();
        let err = carts.add_item(user, Uuid::now_v7(), qty(1)).await.unwrap_err();
        assert!(matches!(err, TechMarketError::NotFound(_)));
        assert!(store.carts.find_by_user(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_not_lost() {
        let (_, carts, p) = seeded().await;
        let user = Uuid::now_v7();
        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let carts = carts.clone();
                let product = p[2];
                tokio::spawn(async move { carts.add_item(user, product, qty(1)).await })
            })
            .collect();
        for t in tasks { t.await.unwrap().unwrap(); }

        let lines = carts.get_cart(user).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 20);
    }

    #[tokio::test]
    async fn test_set_quantity_overwrites_and_checks_membership() {
        let (store, carts, p) = seeded().await;
        let (cart, _) = carts.add_item(Uuid::now_v7(), p[0], qty(4)).await.unwrap();

        let updated = carts.set_item_quantity(cart.id(), p[0], qty(1)).await.unwrap();
        assert_eq!(updated.quantity_of(p[0]), Some(1));

        let err = carts.set_item_quantity(cart.id(), p[1], qty(2)).await.unwrap_err();
        assert_eq!(err.to_string(), "Product not found in the cart");
        let err = carts.set_item_quantity(Uuid::now_v7(), p[0], qty(2)).await.unwrap_err();
        assert_eq!(err.to_string(), "Cart not found");

        let stored = store.carts.find_by_id(cart.id()).await.unwrap().unwrap();
        assert_eq!(stored.quantities().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_absent_product_is_not_a_silent_success() {
        let (store, carts, p) = seeded().await;
        let (cart, _) = carts.add_item(Uuid::now_v7(), p[0], qty(1)).await.unwrap();

        let err = carts.remove_item(cart.id(), p[1]).await.unwrap_err();
        assert!(matches!(err, TechMarketError::NotFound(ref m) if m == "Product not found in the cart"));

        let cart = carts.remove_item(cart.id(), p[0]).await.unwrap();
        assert!(cart.is_empty());
        assert!(store.carts.find_by_id(cart.id()).await.unwrap().unwrap().quantities().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_reads_as_not_found_but_full_cart_exists() {
        let (_, carts, p) = seeded().await;
        let user = Uuid::now_v7();
        let (cart, _) = carts.add_item(user, p[0], qty(1)).await.unwrap();
        carts.remove_item(cart.id(), p[0]).await.unwrap();

        assert!(matches!(carts.get_cart(user).await, Err(TechMarketError::NotFound(_))));
        let full = carts.get_full_cart(user).await.unwrap();
        assert!(full.products.is_empty());
    }

    #[tokio::test]
    async fn test_full_cart_joins_reviews_in_cart_order() {
        let (store, carts, p) = seeded().await;
        let user = Uuid::now_v7();
        carts.add_item(user, p[1], qty(1)).await.unwrap();
        carts.add_item(user, p[0], qty(2)).await.unwrap();
        let review = Review::create(NewReview {
            product_id: p[0], user_id: user, rating: Rating::new(5).unwrap(),
            title: "Great".into(), content: "Great keyboard overall".into(),
            pros: vec![], cons: vec![], verified_purchase: true,
        });
        store.reviews.insert(&review).await.unwrap();

        let full = carts.get_full_cart(user).await.unwrap();
        let order: Vec<Uuid> = full.products.iter().map(|d| d.product.id).collect();
        assert_eq!(order, vec![p[1], p[0]]);
        assert_eq!(full.products[1].reviews.len(), 1);
        assert!(full.products[0].reviews.is_empty());
    }

    #[tokio::test]
    async fn test_delete_cart_is_idempotent() {
        let (store, carts, p) = seeded().await;
        let (cart, _) = carts.add_item(Uuid::now_v7(), p[0], qty(1)).await.unwrap();
        carts.delete_cart(cart.id()).await.unwrap();
        carts.delete_cart(cart.id()).await.unwrap();
        assert!(store.carts.find_by_id(cart.id()).await.unwrap().is_none());
    }
}
