//! Local cart and order-history storage.
//!
//! A cart line is an unaccepted [`PurchasedItem`]; accepted lines are the
//! order history synced from the backend. The table does not enforce one
//! cart line per product, callers are expected to check [`CartStore::is_in_cart`]
//! before adding.

use crate::domain::{
    OrderSubtotal, Product, PurchasedItem, StoreError, StoreResult, calculate_price,
};
use crate::infrastructure::{ItemUpdate, ProductStore, PurchasedItemTable, Selection, UserStore};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Cart lines and order history of the signed-in user.
pub struct CartStore {
    table: PurchasedItemTable,
    products: Rc<ProductStore>,
    users: Rc<RefCell<UserStore>>,
}

impl CartStore {
    pub fn new(
        table: PurchasedItemTable,
        products: Rc<ProductStore>,
        users: Rc<RefCell<UserStore>>,
    ) -> Self {
        Self { table, products, users }
    }

    /// Adds `volume` of a product to the signed-in user's cart and returns
    /// the new row id.
    ///
    /// The total price is scaled from the catalog price. A product missing
    /// from the catalog is still added, priced at zero.
    pub fn add_to_cart(&mut self, product_id: &str, volume: u32) -> StoreResult<i64> {
        let user_id = self
            .users
            .borrow()
            .signed_user()
            .map(|user| user.email.clone())
            .ok_or(StoreError::NotSignedIn)?;

        let mut item = PurchasedItem::new(user_id, product_id);
        item.volume = volume;
        match self.products.get_product(product_id) {
            Some(product) => {
                item.total_price = calculate_price(product.price, product.minimum_volume, volume);
            }
            None => warn!(product_id, "adding product missing from catalog"),
        }

        let id = self.table.insert(item)?;
        debug!(product_id, volume, row = id, "added to cart");
        Ok(id)
    }

    /// Returns the number of cart lines deleted; 0 means it was not in the cart.
    pub fn remove_from_cart(&mut self, product_id: &str) -> StoreResult<usize> {
        self.table
            .delete(&Selection::new().product_id(product_id).accepted(false))
    }

    pub fn is_in_cart(&self, product_id: &str) -> bool {
        self.table
            .exists(&Selection::new().product_id(product_id).accepted(false))
    }

    /// Sets the volume of a cart line and reprices it.
    ///
    /// Bounds are the caller's concern; no clamping happens here.
    pub fn update_volume(&mut self, product_id: &str, new_volume: u32) -> StoreResult<usize> {
        let mut changes = ItemUpdate {
            volume: Some(new_volume),
            total_price: None,
        };
        if let Some(product) = self.products.get_product(product_id) {
            changes.total_price = Some(calculate_price(
                product.price,
                product.minimum_volume,
                new_volume,
            ));
        }
        self.table.update(
            &Selection::new().product_id(product_id).accepted(false),
            &changes,
        )
    }

    pub fn list_cart_items(&self, accepted: bool, as_of_date: Option<i64>) -> Vec<PurchasedItem> {
        let mut selection = Selection::new().accepted(accepted);
        if let Some(date) = as_of_date {
            selection = selection.date_requested(date);
        }
        self.table.query(&selection)
    }

    /// The line for `product_id`. The date only narrows accepted lines.
    pub fn cart_item(
        &self,
        product_id: &str,
        accepted: bool,
        date_requested: Option<i64>,
    ) -> Option<PurchasedItem> {
        let mut selection = Selection::new().product_id(product_id).accepted(accepted);
        if let (true, Some(date)) = (accepted, date_requested) {
            selection = selection.date_requested(date);
        }
        self.table.query(&selection).into_iter().last()
    }

    pub fn product_ids_in_cart(&self, accepted: bool, date_requested: Option<i64>) -> Vec<String> {
        self.list_cart_items(accepted, date_requested)
            .into_iter()
            .map(|item| item.product_id)
            .collect()
    }

    pub fn products_in_cart(&self, accepted: bool, date_requested: Option<i64>) -> Vec<Product> {
        let ids = self.product_ids_in_cart(accepted, date_requested);
        self.products.get_products(ids.as_slice())
    }

    pub fn cart_subtotal(&self) -> u64 {
        self.list_cart_items(false, None)
            .iter()
            .map(|item| item.total_price)
            .sum()
    }

    pub fn order_subtotal(&self, date: i64) -> OrderSubtotal {
        let items = self.list_cart_items(true, Some(date));
        OrderSubtotal {
            count: items.len(),
            subtotal: items.iter().map(|item| item.total_price).sum(),
        }
    }

    /// Replaces every accepted line with `items`.
    ///
    /// Delete then insert, without a transaction: a failure part way through
    /// leaves the history partially written.
    pub fn store_order_history(&mut self, items: &[PurchasedItem]) -> StoreResult<()> {
        let removed = self.table.delete(&Selection::new().accepted(true))?;
        for item in items {
            self.table.insert(item.clone())?;
        }
        info!(removed, stored = items.len(), "replaced order history");
        Ok(())
    }

    pub fn clear_cart_items(&mut self) -> StoreResult<usize> {
        self.table.delete(&Selection::new().accepted(false))
    }

    pub fn remove_cart_item(&mut self, order_id: &str) -> StoreResult<usize> {
        self.table
            .delete(&Selection::new().order_id(order_id).accepted(false))
    }

    /// Accepted lines of `user_id`, summed per request date.
    pub fn order_history_by_date(&self, user_id: &str) -> BTreeMap<i64, u64> {
        let items = self
            .table
            .query(&Selection::new().accepted(true).user_id(user_id));

        let mut totals = BTreeMap::new();
        for item in items {
            *totals.entry(item.date_requested).or_insert(0) += item.total_price;
        }
        totals
    }
}
