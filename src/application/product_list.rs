//! View model for product lists: browsing the catalog, editing the cart and
//! reviewing a past order.
//!
//! Every row is bound straight from the [`CartStore`], one lookup per row.
//! Lists are short enough that nothing is cached.

use super::cart::CartStore;
use crate::domain::{Product, StoreResult, format_volume, step_down, step_up};
use crate::infrastructure::{
    Analytics, AnalyticsEvent, EVENT_CART_ITEM_ADDED, EVENT_CART_ITEM_REMOVED,
};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Catalog with a cart checkbox per product.
    Browse,
    /// Cart lines with volume controls.
    Cart,
    /// Read-only lines of the order requested at `date_requested`.
    History { date_requested: i64 },
}

/// Everything needed to draw one product row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub product_id: String,
    pub name: String,
    pub image_url: String,
    pub price_label: String,
    pub volume_label: Option<String>,
    /// `Some(checked)` when the row shows a cart checkbox.
    pub checkbox: Option<bool>,
    pub volume_controls: bool,
}

/// Binds a list of products to rows in one [`ListMode`].
pub struct ProductListPresenter {
    mode: ListMode,
    products: Vec<Product>,
    analytics: Rc<dyn Analytics>,
}

impl ProductListPresenter {
    pub fn new(mode: ListMode, analytics: Rc<dyn Analytics>) -> Self {
        Self {
            mode,
            products: Vec::new(),
            analytics,
        }
    }

    pub fn mode(&self) -> ListMode {
        self.mode
    }

    pub fn set_products(&mut self, products: Vec<Product>) {
        self.products = products;
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn item_count(&self) -> usize {
        self.products.len()
    }

    pub fn cart_item_count(&self, cart: &CartStore) -> usize {
        cart.product_ids_in_cart(false, None).len()
    }

    pub fn bind_row(&self, position: usize, cart: &CartStore) -> Option<ProductRow> {
        let product = self.products.get(position)?;
        let mut row = ProductRow {
            product_id: product.id.clone(),
            name: product.name.clone(),
            image_url: product.image_url.clone(),
            price_label: String::new(),
            volume_label: None,
            checkbox: None,
            volume_controls: false,
        };

        match self.mode {
            ListMode::Browse => {
                row.price_label = format!(
                    "{} is ₹ {}",
                    format_volume(product.minimum_volume, product.volume_unit),
                    product.price
                );
                row.checkbox = Some(cart.is_in_cart(&product.id));
            }
            ListMode::Cart => {
                let item = cart.cart_item(&product.id, false, None).unwrap_or_default();
                row.volume_label = Some(format_volume(item.volume, product.volume_unit));
                row.price_label = format!("₹ {}", item.total_price);
                row.volume_controls = true;
            }
            ListMode::History { date_requested } => {
                let item = cart
                    .cart_item(&product.id, true, Some(date_requested))
                    .unwrap_or_default();
                row.price_label = format!(
                    "{} is ₹ {}",
                    format_volume(item.volume, product.volume_unit),
                    item.total_price
                );
            }
        }
        Some(row)
    }

    /// Adds the product at `position` to the cart, or takes it out if it is
    /// already there. Returns whether it is now in the cart.
    ///
    /// Only browsing rows carry a checkbox; other modes report the current
    /// state without changing anything.
    pub fn toggle_cart(&self, position: usize, cart: &mut CartStore) -> StoreResult<bool> {
        let Some(product) = self.products.get(position) else {
            return Ok(false);
        };
        if self.mode != ListMode::Browse {
            return Ok(cart.is_in_cart(&product.id));
        }

        let event = AnalyticsEvent {
            item_name: product.name.clone(),
            item_price: product.price,
            item_volume: product.minimum_volume,
        };

        if cart.is_in_cart(&product.id) {
            cart.remove_from_cart(&product.id)?;
            self.analytics.log_event(EVENT_CART_ITEM_REMOVED, &event);
            Ok(false)
        } else {
            cart.add_to_cart(&product.id, product.minimum_volume)?;
            self.analytics.log_event(EVENT_CART_ITEM_ADDED, &event);
            Ok(true)
        }
    }

    /// Steps the cart volume up. Returns `false` when it would pass the maximum.
    pub fn increase_volume(&self, position: usize, cart: &mut CartStore) -> StoreResult<bool> {
        self.step_volume(position, cart, |volume, product| {
            step_up(volume, product.volume_step, product.maximum_volume)
        })
    }

    /// Steps the cart volume down. Returns `false` when it would pass the minimum.
    pub fn decrease_volume(&self, position: usize, cart: &mut CartStore) -> StoreResult<bool> {
        self.step_volume(position, cart, |volume, product| {
            step_down(volume, product.volume_step, product.minimum_volume)
        })
    }

    fn step_volume<F>(&self, position: usize, cart: &mut CartStore, next: F) -> StoreResult<bool>
    where
        F: Fn(u32, &Product) -> Option<u32>,
    {
        if self.mode != ListMode::Cart {
            return Ok(false);
        }
        let Some(product) = self.products.get(position) else {
            return Ok(false);
        };
        let Some(item) = cart.cart_item(&product.id, false, None) else {
            return Ok(false);
        };
        match next(item.volume, product) {
            Some(volume) => Ok(cart.update_volume(&product.id, volume)? > 0),
            None => Ok(false),
        }
    }

    /// Removes the product from the cart and, if a line was deleted, from
    /// this list.
    pub fn remove_product(&mut self, position: usize, cart: &mut CartStore) -> StoreResult<bool> {
        let Some(product) = self.products.get(position) else {
            return Ok(false);
        };
        if cart.remove_from_cart(&product.id)? == 0 {
            return Ok(false);
        }
        self.products.remove(position);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PurchasedItem, User, VolumeUnit};
    use crate::infrastructure::{ProductStore, PurchasedItemTable, UserStore};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingAnalytics {
        events: RefCell<Vec<(String, AnalyticsEvent)>>,
    }

    impl Analytics for RecordingAnalytics {
        fn log_event(&self, name: &str, event: &AnalyticsEvent) {
            self.events.borrow_mut().push((name.to_string(), event.clone()));
        }
    }

    fn tomato() -> Product {
        Product {
            id: "tomato".to_string(),
            name: "Tomato".to_string(),
            price: 40,
            image_url: "https://img.example/tomato.png".to_string(),
            volume_unit: VolumeUnit::Gram,
            minimum_volume: 500,
            maximum_volume: 1500,
            volume_step: 250,
        }
    }

    fn spinach() -> Product {
        Product {
            id: "spinach".to_string(),
            name: "Spinach".to_string(),
            price: 15,
            image_url: String::new(),
            volume_unit: VolumeUnit::Bunch,
            minimum_volume: 1,
            maximum_volume: 5,
            volume_step: 1,
        }
    }

    fn cart() -> CartStore {
        let mut users = UserStore::in_memory();
        users
            .store_user_info(&User { email: "a@b.c".to_string(), ..User::default() })
            .unwrap();
        CartStore::new(
            PurchasedItemTable::in_memory(),
            Rc::new(ProductStore::from_products(vec![tomato(), spinach()])),
            Rc::new(RefCell::new(users)),
        )
    }

    fn presenter(mode: ListMode) -> (ProductListPresenter, Rc<RecordingAnalytics>) {
        let analytics = Rc::new(RecordingAnalytics::default());
        let mut presenter = ProductListPresenter::new(mode, analytics.clone());
        presenter.set_products(vec![tomato(), spinach()]);
        (presenter, analytics)
    }

    #[test]
    fn test_browse_row_shows_checkbox_and_unit_price() {
        let mut cart = cart();
        let (list, _) = presenter(ListMode::Browse);
        cart.add_to_cart("spinach", 1).unwrap();

        let row = list.bind_row(0, &cart).unwrap();
        assert_eq!(row.price_label, "500 gm is ₹ 40");
        assert_eq!(row.checkbox, Some(false));
        assert!(!row.volume_controls);

        let row = list.bind_row(1, &cart).unwrap();
        assert_eq!(row.checkbox, Some(true));
        assert!(list.bind_row(2, &cart).is_none());
    }

    #[test]
    fn test_toggle_adds_then_removes_with_analytics() {
        let mut cart = cart();
        let (list, analytics) = presenter(ListMode::Browse);

        assert!(list.toggle_cart(0, &mut cart).unwrap());
        let item = cart.cart_item("tomato", false, None).unwrap();
        assert_eq!(item.volume, 500);
        assert_eq!(item.total_price, 40);
        assert_eq!(list.cart_item_count(&cart), 1);

        assert!(!list.toggle_cart(0, &mut cart).unwrap());
        assert!(!cart.is_in_cart("tomato"));

        let events = analytics.events.borrow();
        let names: Vec<&str> = events.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec![EVENT_CART_ITEM_ADDED, EVENT_CART_ITEM_REMOVED]);
        assert_eq!(events[1].1.item_name, "Tomato");
        assert_eq!(events[1].1.item_volume, 500);
    }

    #[test]
    fn test_toggle_outside_browse_changes_nothing() {
        let mut cart = cart();
        let (list, analytics) = presenter(ListMode::Cart);
        assert!(!list.toggle_cart(0, &mut cart).unwrap());
        assert!(!cart.is_in_cart("tomato"));
        assert!(analytics.events.borrow().is_empty());
    }

    #[test]
    fn test_cart_row_shows_line_volume_and_total() {
        let mut cart = cart();
        cart.add_to_cart("tomato", 1000).unwrap();
        let (list, _) = presenter(ListMode::Cart);

        let row = list.bind_row(0, &cart).unwrap();
        assert_eq!(row.volume_label.as_deref(), Some("1 kg"));
        assert_eq!(row.price_label, "₹ 80");
        assert!(row.volume_controls);
        assert_eq!(row.checkbox, None);
    }

    #[test]
    fn test_volume_steps_stay_within_bounds() {
        let mut cart = cart();
        cart.add_to_cart("tomato", 500).unwrap();
        let (list, _) = presenter(ListMode::Cart);

        assert!(!list.decrease_volume(0, &mut cart).unwrap());
        assert_eq!(cart.cart_item("tomato", false, None).unwrap().volume, 500);

        assert!(list.increase_volume(0, &mut cart).unwrap());
        assert!(list.increase_volume(0, &mut cart).unwrap());
        assert!(list.increase_volume(0, &mut cart).unwrap());
        assert!(list.increase_volume(0, &mut cart).unwrap());
        assert!(!list.increase_volume(0, &mut cart).unwrap());

        let item = cart.cart_item("tomato", false, None).unwrap();
        assert_eq!(item.volume, 1500);
        assert_eq!(item.total_price, 120);

        assert!(list.decrease_volume(0, &mut cart).unwrap());
        assert_eq!(cart.cart_item("tomato", false, None).unwrap().volume, 1250);
    }

    #[test]
    fn test_volume_step_without_cart_line() {
        let mut cart = cart();
        let (list, _) = presenter(ListMode::Cart);
        assert!(!list.increase_volume(1, &mut cart).unwrap());
        assert!(!list.increase_volume(7, &mut cart).unwrap());
    }

    #[test]
    fn test_history_row_uses_accepted_line_of_date() {
        let mut cart = cart();
        cart.store_order_history(&[
            PurchasedItem {
                volume: 750,
                total_price: 60,
                accepted: true,
                date_requested: 42,
                ..PurchasedItem::new("a@b.c", "tomato")
            },
            PurchasedItem {
                volume: 1000,
                total_price: 80,
                accepted: true,
                date_requested: 99,
                ..PurchasedItem::new("a@b.c", "tomato")
            },
        ])
        .unwrap();
        let (list, _) = presenter(ListMode::History { date_requested: 42 });

        let row = list.bind_row(0, &cart).unwrap();
        assert_eq!(row.price_label, "750 gm is ₹ 60");
        assert_eq!(row.checkbox, None);
        assert!(!row.volume_controls);
    }

    #[test]
    fn test_remove_product_only_when_in_cart() {
        let mut cart = cart();
        cart.add_to_cart("spinach", 2).unwrap();
        let (mut list, _) = presenter(ListMode::Cart);

        assert!(!list.remove_product(0, &mut cart).unwrap());
        assert_eq!(list.item_count(), 2);

        assert!(list.remove_product(1, &mut cart).unwrap());
        assert_eq!(list.item_count(), 1);
        assert_eq!(list.products()[0].id, "tomato");
        assert!(!cart.is_in_cart("spinach"));
    }
}
