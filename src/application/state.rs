//! Application state management for the grocery client.
//!
//! `App` owns the stores and presenters, tracks which screen is shown and
//! runs the order requests that go to the backend.

use super::background::{BackgroundCall, CallLost};
use super::cart::CartStore;
use super::product_list::{ListMode, ProductListPresenter, ProductRow};
use super::signup::{SignUpPresenter, SignUpView};
use crate::domain::{BackendOutcome, BackendResult, Product, PurchasedItem, StoreResult, User};
use crate::infrastructure::{
    Analytics, Backend, Config, OrderHistoryExporter, ProductStore, UserStore,
};
use chrono::Utc;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{info, warn};

/// Screen currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Registration form, shown while nobody is signed in.
    SignUp,
    /// Full product catalog with cart checkboxes.
    Browse,
    /// Cart lines with volume controls.
    Cart,
    /// Past orders, one line per request date.
    History,
    /// Lines of the order requested at the given date.
    Order(i64),
}

/// How key presses are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Navigation and shortcuts
    Normal,
    /// Typing into the sign-up form
    Editing,
    /// Help screen is displayed
    Help,
    /// CSV export dialog is open
    ExportCsv,
}

pub const SIGN_UP_FIELDS: [&str; 4] = ["Email", "Name", "Mobile", "Address"];

/// Field values typed into the sign-up form, in `SIGN_UP_FIELDS` order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SignUpForm {
    pub values: [String; 4],
    pub focused: usize,
}

impl SignUpForm {
    pub fn focused_value(&mut self) -> &mut String {
        &mut self.values[self.focused]
    }

    pub fn next_field(&mut self) {
        self.focused = (self.focused + 1) % SIGN_UP_FIELDS.len();
    }

    pub fn previous_field(&mut self) {
        self.focused = (self.focused + SIGN_UP_FIELDS.len() - 1) % SIGN_UP_FIELDS.len();
    }

    fn to_user(&self, instance_id: &str) -> User {
        let [email, name, mobile, address] = &self.values;
        User {
            email: email.trim().to_string(),
            instance_id: instance_id.to_string(),
            name: name.trim().to_string(),
            mobile_number: mobile.trim().to_string(),
            address: address.trim().to_string(),
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

/// Sign-up progress as the UI shows it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SignUpStatus {
    pub in_progress: bool,
    pub succeeded: bool,
    pub message: Option<String>,
}

impl SignUpView for SignUpStatus {
    fn on_sign_up_success(&mut self) {
        self.succeeded = true;
        self.message = Some("Signed up".to_string());
    }

    fn on_sign_up_error(&mut self, message: &str) {
        self.message = Some(message.to_string());
    }

    fn show_progress(&mut self, visible: bool) {
        self.in_progress = visible;
    }
}

enum OrderRequest {
    Submit {
        stamped: Vec<PurchasedItem>,
        call: BackgroundCall<BackendOutcome<BackendResult>>,
    },
    Refresh {
        call: BackgroundCall<BackendOutcome<Vec<PurchasedItem>>>,
    },
}

/// Top-level application state: stores, presenters and what the UI shows.
pub struct App {
    pub config: Config,
    pub screen: Screen,
    pub mode: AppMode,
    pub products: Rc<ProductStore>,
    pub users: Rc<RefCell<UserStore>>,
    pub cart: CartStore,
    pub list: ProductListPresenter,
    pub sign_up: SignUpPresenter,
    pub sign_up_form: SignUpForm,
    pub sign_up_status: SignUpStatus,
    /// Highlighted row of the current list
    pub selected: usize,
    /// Order dates with their totals, newest first
    pub history: Vec<(i64, u64)>,
    pub status_message: Option<String>,
    pub filename_input: String,
    pub cursor_position: usize,
    pub help_scroll: usize,
    backend: Arc<dyn Backend>,
    analytics: Rc<dyn Analytics>,
    order_request: Option<OrderRequest>,
}

impl App {
    pub fn new(
        config: Config,
        products: Rc<ProductStore>,
        users: Rc<RefCell<UserStore>>,
        cart: CartStore,
        backend: Arc<dyn Backend>,
        analytics: Rc<dyn Analytics>,
    ) -> Self {
        let sign_up = SignUpPresenter::new(Arc::clone(&backend), Rc::clone(&users));
        let list = ProductListPresenter::new(ListMode::Browse, Rc::clone(&analytics));
        let mut app = Self {
            config,
            screen: Screen::SignUp,
            mode: AppMode::Editing,
            products,
            users,
            cart,
            list,
            sign_up,
            sign_up_form: SignUpForm::default(),
            sign_up_status: SignUpStatus::default(),
            selected: 0,
            history: Vec::new(),
            status_message: None,
            filename_input: String::new(),
            cursor_position: 0,
            help_scroll: 0,
            backend,
            analytics,
            order_request: None,
        };

        if app.signed_user().is_some() {
            app.show_browse();
            if let Some(instance_id) = app.config.instance_id.clone() {
                let unchanged = app
                    .signed_user()
                    .is_some_and(|user| user.instance_id == instance_id);
                if !unchanged {
                    app.sign_up.update_instance_id(&instance_id, &mut app.sign_up_status);
                }
            }
        }
        app
    }

    pub fn signed_user(&self) -> Option<User> {
        self.users.borrow().signed_user().cloned()
    }

    pub fn is_busy(&self) -> bool {
        self.sign_up.is_pending() || self.order_request.is_some()
    }

    /// Delivers finished background calls. Called once per UI tick.
    pub fn tick(&mut self) {
        if self.sign_up.poll(&mut self.sign_up_status) {
            self.after_sign_up();
        }
        self.poll_order_request();
    }

    pub fn submit_sign_up(&mut self) {
        if self.sign_up_form.values[0].trim().is_empty() {
            self.sign_up_status.message = Some("Email is required".to_string());
            return;
        }
        let instance_id = self.config.instance_id.clone().unwrap_or_default();
        let user = self.sign_up_form.to_user(&instance_id);
        self.sign_up_status = SignUpStatus::default();
        self.sign_up.sign_up(user, &mut self.sign_up_status);
    }

    fn after_sign_up(&mut self) {
        if self.sign_up_status.succeeded && self.screen == Screen::SignUp {
            self.sign_up_form = SignUpForm::default();
            self.show_browse();
        }
        self.status_message = self.sign_up_status.message.take();
    }

    pub fn sign_out(&mut self) {
        self.sign_up.cancel();
        if let Err(e) = self.users.borrow_mut().sign_out() {
            warn!(error = %e, "sign out failed");
        }
        self.sign_up_status = SignUpStatus::default();
        self.screen = Screen::SignUp;
        self.mode = AppMode::Editing;
    }

    pub fn show_browse(&mut self) {
        self.open_list(Screen::Browse, ListMode::Browse, self.products.all().to_vec());
    }

    pub fn show_cart(&mut self) {
        let products = self.cart.products_in_cart(false, None);
        self.open_list(Screen::Cart, ListMode::Cart, products);
    }

    pub fn show_history(&mut self) {
        self.reload_history();
        self.screen = Screen::History;
        self.mode = AppMode::Normal;
        self.selected = 0;
    }

    pub fn show_order(&mut self, date_requested: i64) {
        let products = self.cart.products_in_cart(true, Some(date_requested));
        self.open_list(Screen::Order(date_requested), ListMode::History { date_requested }, products);
    }

    fn open_list(&mut self, screen: Screen, mode: ListMode, products: Vec<Product>) {
        self.list = ProductListPresenter::new(mode, Rc::clone(&self.analytics));
        self.list.set_products(products);
        self.screen = screen;
        self.mode = AppMode::Normal;
        self.selected = 0;
    }

    fn reload_history(&mut self) {
        self.history = match self.signed_user() {
            Some(user) => self
                .cart
                .order_history_by_date(&user.email)
                .into_iter()
                .rev()
                .collect(),
            None => Vec::new(),
        };
    }

    pub fn visible_len(&self) -> usize {
        match self.screen {
            Screen::SignUp => SIGN_UP_FIELDS.len(),
            Screen::History => self.history.len(),
            Screen::Browse | Screen::Cart | Screen::Order(_) => self.list.item_count(),
        }
    }

    pub fn rows(&self) -> Vec<ProductRow> {
        (0..self.list.item_count())
            .filter_map(|position| self.list.bind_row(position, &self.cart))
            .collect()
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.visible_len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn open_selected_order(&mut self) {
        if let Some(&(date, _)) = self.history.get(self.selected) {
            self.show_order(date);
        }
    }

    pub fn toggle_selected(&mut self) {
        let result = self.list.toggle_cart(self.selected, &mut self.cart);
        self.report_store_result(result);
    }

    pub fn increase_selected(&mut self) {
        let result = self.list.increase_volume(self.selected, &mut self.cart);
        self.report_store_result(result);
    }

    pub fn decrease_selected(&mut self) {
        let result = self.list.decrease_volume(self.selected, &mut self.cart);
        self.report_store_result(result);
    }

    pub fn remove_selected(&mut self) {
        let result = self.list.remove_product(self.selected, &mut self.cart);
        self.report_store_result(result);
        if self.selected >= self.list.item_count() {
            self.select_previous();
        }
    }

    fn report_store_result(&mut self, result: StoreResult<bool>) {
        if let Err(e) = result {
            warn!(error = %e, "cart update failed");
            self.status_message = Some(format!("Cart update failed: {e}"));
        }
    }

    /// Sends every cart line to the backend as one order.
    pub fn submit_order(&mut self) {
        if self.order_request.is_some() {
            return;
        }
        let now = Utc::now().timestamp_millis();
        let stamped: Vec<PurchasedItem> = self
            .cart
            .list_cart_items(false, None)
            .into_iter()
            .map(|item| PurchasedItem { date_requested: now, ..item })
            .collect();
        if stamped.is_empty() {
            self.status_message = Some("Cart is empty".to_string());
            return;
        }

        info!(lines = stamped.len(), "placing order");
        let backend = Arc::clone(&self.backend);
        let payload = stamped.clone();
        let call = BackgroundCall::spawn(move || backend.submit_order(&payload));
        self.order_request = Some(OrderRequest::Submit { stamped, call });
        self.status_message = Some("Placing order...".to_string());
    }

    /// Replaces the local order history with the backend's copy.
    pub fn refresh_history(&mut self) {
        if self.order_request.is_some() {
            return;
        }
        let Some(user) = self.signed_user() else {
            return;
        };
        let backend = Arc::clone(&self.backend);
        let call = BackgroundCall::spawn(move || backend.order_history(&user.email));
        self.order_request = Some(OrderRequest::Refresh { call });
        self.status_message = Some("Refreshing orders...".to_string());
    }

    fn poll_order_request(&mut self) {
        let Some(request) = self.order_request.take() else {
            return;
        };
        match request {
            OrderRequest::Submit { stamped, call } => match call.try_take() {
                Ok(Some(outcome)) => self.finish_submit(&stamped, outcome),
                Ok(None) => self.order_request = Some(OrderRequest::Submit { stamped, call }),
                Err(lost) => self.order_request_lost(lost),
            },
            OrderRequest::Refresh { call } => match call.try_take() {
                Ok(Some(outcome)) => self.finish_refresh(outcome),
                Ok(None) => self.order_request = Some(OrderRequest::Refresh { call }),
                Err(lost) => self.order_request_lost(lost),
            },
        }
    }

    /// Blocks until the pending order request is delivered.
    pub fn wait_for_orders(&mut self) {
        match self.order_request.take() {
            Some(OrderRequest::Submit { stamped, call }) => match call.wait() {
                Ok(outcome) => self.finish_submit(&stamped, outcome),
                Err(lost) => self.order_request_lost(lost),
            },
            Some(OrderRequest::Refresh { call }) => match call.wait() {
                Ok(outcome) => self.finish_refresh(outcome),
                Err(lost) => self.order_request_lost(lost),
            },
            None => {}
        }
    }

    fn order_request_lost(&mut self, lost: CallLost) {
        warn!(error = %lost, "order request lost");
        self.status_message = Some(format!("Connection error: {lost}"));
    }

    fn finish_submit(&mut self, stamped: &[PurchasedItem], outcome: BackendOutcome<BackendResult>) {
        self.status_message = Some(match outcome {
            Ok(response) if response.result => match self.cart.clear_cart_items() {
                Ok(_) => {
                    info!(lines = stamped.len(), "order placed");
                    if self.screen == Screen::Cart {
                        self.show_cart();
                    }
                    "Order placed".to_string()
                }
                Err(e) => format!("Order placed but cart not cleared: {e}"),
            },
            Ok(_) => "Order rejected by server".to_string(),
            Err(e) if e.is_rejection() => format!("Order rejected by server: {e}"),
            Err(e) => format!("Connection error: {e}"),
        });
    }

    fn finish_refresh(&mut self, outcome: BackendOutcome<Vec<PurchasedItem>>) {
        self.status_message = Some(match outcome {
            Ok(items) => {
                let accepted: Vec<PurchasedItem> =
                    items.into_iter().filter(|item| item.accepted).collect();
                match self.cart.store_order_history(&accepted) {
                    Ok(()) => {
                        self.reload_history();
                        format!("{} order lines synced", accepted.len())
                    }
                    Err(e) => format!("Failed to store orders: {e}"),
                }
            }
            Err(e) if e.is_rejection() => format!("Order history unavailable: {e}"),
            Err(e) => format!("Connection error: {e}"),
        });
    }

    pub fn start_csv_export(&mut self) {
        self.mode = AppMode::ExportCsv;
        self.filename_input = "orders.csv".to_string();
        self.cursor_position = self.filename_input.chars().count();
        self.status_message = None;
    }

    pub fn cancel_filename_input(&mut self) {
        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    pub fn get_csv_export_filename(&self) -> String {
        if self.filename_input.is_empty() {
            "orders.csv".to_string()
        } else {
            self.filename_input.clone()
        }
    }

    pub fn export_history(&mut self) {
        let filename = self.get_csv_export_filename();
        let items = self.cart.list_cart_items(true, None);
        self.status_message = Some(
            match OrderHistoryExporter::export_to_csv(&items, &self.products, &filename) {
                Ok(count) => format!("Exported {count} lines to {filename}"),
                Err(e) => format!("Export failed: {e}"),
            },
        );
        self.cancel_filename_input();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BackendError, Product, VolumeUnit};
    use crate::infrastructure::{PurchasedItemTable, TracingAnalytics};
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct FakeBackend {
        accept: bool,
        history: Vec<PurchasedItem>,
        orders: Mutex<Vec<Vec<PurchasedItem>>>,
    }

    impl Backend for FakeBackend {
        fn sign_up_user(&self, _user: &User) -> BackendOutcome<BackendResult> {
            Ok(BackendResult { result: self.accept, message: None })
        }

        fn submit_order(&self, items: &[PurchasedItem]) -> BackendOutcome<BackendResult> {
            self.orders.lock().unwrap().push(items.to_vec());
            Ok(BackendResult { result: self.accept, message: None })
        }

        fn order_history(&self, _user_id: &str) -> BackendOutcome<Vec<PurchasedItem>> {
            if self.accept {
                Ok(self.history.clone())
            } else {
                Err(BackendError::Status(503))
            }
        }
    }

    struct CrashingBackend;

    impl Backend for CrashingBackend {
        fn sign_up_user(&self, _user: &User) -> BackendOutcome<BackendResult> {
            panic!("backend crashed")
        }

        fn submit_order(&self, _items: &[PurchasedItem]) -> BackendOutcome<BackendResult> {
            panic!("backend crashed")
        }

        fn order_history(&self, _user_id: &str) -> BackendOutcome<Vec<PurchasedItem>> {
            panic!("backend crashed")
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            Product {
                id: "apple".to_string(),
                name: "Apple".to_string(),
                price: 100,
                image_url: String::new(),
                volume_unit: VolumeUnit::Piece,
                minimum_volume: 1,
                maximum_volume: 6,
                volume_step: 1,
            },
            Product {
                id: "onion".to_string(),
                name: "Onion".to_string(),
                price: 30,
                image_url: String::new(),
                volume_unit: VolumeUnit::Gram,
                minimum_volume: 500,
                maximum_volume: 3000,
                volume_step: 500,
            },
        ]
    }

    fn app_with(backend: FakeBackend, signed_in: bool) -> (App, Arc<FakeBackend>) {
        let products = Rc::new(ProductStore::from_products(catalog()));
        let mut store = UserStore::in_memory();
        if signed_in {
            store
                .store_user_info(&User { email: "a@b.c".to_string(), ..User::default() })
                .unwrap();
        }
        let users = Rc::new(RefCell::new(store));
        let cart = CartStore::new(PurchasedItemTable::in_memory(), Rc::clone(&products), Rc::clone(&users));
        let backend = Arc::new(backend);
        let app = App::new(
            Config::default(),
            products,
            users,
            cart,
            backend.clone(),
            Rc::new(TracingAnalytics),
        );
        (app, backend)
    }

    fn accepted(product_id: &str, date: i64, total: u64) -> PurchasedItem {
        PurchasedItem {
            accepted: true,
            date_requested: date,
            total_price: total,
            volume: 1,
            ..PurchasedItem::new("a@b.c", product_id)
        }
    }

    #[test]
    fn test_starts_on_sign_up_when_signed_out() {
        let (app, _) = app_with(FakeBackend::default(), false);
        assert_eq!(app.screen, Screen::SignUp);
        assert_eq!(app.mode, AppMode::Editing);
    }

    #[test]
    fn test_sign_up_moves_to_browse() {
        let (mut app, _) = app_with(FakeBackend { accept: true, ..FakeBackend::default() }, false);
        app.sign_up_form.values[0] = " new@user.io ".to_string();
        app.submit_sign_up();
        assert!(app.sign_up_status.in_progress);

        app.sign_up.wait(&mut app.sign_up_status);
        app.after_sign_up();

        assert_eq!(app.screen, Screen::Browse);
        assert_eq!(app.signed_user().unwrap().email, "new@user.io");
        assert_eq!(app.status_message.as_deref(), Some("Signed up"));
    }

    #[test]
    fn test_sign_up_requires_email() {
        let (mut app, _) = app_with(FakeBackend::default(), false);
        app.submit_sign_up();
        assert!(!app.sign_up.is_pending());
        assert_eq!(app.sign_up_status.message.as_deref(), Some("Email is required"));
    }

    #[test]
    fn test_browse_toggle_and_cart_screen() {
        let (mut app, _) = app_with(FakeBackend::default(), true);
        assert_eq!(app.screen, Screen::Browse);
        assert_eq!(app.rows().len(), 2);

        app.select_next();
        app.toggle_selected();
        assert!(app.cart.is_in_cart("onion"));

        app.show_cart();
        let rows = app.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price_label, "₹ 30");

        app.increase_selected();
        assert_eq!(app.cart.cart_subtotal(), 60);
        app.decrease_selected();
        app.decrease_selected();
        assert_eq!(app.cart.cart_subtotal(), 30);

        app.remove_selected();
        assert_eq!(app.list.item_count(), 0);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_submit_order_clears_cart_on_success() {
        let (mut app, backend) = app_with(FakeBackend { accept: true, ..FakeBackend::default() }, true);
        app.toggle_selected();
        app.show_cart();

        app.submit_order();
        assert!(app.is_busy());
        app.wait_for_orders();

        assert!(!app.is_busy());
        assert_eq!(app.cart.cart_subtotal(), 0);
        assert_eq!(app.list.item_count(), 0);
        assert_eq!(app.status_message.as_deref(), Some("Order placed"));
        let orders = backend.orders.lock().unwrap();
        assert_eq!(orders.len(), 1);
        assert!(orders[0][0].date_requested > 0);
    }

    #[test]
    fn test_rejected_order_keeps_cart() {
        let (mut app, _) = app_with(FakeBackend::default(), true);
        app.toggle_selected();
        app.submit_order();
        app.wait_for_orders();

        assert!(app.cart.is_in_cart("apple"));
        assert_eq!(app.status_message.as_deref(), Some("Order rejected by server"));
    }

    #[test]
    fn test_empty_cart_is_not_submitted() {
        let (mut app, backend) = app_with(FakeBackend { accept: true, ..FakeBackend::default() }, true);
        app.submit_order();
        assert!(!app.is_busy());
        assert!(backend.orders.lock().unwrap().is_empty());
    }

    #[test]
    fn test_refresh_history_stores_accepted_lines() {
        let history = vec![
            accepted("apple", 10, 100),
            accepted("onion", 10, 30),
            accepted("apple", 20, 200),
            PurchasedItem::new("a@b.c", "onion"),
        ];
        let (mut app, _) = app_with(FakeBackend { accept: true, history, ..FakeBackend::default() }, true);
        app.show_history();
        assert!(app.history.is_empty());

        app.refresh_history();
        app.wait_for_orders();

        assert_eq!(app.history, vec![(20, 200), (10, 130)]);
        assert_eq!(app.status_message.as_deref(), Some("3 order lines synced"));

        app.select_next();
        app.open_selected_order();
        assert_eq!(app.screen, Screen::Order(10));
        let labels: Vec<String> = app.rows().into_iter().map(|row| row.price_label).collect();
        assert_eq!(labels, vec!["1 pc is ₹ 100", "1 gm is ₹ 30"]);
    }

    #[test]
    fn test_refresh_failure_keeps_history() {
        let (mut app, _) = app_with(FakeBackend::default(), true);
        app.cart.store_order_history(&[accepted("apple", 10, 100)]).unwrap();
        app.refresh_history();
        app.wait_for_orders();

        assert_eq!(app.cart.list_cart_items(true, None).len(), 1);
        assert_eq!(app.status_message.as_deref(), Some("Order history unavailable: server answered 503"));
    }

    #[test]
    fn test_crashed_order_request_frees_the_slot() {
        let products = Rc::new(ProductStore::from_products(catalog()));
        let mut store = UserStore::in_memory();
        store
            .store_user_info(&User { email: "a@b.c".to_string(), ..User::default() })
            .unwrap();
        let users = Rc::new(RefCell::new(store));
        let cart = CartStore::new(PurchasedItemTable::in_memory(), Rc::clone(&products), Rc::clone(&users));
        let mut app = App::new(
            Config::default(),
            products,
            users,
            cart,
            Arc::new(CrashingBackend),
            Rc::new(TracingAnalytics),
        );
        app.toggle_selected();

        app.submit_order();
        for _ in 0..200 {
            app.tick();
            if !app.is_busy() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        assert!(!app.is_busy());
        assert!(app.cart.is_in_cart("apple"));
        assert_eq!(
            app.status_message.as_deref(),
            Some("Connection error: background call ended without a result")
        );

        app.refresh_history();
        assert!(app.is_busy());
        app.wait_for_orders();
        assert!(!app.is_busy());
    }

    #[test]
    fn test_export_history_writes_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let (mut app, _) = app_with(FakeBackend::default(), true);
        app.cart.store_order_history(&[accepted("apple", 10, 100)]).unwrap();

        app.start_csv_export();
        assert_eq!(app.mode, AppMode::ExportCsv);
        app.filename_input = path.to_string_lossy().to_string();
        app.export_history();

        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.status_message.as_deref().unwrap().starts_with("Exported 1 lines"));
        assert!(path.exists());
    }

    #[test]
    fn test_sign_out_returns_to_form() {
        let (mut app, _) = app_with(FakeBackend::default(), true);
        app.sign_out();
        assert_eq!(app.screen, Screen::SignUp);
        assert!(app.signed_user().is_none());
    }
}
