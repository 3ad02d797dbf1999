use serde::{Deserialize, Serialize};

/// Unit a product's volumes are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeUnit {
    Gram,
    Kilogram,
    Millilitre,
    Litre,
    Piece,
    Bunch,
    Dozen,
}

impl VolumeUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            VolumeUnit::Gram => "gm",
            VolumeUnit::Kilogram => "kg",
            VolumeUnit::Millilitre => "ml",
            VolumeUnit::Litre => "ltr",
            VolumeUnit::Piece => "pc",
            VolumeUnit::Bunch => "bunch",
            VolumeUnit::Dozen => "dozen",
        }
    }
}

/// A catalog entry. `price` is the cost of one `minimum_volume`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: u32,
    #[serde(default)]
    pub image_url: String,
    pub volume_unit: VolumeUnit,
    pub minimum_volume: u32,
    pub maximum_volume: u32,
    pub volume_step: u32,
}

/// A cart line or, once accepted by a seller, an order line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PurchasedItem {
    #[serde(default)]
    pub order_id: Option<String>,
    pub user_id: String,
    pub product_id: String,
    pub volume: u32,
    pub total_price: u64,
    #[serde(default)]
    pub accepted: bool,
    #[serde(default)]
    pub completed: bool,
    /// Epoch milliseconds; zero until the order is submitted.
    #[serde(default)]
    pub date_requested: i64,
    #[serde(default)]
    pub date_accepted: i64,
}

impl PurchasedItem {
    pub fn new(user_id: impl Into<String>, product_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            product_id: product_id.into(),
            ..Self::default()
        }
    }
}

/// Profile of a registered user, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub instance_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub created_at: i64,
}

/// Envelope the backend answers write requests with.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackendResult {
    pub result: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Line count and price sum of the accepted lines of one order date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderSubtotal {
    pub count: usize,
    pub subtotal: u64,
}
