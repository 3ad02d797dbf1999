use tracing::info;

pub const EVENT_CART_ITEM_ADDED: &str = "cart_item_added";
pub const EVENT_CART_ITEM_REMOVED: &str = "cart_item_removed";

/// Payload attached to cart events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsEvent {
    pub item_name: String,
    pub item_price: u32,
    pub item_volume: u32,
}

/// Fire-and-forget event sink.
pub trait Analytics {
    fn log_event(&self, name: &str, event: &AnalyticsEvent);
}

/// Records events in the application log under the `analytics` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

impl Analytics for TracingAnalytics {
    fn log_event(&self, name: &str, event: &AnalyticsEvent) {
        info!(
            target: "analytics",
            event = name,
            item_name = %event.item_name,
            item_price = event.item_price,
            item_volume = event.item_volume,
        );
    }
}
