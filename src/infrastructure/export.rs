use super::stores::ProductStore;
use crate::domain::{PurchasedItem, format_volume};
use chrono::DateTime;

/// Writes accepted order lines as CSV: date, product, volume, total price.
pub struct OrderHistoryExporter;

impl OrderHistoryExporter {
    /// Returns the number of lines written.
    pub fn export_to_csv(
        items: &[PurchasedItem],
        products: &ProductStore,
        filename: &str,
    ) -> Result<usize, csv::Error> {
        let mut writer = csv::Writer::from_path(filename)?;
        writer.write_record(["date", "product", "volume", "total_price"])?;

        for item in items {
            let (name, volume) = match products.get_product(&item.product_id) {
                Some(product) => (product.name.clone(), format_volume(item.volume, product.volume_unit)),
                None => (item.product_id.clone(), item.volume.to_string()),
            };
            writer.write_record([
                format_date(item.date_requested),
                name,
                volume,
                item.total_price.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(items.len())
    }
}

/// `YYYY-MM-DD` for an epoch-millisecond timestamp.
pub fn format_date(epoch_millis: i64) -> String {
    DateTime::from_timestamp_millis(epoch_millis)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| epoch_millis.to_string())
}
