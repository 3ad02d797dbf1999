//! The purchased-item table: a small relational row store kept in one JSON file.
//!
//! Rows are addressed through a [`Selection`], which ANDs column predicates
//! the way a SQL `WHERE` clause would. Every mutating call rewrites the file
//! when at least one row changed.

use super::persistence::FileRepository;
use crate::domain::{PurchasedItem, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Row {
    id: i64,
    #[serde(flatten)]
    item: PurchasedItem,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TableData {
    next_id: i64,
    rows: Vec<Row>,
}

/// Column predicates combined with AND. An empty selection matches every row.
///
/// # Examples
///
/// ```
/// use grocer::infrastructure::Selection;
///
/// let cart_line = Selection::new().product_id("tomato").accepted(false);
/// let history = Selection::new().accepted(true).date_requested(1_700_000_000_000);
/// # let _ = (cart_line, history);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    order_id: Option<String>,
    product_id: Option<String>,
    user_id: Option<String>,
    accepted: Option<bool>,
    date_requested: Option<i64>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn product_id(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn accepted(mut self, accepted: bool) -> Self {
        self.accepted = Some(accepted);
        self
    }

    pub fn date_requested(mut self, date: i64) -> Self {
        self.date_requested = Some(date);
        self
    }

    pub fn matches(&self, item: &PurchasedItem) -> bool {
        self.order_id
            .as_ref()
            .is_none_or(|id| item.order_id.as_ref() == Some(id))
            && self.product_id.as_ref().is_none_or(|id| &item.product_id == id)
            && self.user_id.as_ref().is_none_or(|id| &item.user_id == id)
            && self.accepted.is_none_or(|a| item.accepted == a)
            && self.date_requested.is_none_or(|d| item.date_requested == d)
    }
}

/// Column values to write in an update. Unset columns are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemUpdate {
    pub volume: Option<u32>,
    pub total_price: Option<u64>,
}

impl ItemUpdate {
    fn apply(&self, item: &mut PurchasedItem) {
        if let Some(volume) = self.volume {
            item.volume = volume;
        }
        if let Some(total_price) = self.total_price {
            item.total_price = total_price;
        }
    }
}

/// Purchased-item rows, optionally backed by a JSON file.
#[derive(Debug)]
pub struct PurchasedItemTable {
    path: Option<PathBuf>,
    data: TableData,
}

impl PurchasedItemTable {
    /// A table that lives only as long as the value.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: TableData::default(),
        }
    }

    /// Opens the table stored at `path`, starting empty if the file is absent.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let data = FileRepository::load::<TableData>(path)?.unwrap_or_default();
        debug!(path = %path.display(), rows = data.rows.len(), "opened purchased item table");
        Ok(Self {
            path: Some(path.to_path_buf()),
            data,
        })
    }

    /// Inserts a row and returns its row id.
    pub fn insert(&mut self, item: PurchasedItem) -> StoreResult<i64> {
        self.data.next_id += 1;
        let id = self.data.next_id;
        self.data.rows.push(Row { id, item });
        self.flush()?;
        Ok(id)
    }

    pub fn query(&self, selection: &Selection) -> Vec<PurchasedItem> {
        self.data
            .rows
            .iter()
            .filter(|row| selection.matches(&row.item))
            .map(|row| row.item.clone())
            .collect()
    }

    pub fn exists(&self, selection: &Selection) -> bool {
        self.data.rows.iter().any(|row| selection.matches(&row.item))
    }

    pub fn update(&mut self, selection: &Selection, changes: &ItemUpdate) -> StoreResult<usize> {
        let mut affected = 0;
        for row in self.data.rows.iter_mut().filter(|row| selection.matches(&row.item)) {
            changes.apply(&mut row.item);
            affected += 1;
        }
        if affected > 0 {
            self.flush()?;
        }
        Ok(affected)
    }

    pub fn delete(&mut self, selection: &Selection) -> StoreResult<usize> {
        let before = self.data.rows.len();
        self.data.rows.retain(|row| !selection.matches(&row.item));
        let affected = before - self.data.rows.len();
        if affected > 0 {
            self.flush()?;
        }
        Ok(affected)
    }

    pub fn len(&self) -> usize {
        self.data.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.rows.is_empty()
    }

    fn flush(&self) -> StoreResult<()> {
        match &self.path {
            Some(path) => FileRepository::save(&self.data, path),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn item(product: &str, accepted: bool, date: i64) -> PurchasedItem {
        PurchasedItem {
            accepted,
            date_requested: date,
            volume: 1,
            total_price: 10,
            ..PurchasedItem::new("a@b.c", product)
        }
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let mut table = PurchasedItemTable::in_memory();
        assert_eq!(table.insert(item("a", false, 0)).unwrap(), 1);
        assert_eq!(table.insert(item("b", false, 0)).unwrap(), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_selection_ands_predicates() {
        let mut table = PurchasedItemTable::in_memory();
        table.insert(item("a", false, 0)).unwrap();
        table.insert(item("a", true, 5)).unwrap();
        table.insert(item("b", true, 5)).unwrap();

        assert_eq!(table.query(&Selection::new()).len(), 3);
        assert_eq!(table.query(&Selection::new().product_id("a")).len(), 2);
        assert_eq!(table.query(&Selection::new().product_id("a").accepted(true)).len(), 1);
        assert_eq!(table.query(&Selection::new().accepted(true).date_requested(5)).len(), 2);
        assert_eq!(table.query(&Selection::new().accepted(true).date_requested(6)).len(), 0);
        assert!(!table.exists(&Selection::new().user_id("someone@else")));
    }

    #[test]
    fn test_order_id_predicate_skips_rows_without_id() {
        let mut table = PurchasedItemTable::in_memory();
        table.insert(item("a", false, 0)).unwrap();
        table
            .insert(PurchasedItem { order_id: Some("o-1".to_string()), ..item("b", false, 0) })
            .unwrap();

        let found = table.query(&Selection::new().order_id("o-1"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].product_id, "b");
    }

    #[test]
    fn test_update_only_touches_set_columns() {
        let mut table = PurchasedItemTable::in_memory();
        table.insert(item("a", false, 0)).unwrap();

        let changes = ItemUpdate { volume: Some(4), total_price: None };
        assert_eq!(table.update(&Selection::new().product_id("a"), &changes).unwrap(), 1);
        let row = &table.query(&Selection::new())[0];
        assert_eq!(row.volume, 4);
        assert_eq!(row.total_price, 10);

        assert_eq!(table.update(&Selection::new().product_id("z"), &changes).unwrap(), 0);
    }

    #[test]
    fn test_delete_returns_rows_affected() {
        let mut table = PurchasedItemTable::in_memory();
        table.insert(item("a", false, 0)).unwrap();
        table.insert(item("b", true, 1)).unwrap();

        assert_eq!(table.delete(&Selection::new().accepted(true)).unwrap(), 1);
        assert_eq!(table.delete(&Selection::new().accepted(true)).unwrap(), 0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_rows_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("purchased_items.json");

        {
            let mut table = PurchasedItemTable::open(&path).unwrap();
            assert!(table.is_empty());
            table.insert(item("a", false, 0)).unwrap();
            table.insert(item("b", false, 0)).unwrap();
            table.delete(&Selection::new().product_id("a")).unwrap();
        }

        let mut table = PurchasedItemTable::open(&path).unwrap();
        let rows = table.query(&Selection::new());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_id, "b");
        assert_eq!(table.insert(item("c", false, 0)).unwrap(), 3);
    }
}
