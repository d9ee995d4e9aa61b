//! Stock level alert for the fertilizer inventory.
//!
//! Sums the `quantity` of every inventory record of one type, skipping records
//! whose status is "out of stock" or "expired" (case-insensitive). A total of
//! zero raises a warning, anything else a success notification.

use field_gate::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

pub const RESOURCE: &str = "fertilizers";

const UNAVAILABLE: &[&str] = &["out of stock", "expired"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub item: String,
    pub total: f64,
    /// Unit of the first counted record, if any.
    pub unit: Option<String>,
}

impl StockLevel {
    pub fn from_records(item: &str, records: &[Record]) -> Self {
        let counted: Vec<&Record> = records
            .iter()
            .filter(|r| r.get("fertilizertype").and_then(Value::as_str) == Some(item))
            .filter(|r| {
                let status = r
                    .get("status")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_lowercase();
                !UNAVAILABLE.contains(&status.trim())
            })
            .collect();
        let total: f64 = counted
            .iter()
            .filter_map(|r| r.get("quantity").and_then(quantity))
            .sum();
        let unit = counted
            .first()
            .and_then(|r| r.get("unit"))
            .and_then(Value::as_str)
            .map(str::to_string);
        debug!(item, counted = counted.len(), total, "stock level computed");
        Self {
            item: item.to_string(),
            total,
            unit,
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.total <= 0.0
    }

    pub fn notification(&self) -> Notification {
        let unit = self.unit.as_deref().unwrap_or("units");
        if self.is_depleted() {
            Notification::warning(
                "Low Stock Alert",
                format!(
                    "Stock level for {} is low (0 {unit} remaining). Please restock soon.",
                    self.item
                ),
            )
        } else {
            Notification::success(
                "Stock Level",
                format!(
                    "Total quantity for {} is {} {unit}.",
                    self.item,
                    format_quantity(self.total)
                ),
            )
        }
    }
}

/// Quantities are stored as numbers, sometimes as numeric strings.
fn quantity(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn format_quantity(total: f64) -> String {
    if total.fract() == 0.0 {
        format!("{}", total as i64)
    } else {
        format!("{total:.2}")
    }
}

/// Fetch the inventory, compute the level of `item` and notify about it.
pub async fn check_stock<A, N>(adapter: &A, notifier: &N, item: &str) -> Result<StockLevel, PersistenceError>
where
    A: PersistenceAdapter,
    N: Notifier,
{
    let records = adapter.list(RESOURCE).await?;
    let level = StockLevel::from_records(item, &records);
    notifier.notify(level.notification());
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn records(values: Value) -> Vec<Record> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn unavailable_records_are_skipped() {
        let records = records(json!([
            {"fertilizertype": "Urea", "quantity": 40, "unit": "Kg", "status": "In Stock"},
            {"fertilizertype": "Urea", "quantity": 15, "unit": "Kg", "status": "EXPIRED"},
            {"fertilizertype": "Urea", "quantity": 5, "unit": "Kg", "status": "Out of stock"},
            {"fertilizertype": "Compost", "quantity": 9, "unit": "Kg", "status": "In Stock"},
        ]));
        let level = StockLevel::from_records("Urea", &records);
        assert_eq!(level.total, 40.0);
        assert_eq!(
            level.notification(),
            Notification::success("Stock Level", "Total quantity for Urea is 40 Kg.")
        );
    }

    #[test]
    fn zero_total_warns() {
        let records = records(json!([
            {"fertilizertype": "Compost", "quantity": 3, "unit": "Kg", "status": "Expired"},
        ]));
        let level = StockLevel::from_records("Compost", &records);
        assert!(level.is_depleted());
        assert_eq!(level.unit, None);
        let note = level.notification();
        assert_eq!(note.severity, Severity::Warning);
        assert_eq!(note.title, "Low Stock Alert");
        assert_eq!(
            note.message,
            "Stock level for Compost is low (0 units remaining). Please restock soon."
        );
    }

    #[tokio::test]
    async fn check_stock_reads_the_inventory() {
        let store = MemoryStore::new();
        store.seed(
            RESOURCE,
            json!({"fertilizertype": "Urea", "quantity": "2.5", "unit": "MetricTon", "status": "In Stock"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let log = NotificationLog::new();
        let level = check_stock(&store, &log, "Urea").await.unwrap();
        assert_eq!(level.total, 2.5);
        assert_eq!(
            log.last().map(|n| n.message),
            Some("Total quantity for Urea is 2.50 MetricTon.".to_string())
        );
    }
}
