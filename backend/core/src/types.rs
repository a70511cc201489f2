use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bill (one scanned or manually entered receipt).
///
/// Identified by an opaque token rather than a user account; whoever holds
/// the token can edit the bill. There is no versioning or audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub token: String,
    pub title: Option<String>,
    pub place: Option<String>,
    /// Date as printed on the receipt, not parsed.
    pub date: Option<String>,
    pub subtotal: f64,
    pub sales_tax: f64,
    pub tip: f64,
    pub total: f64,
    pub items: Vec<BillItem>,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// New empty bill with a fresh opaque token.
    pub fn new() -> Self {
        Self {
            token: Uuid::new_v4().simple().to_string(),
            title: None,
            place: None,
            date: None,
            subtotal: 0.0,
            sales_tax: 0.0,
            tip: 0.0,
            total: 0.0,
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

impl Default for Bill {
    fn default() -> Self {
        Self::new()
    }
}

/// A single line item on a bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillItem {
    pub id: Uuid,
    pub label: String,
    /// Total price for the line (all quantities).
    pub price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Emoji or icon URL shown next to the item, if one was resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl BillItem {
    pub fn new(label: impl Into<String>, price: f64, quantity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            price,
            quantity: quantity.max(1),
            icon: None,
        }
    }

    /// Price of a single unit of this line.
    pub fn unit_price(&self) -> f64 {
        self.price / self.quantity.max(1) as f64
    }
}

/// A participant in the split. Not an authenticated identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// A fractional claim by one person on one item's cost.
///
/// Weights are relative: an item shared 1/1 between two people splits evenly,
/// 2/1 splits two-thirds / one-third.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemShare {
    pub item_id: Uuid,
    pub person_id: Uuid,
    pub weight: f64,
}

/// Partial update to a bill. Every field optional; `None` means "leave as is".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillUpdate {
    pub title: Option<String>,
    pub place: Option<String>,
    pub date: Option<String>,
    pub subtotal: Option<f64>,
    pub sales_tax: Option<f64>,
    pub tip: Option<f64>,
}

impl BillUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.place.is_none()
            && self.date.is_none()
            && self.subtotal.is_none()
            && self.sales_tax.is_none()
            && self.tip.is_none()
    }

    /// Whether this update changes any monetary field (forces a `total` recompute).
    pub fn touches_money(&self) -> bool {
        self.subtotal.is_some() || self.sales_tax.is_some() || self.tip.is_some()
    }
}

/// Normalized output of the receipt OCR pipeline.
///
/// Every field is optional-defaulted: the model is asked for strict JSON but
/// is not trusted to produce it, so absent fields become `None`/empty/zero
/// rather than parse failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScannedReceipt {
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub items: Vec<ScannedItem>,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub tip: f64,
    #[serde(default)]
    pub total: f64,
}

/// One line item as extracted by the vision model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedItem {
    pub label: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl ScannedReceipt {
    /// Convert a scan into a stored bill with a fresh token.
    pub fn into_bill(self) -> Bill {
        let mut bill = Bill::new();
        bill.place = self.place;
        bill.date = self.date;
        bill.subtotal = self.subtotal;
        bill.sales_tax = self.tax;
        bill.tip = self.tip;
        bill.total = self.total;
        bill.items = self
            .items
            .into_iter()
            .map(|i| BillItem::new(i.label, i.price, i.quantity))
            .collect();
        bill
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_price_divides_by_quantity() {
        let item = BillItem::new("Dumplings", 12.0, 4);
        assert!((item.unit_price() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_quantity_is_clamped() {
        let item = BillItem::new("Tea", 3.0, 0);
        assert_eq!(item.quantity, 1);
        assert!((item.unit_price() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(BillUpdate::default().is_empty());
        let update = BillUpdate {
            tip: Some(5.0),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert!(update.touches_money());
    }

    #[test]
    fn scan_converts_to_bill() {
        let scan = ScannedReceipt {
            place: Some("Cafe".into()),
            date: None,
            items: vec![ScannedItem {
                label: "Tea".into(),
                price: 3.0,
                quantity: 1,
            }],
            subtotal: 3.0,
            tax: 0.0,
            tip: 0.0,
            total: 3.0,
        };
        let bill = scan.into_bill();
        assert_eq!(bill.place.as_deref(), Some("Cafe"));
        assert_eq!(bill.items.len(), 1);
        assert!(!bill.token.is_empty());
    }
}
