//! Structured-document form of an order.
//!
//! These are the records written to the JSON order file: one `OrderDocument`
//! per order, with field names fixed by the file format rather than by Rust
//! naming. Conversion back into an [`Order`] re-validates every field.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use ordercap_core::{DomainError, DomainResult, LineNumber, OrderNumber};

use crate::line_item::LineItem;
use crate::order::Order;

/// Unset order/line/quantity on the wire.
const UNSET: i64 = -1;

/// One order in the document file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDocument {
    pub order_number: u32,
    pub date_time: DateTime<Local>,
    pub customer_name: String,
    pub customer_phone: String,
    /// Absent in files written before the subtotal was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_before_tax: Option<f64>,
    pub tax_amount: f64,
    pub total_amount: f64,
    #[serde(default)]
    pub order_details: Vec<LineItemDocument>,
}

/// One line of an order in the document file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDocument {
    #[serde(rename = "stockID")]
    pub stock_id: String,
    pub stock_name: String,
    pub stock_price: f64,
    pub order_number: i64,
    pub detail_number: i64,
    pub quantity: i64,
}

impl From<&LineItem> for LineItemDocument {
    fn from(item: &LineItem) -> Self {
        Self {
            stock_id: item.stock_id().to_string(),
            stock_name: item.stock_name().to_string(),
            stock_price: item.unit_price(),
            order_number: item.order_number().map_or(UNSET, i64::from),
            detail_number: item.line_number().map_or(UNSET, i64::from),
            quantity: item.quantity().map_or(UNSET, i64::from),
        }
    }
}

impl From<&Order> for OrderDocument {
    fn from(order: &Order) -> Self {
        Self {
            order_number: order.order_number().get(),
            date_time: order.timestamp(),
            customer_name: order.customer_name().to_string(),
            customer_phone: order.customer_phone().to_string(),
            amount_before_tax: Some(order.subtotal()),
            tax_amount: order.tax_amount(),
            total_amount: order.total_amount(),
            order_details: order.line_items().iter().map(LineItemDocument::from).collect(),
        }
    }
}

fn optional_field<T>(raw: i64, field: &str) -> DomainResult<Option<T>>
where
    T: TryFrom<i64, Error = DomainError>,
{
    if raw == UNSET {
        return Ok(None);
    }
    T::try_from(raw)
        .map(Some)
        .map_err(|e| DomainError::invalid_argument(format!("{field}: {e}")))
}

impl TryFrom<LineItemDocument> for LineItem {
    type Error = DomainError;

    fn try_from(doc: LineItemDocument) -> Result<Self, Self::Error> {
        let order_number = optional_field::<OrderNumber>(doc.order_number, "orderNumber")?;
        let line_number = optional_field::<LineNumber>(doc.detail_number, "detailNumber")?;
        let quantity = if doc.quantity == UNSET {
            None
        } else {
            let quantity = u32::try_from(doc.quantity).map_err(|_| {
                DomainError::invalid_argument(format!("quantity: {} is out of range", doc.quantity))
            })?;
            Some(quantity)
        };

        LineItem::restore(
            doc.stock_id,
            doc.stock_name,
            doc.stock_price,
            order_number,
            line_number,
            quantity,
        )
    }
}

impl TryFrom<OrderDocument> for Order {
    type Error = DomainError;

    fn try_from(doc: OrderDocument) -> Result<Self, Self::Error> {
        let order_number = OrderNumber::new(doc.order_number)?;
        let line_items = doc
            .order_details
            .into_iter()
            .map(LineItem::try_from)
            .collect::<DomainResult<Vec<_>>>()?;
        let subtotal = doc
            .amount_before_tax
            .unwrap_or(doc.total_amount - doc.tax_amount);

        Order::from_parts(
            order_number,
            doc.date_time,
            doc.customer_name,
            doc.customer_phone,
            subtotal,
            doc.tax_amount,
            doc.total_amount,
            line_items,
        )
    }
}
