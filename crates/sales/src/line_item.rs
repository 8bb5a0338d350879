use ordercap_core::{DomainError, DomainResult, LineNumber, OrderNumber, ValueObject};

/// Stock-ID prefix of the category that carries a tariff.
pub const TARIFF_CATEGORY: &str = "ELECT";

/// Price multiplier applied to tariffed items (5% surcharge).
pub const TARIFF_MULTIPLIER: f64 = 1.05;

/// A priced catalog line.
///
/// Built standalone from catalog data; it only gets an order number, a line
/// number and a quantity when `Order::add_line_item` stamps a copy of it.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    stock_id: String,
    stock_name: String,
    unit_price: f64,
    order_number: Option<OrderNumber>,
    line_number: Option<LineNumber>,
    quantity: Option<u32>,
}

impl ValueObject for LineItem {}

impl LineItem {
    pub fn new(
        stock_id: impl Into<String>,
        stock_name: impl Into<String>,
        unit_price: f64,
    ) -> DomainResult<Self> {
        let stock_id = stock_id.into();
        let stock_name = stock_name.into();

        if stock_id.is_empty() {
            return Err(DomainError::invalid_argument("stock_id must not be empty"));
        }
        if stock_name.is_empty() {
            return Err(DomainError::invalid_argument("stock_name must not be empty"));
        }
        validate_price(unit_price)?;

        Ok(Self {
            stock_id,
            stock_name,
            unit_price,
            order_number: None,
            line_number: None,
            quantity: None,
        })
    }

    /// Rebuild an item from persisted fields, re-checking every invariant.
    pub(crate) fn restore(
        stock_id: String,
        stock_name: String,
        unit_price: f64,
        order_number: Option<OrderNumber>,
        line_number: Option<LineNumber>,
        quantity: Option<u32>,
    ) -> DomainResult<Self> {
        let mut item = Self::new(stock_id, stock_name, unit_price)?;
        if quantity == Some(0) {
            return Err(DomainError::invalid_argument("quantity must be positive"));
        }
        item.order_number = order_number;
        item.line_number = line_number;
        item.quantity = quantity;
        Ok(item)
    }

    /// Copy of this item stamped as line `line_number` of order `order_number`.
    pub(crate) fn attached(
        &self,
        order_number: OrderNumber,
        line_number: u32,
        quantity: u32,
    ) -> DomainResult<Self> {
        let line_number = LineNumber::new(line_number)?;
        if quantity == 0 {
            return Err(DomainError::invalid_argument("quantity must be positive"));
        }

        Ok(Self {
            order_number: Some(order_number),
            line_number: Some(line_number),
            quantity: Some(quantity),
            ..self.clone()
        })
    }

    pub(crate) fn restamp(&mut self, order_number: OrderNumber) {
        if self.order_number.is_some() {
            self.order_number = Some(order_number);
        }
    }

    pub fn stock_id(&self) -> &str {
        &self.stock_id
    }

    pub fn stock_name(&self) -> &str {
        &self.stock_name
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    pub fn order_number(&self) -> Option<OrderNumber> {
        self.order_number
    }

    pub fn line_number(&self) -> Option<LineNumber> {
        self.line_number
    }

    pub fn quantity(&self) -> Option<u32> {
        self.quantity
    }

    pub fn is_attached(&self) -> bool {
        self.order_number.is_some() && self.line_number.is_some()
    }

    /// Price override. Totals of the owning order are recomputed on the next
    /// `compute_totals`.
    pub fn set_unit_price(&mut self, unit_price: f64) -> DomainResult<()> {
        validate_price(unit_price)?;
        self.unit_price = unit_price;
        Ok(())
    }

    /// Whether the stock ID falls in the tariffed category.
    ///
    /// Compares the first five characters case-insensitively; shorter IDs never match.
    pub fn is_tariffed(&self) -> bool {
        self.stock_id
            .get(..TARIFF_CATEGORY.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(TARIFF_CATEGORY))
    }

    /// Line amount: unit price, plus tariff where it applies, times quantity.
    pub fn compute_amount(&self) -> DomainResult<f64> {
        if !self.is_attached() {
            return Err(DomainError::invalid_state(
                "line item must be added to an order before computing its amount",
            ));
        }
        let quantity = self.quantity.ok_or_else(|| {
            DomainError::invalid_state("line item has no quantity")
        })?;

        let mut price = self.unit_price;
        if self.is_tariffed() {
            price *= TARIFF_MULTIPLIER;
        }

        Ok(price * f64::from(quantity))
    }
}

fn validate_price(unit_price: f64) -> DomainResult<()> {
    if unit_price.is_nan() || unit_price < 0.0 {
        return Err(DomainError::invalid_argument(
            "unit_price must be non-negative",
        ));
    }
    Ok(())
}

fn unset_or<T: core::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-1".to_string(), |v| v.to_string())
}

impl core::fmt::Display for LineItem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "LineItem {{ {}, {}, {}, {}, {}, {} }}",
            unset_or(self.order_number),
            unset_or(self.line_number),
            self.stock_id,
            self.stock_name,
            self.unit_price,
            unset_or(self.quantity),
        )
    }
}
