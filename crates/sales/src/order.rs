use chrono::{DateTime, Local};

use ordercap_core::{DomainError, DomainResult, Entity, LineNumber, OrderNumber, OrderNumberSequence};

use crate::line_item::LineItem;

/// Sales tax applied to the subtotal.
pub const TAX_RATE: f64 = 0.10;

/// Aggregate root: a customer order and its line items.
///
/// Totals stay at zero until `compute_totals` runs. Line items are owned
/// copies stamped with this order's number and a gap-free line number.
#[derive(Debug, PartialEq)]
pub struct Order {
    order_number: OrderNumber,
    timestamp: DateTime<Local>,
    customer_name: String,
    customer_phone: String,
    subtotal: f64,
    tax_amount: f64,
    total_amount: f64,
    line_items: Vec<LineItem>,
}

impl Order {
    /// Create an empty order, taking the next number from `sequence`.
    pub fn new<S>(
        sequence: &S,
        customer_name: impl Into<String>,
        customer_phone: impl Into<String>,
    ) -> DomainResult<Self>
    where
        S: OrderNumberSequence + ?Sized,
    {
        let customer_name = customer_name.into();
        let customer_phone = customer_phone.into();

        if customer_name.is_empty() {
            return Err(DomainError::invalid_argument("customer_name must not be empty"));
        }
        if customer_phone.is_empty() {
            return Err(DomainError::invalid_argument("customer_phone must not be empty"));
        }

        Ok(Self {
            order_number: sequence.next_order_number()?,
            timestamp: Local::now(),
            customer_name,
            customer_phone,
            subtotal: 0.0,
            tax_amount: 0.0,
            total_amount: 0.0,
            line_items: Vec::new(),
        })
    }

    /// Duplicate `other` under a fresh order number and the current time.
    ///
    /// Customer fields and totals are copied; every line item is deep-copied
    /// and restamped with the new order number.
    pub fn copy_from<S>(sequence: &S, other: &Order) -> DomainResult<Self>
    where
        S: OrderNumberSequence + ?Sized,
    {
        let order_number = sequence.next_order_number()?;
        let mut line_items = other.line_items.clone();
        for item in &mut line_items {
            item.restamp(order_number);
        }

        Ok(Self {
            order_number,
            timestamp: Local::now(),
            customer_name: other.customer_name.clone(),
            customer_phone: other.customer_phone.clone(),
            subtotal: other.subtotal,
            tax_amount: other.tax_amount,
            total_amount: other.total_amount,
            line_items,
        })
    }

    /// Reassemble an order from persisted parts. Line-number continuity is checked.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        order_number: OrderNumber,
        timestamp: DateTime<Local>,
        customer_name: String,
        customer_phone: String,
        subtotal: f64,
        tax_amount: f64,
        total_amount: f64,
        line_items: Vec<LineItem>,
    ) -> DomainResult<Self> {
        if customer_name.is_empty() || customer_phone.is_empty() {
            return Err(DomainError::invalid_argument(
                "customer name and phone must not be empty",
            ));
        }
        for amount in [subtotal, tax_amount, total_amount] {
            if amount.is_nan() || amount < 0.0 {
                return Err(DomainError::invalid_argument("amounts must be non-negative"));
            }
        }

        let mut expected = LineNumber::FIRST;
        for item in &line_items {
            if item.line_number() != Some(expected) {
                return Err(DomainError::invalid_argument(format!(
                    "line items must be numbered 1..N without gaps (expected line {expected})"
                )));
            }
            expected = expected.next();
        }

        Ok(Self {
            order_number,
            timestamp,
            customer_name,
            customer_phone,
            subtotal,
            tax_amount,
            total_amount,
            line_items,
        })
    }

    pub fn order_number(&self) -> OrderNumber {
        self.order_number
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn customer_phone(&self) -> &str {
        &self.customer_phone
    }

    /// Sum of line amounts after tariffs, before tax.
    pub fn subtotal(&self) -> f64 {
        self.subtotal
    }

    pub fn tax_amount(&self) -> f64 {
        self.tax_amount
    }

    pub fn total_amount(&self) -> f64 {
        self.total_amount
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Mutable access to one line for price overrides.
    pub fn line_item_mut(&mut self, line_number: LineNumber) -> Option<&mut LineItem> {
        self.line_items
            .iter_mut()
            .find(|item| item.line_number() == Some(line_number))
    }

    /// Append an attached copy of `item` as the next line.
    ///
    /// `item` itself is left untouched. Totals are not recomputed.
    pub fn add_line_item(&mut self, item: &LineItem, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::invalid_argument("quantity must be positive"));
        }

        let line_number = u32::try_from(self.line_items.len() + 1)
            .map_err(|_| DomainError::invalid_state("too many line items"))?;
        let attached = item.attached(self.order_number, line_number, quantity)?;
        self.line_items.push(attached);
        Ok(())
    }

    /// Compute subtotal, tax and total from the current line items.
    ///
    /// Fails without touching the stored totals if the order is empty or a
    /// line amount cannot be computed.
    pub fn compute_totals(&mut self) -> DomainResult<()> {
        if self.line_items.is_empty() {
            return Err(DomainError::invalid_state(
                "cannot process an order without line items",
            ));
        }

        let mut subtotal = 0.0;
        for item in &self.line_items {
            subtotal += item.compute_amount()?;
        }

        if subtotal < 0.0 {
            return Err(DomainError::invalid_state("subtotal must be non-negative"));
        }

        let tax_amount = subtotal * TAX_RATE;
        self.subtotal = subtotal;
        self.tax_amount = tax_amount;
        self.total_amount = subtotal + tax_amount;
        Ok(())
    }
}

impl Entity for Order {
    type Id = OrderNumber;

    fn id(&self) -> Self::Id {
        self.order_number
    }
}

impl core::fmt::Display for Order {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Order {{ {}, {}, {}, {}, {}, {} }}",
            self.order_number,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.customer_name,
            self.customer_phone,
            self.tax_amount,
            self.total_amount,
        )?;
        for item in &self.line_items {
            write!(f, "\n{item}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordercap_core::AtomicOrderNumbers;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    fn billy(seq: &AtomicOrderNumbers) -> Order {
        Order::new(seq, "Billy Smith", "6780923750").unwrap()
    }

    fn tv() -> LineItem {
        LineItem::new("ELECT001", "42 Inch TV", 300.00).unwrap()
    }

    fn mower() -> LineItem {
        LineItem::new("GARD003", "Lawn Mower", 500.00).unwrap()
    }

    fn line(n: u32) -> LineNumber {
        LineNumber::new(n).unwrap()
    }

    #[test]
    fn new_order_starts_empty_with_zero_totals() {
        let seq = AtomicOrderNumbers::new();
        let order = billy(&seq);

        assert_eq!(order.order_number().get(), 1000);
        assert_eq!(order.customer_name(), "Billy Smith");
        assert_eq!(order.customer_phone(), "6780923750");
        assert_eq!(order.subtotal(), 0.0);
        assert_eq!(order.tax_amount(), 0.0);
        assert_eq!(order.total_amount(), 0.0);
        assert!(order.line_items().is_empty());
        assert_eq!(order.id(), order.order_number());
    }

    #[test]
    fn exhausted_sequence_cannot_number_an_order() {
        let seq = AtomicOrderNumbers::starting_at(u32::MAX);
        let last = billy(&seq);
        assert_eq!(last.order_number().get(), u32::MAX);

        assert!(matches!(
            Order::new(&seq, "Billy Smith", "6780923750"),
            Err(DomainError::InvalidState(_))
        ));
        assert!(matches!(
            Order::copy_from(&seq, &last),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn order_numbers_come_from_the_sequence() {
        let seq = AtomicOrderNumbers::starting_at(7);
        let first = billy(&seq);
        let second = Order::new(&seq, "Sara Wilkinson", "5678761426").unwrap();
        assert_eq!(first.order_number().get(), 7);
        assert_eq!(second.order_number().get(), 8);
    }

    #[test]
    fn empty_customer_fields_are_rejected() {
        let seq = AtomicOrderNumbers::new();
        assert!(matches!(
            Order::new(&seq, "", "6780923750"),
            Err(DomainError::InvalidArgument(_))
        ));
        assert!(matches!(
            Order::new(&seq, "Billy Smith", ""),
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn add_line_item_stamps_order_line_and_quantity() {
        let seq = AtomicOrderNumbers::new();
        let mut order = billy(&seq);
        let item = tv();

        order.add_line_item(&item, 2).unwrap();
        order.add_line_item(&mower(), 1).unwrap();

        let lines = order.line_items();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].order_number(), Some(order.order_number()));
        assert_eq!(lines[0].line_number(), Some(line(1)));
        assert_eq!(lines[0].quantity(), Some(2));
        assert_eq!(lines[1].line_number(), Some(line(2)));
        assert!(!item.is_attached());
        assert_eq!(order.total_amount(), 0.0);
    }

    #[test]
    fn add_line_item_rejects_zero_quantity() {
        let seq = AtomicOrderNumbers::new();
        let mut order = billy(&seq);
        let err = order.add_line_item(&tv(), 0).unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
        assert!(order.line_items().is_empty());
    }

    #[test]
    fn billy_smith_scenario_totals() {
        let seq = AtomicOrderNumbers::new();
        let mut order = billy(&seq);
        order.add_line_item(&tv(), 1).unwrap();
        order.add_line_item(&mower(), 1).unwrap();

        order.compute_totals().unwrap();

        assert!((order.subtotal() - 815.00).abs() < EPSILON);
        assert!((order.tax_amount() - 81.50).abs() < EPSILON);
        assert!((order.total_amount() - 896.50).abs() < EPSILON);
    }

    #[test]
    fn compute_totals_on_empty_order_fails() {
        let seq = AtomicOrderNumbers::new();
        let mut order = Order::new(&seq, "John Jenkins", "2533124578").unwrap();
        let err = order.compute_totals().unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn compute_totals_twice_recomputes() {
        let seq = AtomicOrderNumbers::new();
        let mut order = billy(&seq);
        order.add_line_item(&mower(), 1).unwrap();
        order.compute_totals().unwrap();

        order
            .line_item_mut(line(1))
            .unwrap()
            .set_unit_price(100.0)
            .unwrap();
        order.compute_totals().unwrap();

        assert!((order.subtotal() - 100.0).abs() < EPSILON);
        assert!((order.total_amount() - 110.0).abs() < EPSILON);
    }

    #[test]
    fn copy_takes_new_number_and_deep_copies_lines() {
        let seq = AtomicOrderNumbers::new();
        let mut original = billy(&seq);
        original.add_line_item(&tv(), 2).unwrap();
        original.compute_totals().unwrap();

        let mut copy = Order::copy_from(&seq, &original).unwrap();

        assert_ne!(copy.order_number(), original.order_number());
        assert_eq!(copy.customer_name(), original.customer_name());
        assert_eq!(copy.customer_phone(), original.customer_phone());
        assert_eq!(copy.total_amount(), original.total_amount());
        assert_eq!(copy.line_items().len(), 1);
        assert_eq!(copy.line_items()[0].order_number(), Some(copy.order_number()));

        copy.line_item_mut(line(1)).unwrap().set_unit_price(1.0).unwrap();
        assert_eq!(original.line_items()[0].unit_price(), 300.0);

        original.line_item_mut(line(1)).unwrap().set_unit_price(2.0).unwrap();
        assert_eq!(copy.line_items()[0].unit_price(), 1.0);

        original.add_line_item(&mower(), 1).unwrap();
        assert_eq!(copy.line_items().len(), 1);
    }

    #[test]
    fn display_lists_header_then_lines() {
        let seq = AtomicOrderNumbers::new();
        let mut order = Order::new(&seq, "John Jenkins", "2533124578").unwrap();
        order.add_line_item(&tv(), 2).unwrap();

        let text = order.to_string();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("Order { 1000, "));
        assert!(header.ends_with("John Jenkins, 2533124578, 0, 0 }"));
        assert_eq!(lines.next(), Some("LineItem { 1000, 1, ELECT001, 42 Inch TV, 300, 2 }"));
        assert_eq!(lines.next(), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: tax is 10% of the subtotal and total is subtotal * 1.10.
        #[test]
        fn tax_and_total_follow_subtotal(
            lines in prop::collection::vec((0.0f64..10_000.0, 1u32..50, any::<bool>()), 1..10)
        ) {
            let seq = AtomicOrderNumbers::new();
            let mut order = Order::new(&seq, "Prop Customer", "5550000000").unwrap();

            for (price, quantity, electronics) in &lines {
                let stock_id = if *electronics { "ELECT100" } else { "HOME100" };
                let item = LineItem::new(stock_id, "Generated", *price).unwrap();
                order.add_line_item(&item, *quantity).unwrap();
            }

            order.compute_totals().unwrap();

            let subtotal = order.subtotal();
            let tolerance = subtotal.abs() * 1e-12 + EPSILON;
            prop_assert!((order.tax_amount() - subtotal * TAX_RATE).abs() <= tolerance);
            prop_assert!((order.total_amount() - subtotal * 1.10).abs() <= tolerance);

            let line_numbers: Vec<u32> = order
                .line_items()
                .iter()
                .filter_map(|item| item.line_number().map(|n| n.get()))
                .collect();
            let expected: Vec<u32> = (1..=lines.len() as u32).collect();
            prop_assert_eq!(line_numbers, expected);
        }
    }
}
