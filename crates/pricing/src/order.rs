//! Order-level totals and the caller-owned order draft.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use backstock_core::ValueObject;
use backstock_products::VariantId;

use crate::error::PricingError;
use crate::line::{LineItem, LineItemEdit};

/// Order-level modifiers layered on top of the summed line items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCharges {
    /// Flat shipping cost added after order tax.
    pub shipping: Decimal,
    /// Flat discount subtracted from the line subtotal before order tax.
    pub discount: Decimal,
    /// Order tax percentage applied to the post-discount subtotal.
    pub tax_rate: Decimal,
}

impl ValueObject for OrderCharges {}

/// Derived order-level totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of all line totals.
    pub subtotal: Decimal,
    /// Subtotal minus the order discount. Deliberately unclamped: a discount
    /// larger than the subtotal goes negative and then has order tax and
    /// shipping applied on top, exactly as the back office computes it.
    pub after_discount: Decimal,
    /// Final amount: post-discount subtotal, plus order tax, plus shipping.
    pub grand_total: Decimal,
}

impl ValueObject for OrderTotals {}

/// Sum the line totals. Order-independent: any permutation of `lines`
/// yields the same subtotal.
pub fn order_subtotal(lines: &[LineItem]) -> Decimal {
    lines.iter().map(LineItem::total).sum()
}

/// Fold the order-level charges over a subtotal.
pub fn grand_total(subtotal: Decimal, charges: &OrderCharges) -> Decimal {
    let after_discount = subtotal - charges.discount;
    after_discount + after_discount * charges.tax_rate / Decimal::ONE_HUNDRED + charges.shipping
}

/// Derive the full totals breakdown for a line set and its charges.
pub fn recompute_order_totals(lines: &[LineItem], charges: &OrderCharges) -> OrderTotals {
    let subtotal = order_subtotal(lines);
    OrderTotals {
        subtotal,
        after_discount: subtotal - charges.discount,
        grand_total: grand_total(subtotal, charges),
    }
}

/// The in-memory, not-yet-submitted representation of a purchase order
/// being composed or edited.
///
/// The draft owns the line-item collection; every mutating operation
/// re-derives the totals before returning, so `totals()` is never stale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    lines: Vec<LineItem>,
    charges: OrderCharges,
    totals: OrderTotals,
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn charges(&self) -> &OrderCharges {
        &self.charges
    }

    pub fn totals(&self) -> &OrderTotals {
        &self.totals
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, variant_id: VariantId) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.variant_id() == variant_id)
    }

    fn position(&self, variant_id: VariantId) -> Option<usize> {
        self.lines.iter().position(|l| l.variant_id() == variant_id)
    }

    /// Add a line to the draft.
    ///
    /// A variant already on the order is rejected outright: the add is
    /// fully discarded, never merged into the existing line.
    pub fn add_line(&mut self, line: LineItem) -> Result<(), PricingError> {
        if self.line(line.variant_id()).is_some() {
            return Err(PricingError::DuplicateLineItem(line.variant_id()));
        }
        self.lines.push(line);
        self.recompute();
        Ok(())
    }

    /// Replace the line for `line.variant_id()` in place.
    pub fn replace_line(&mut self, line: LineItem) -> Result<(), PricingError> {
        let index = self
            .position(line.variant_id())
            .ok_or(PricingError::UnknownLineItem(line.variant_id()))?;
        self.lines[index] = line;
        self.recompute();
        Ok(())
    }

    /// Re-edit an existing line from a completed detail dialog.
    ///
    /// The edit is validated before anything changes; a rejected edit leaves
    /// the draft untouched.
    pub fn update_line(
        &mut self,
        variant_id: VariantId,
        edit: &LineItemEdit,
    ) -> Result<(), PricingError> {
        if self.position(variant_id).is_none() {
            return Err(PricingError::UnknownLineItem(variant_id));
        }
        let line = LineItem::from_edit(variant_id, edit)?;
        self.replace_line(line)
    }

    /// Nudge a line's quantity by `delta`, clamped to the allowed range.
    ///
    /// Returns whether the quantity actually changed. The line total and the
    /// order totals are re-derived in the same step.
    pub fn adjust_quantity(
        &mut self,
        variant_id: VariantId,
        delta: i64,
    ) -> Result<bool, PricingError> {
        let index = self
            .position(variant_id)
            .ok_or(PricingError::UnknownLineItem(variant_id))?;

        let changed = self.lines[index].nudge_quantity(delta);
        if changed {
            self.recompute();
        } else {
            tracing::debug!(%variant_id, delta, "quantity nudge clamped to a no-op");
        }
        Ok(changed)
    }

    /// Remove a line and re-derive the order totals.
    pub fn remove_line(&mut self, variant_id: VariantId) -> Result<LineItem, PricingError> {
        let index = self
            .position(variant_id)
            .ok_or(PricingError::UnknownLineItem(variant_id))?;
        let removed = self.lines.remove(index);
        self.recompute();
        Ok(removed)
    }

    /// Replace the order-level charges and re-derive the totals.
    pub fn set_charges(&mut self, charges: OrderCharges) {
        self.charges = charges;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.totals = recompute_order_totals(&self.lines, &self.charges);
    }
}
