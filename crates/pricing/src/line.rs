//! Line items and the per-line total computation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use backstock_core::ValueObject;
use backstock_products::VariantId;

use crate::error::PricingError;

/// How a line discount is applied to the unit cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountMethod {
    /// Flat currency subtraction from the unit cost.
    Fixed,
    /// Percentage-of-cost reduction.
    Percent,
}

/// Whether tax is already embedded in the unit cost or added on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxMethod {
    /// Tax already embedded; nothing further is added.
    Include,
    /// Tax computed on the discounted price and added on top.
    Exclude,
}

/// Order quantity, clamped to the range the back office allows per line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub const MIN: Quantity = Quantity(1);
    pub const MAX: Quantity = Quantity(25);

    /// Clamp an arbitrary count into `[MIN, MAX]`.
    pub fn clamped(raw: i64) -> Self {
        Self(raw.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u32)
    }

    /// Nudge by `delta`, clamped: a decrement at the minimum and an
    /// increment at the maximum both return the quantity unchanged.
    pub fn saturating_add(self, delta: i64) -> Self {
        Self::clamped((self.0 as i64).saturating_add(delta))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::MIN
    }
}

impl ValueObject for Quantity {}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Compute a line total from its pricing inputs.
///
/// 1. Discount the unit cost (`Fixed` subtracts, `Percent` scales, absent
///    method leaves the cost untouched).
/// 2. Apply tax to the discounted price (`Exclude` adds `rate`% on top,
///    `Include` and absent method add nothing).
/// 3. Multiply by the quantity.
///
/// Total is a pure function of these five inputs; it never fails for any
/// finite input.
pub fn compute_line_total(
    unit_cost: Decimal,
    quantity: Quantity,
    discount: Decimal,
    discount_method: Option<DiscountMethod>,
    tax_rate: Decimal,
    tax_method: Option<TaxMethod>,
) -> Decimal {
    let discounted = match discount_method {
        Some(DiscountMethod::Fixed) => unit_cost - discount,
        Some(DiscountMethod::Percent) => {
            unit_cost * (Decimal::ONE_HUNDRED - discount) / Decimal::ONE_HUNDRED
        }
        None => unit_cost,
    };

    let after_tax = match tax_method {
        Some(TaxMethod::Exclude) => discounted + discounted * tax_rate / Decimal::ONE_HUNDRED,
        Some(TaxMethod::Include) | None => discounted,
    };

    Decimal::from(quantity.get()) * after_tax
}

/// One product-variant entry in a purchase order.
///
/// `line_total` is derived: every constructor and mutator recomputes it from
/// the other fields, so it can never drift from its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    variant_id: VariantId,
    unit_cost: Decimal,
    quantity: Quantity,
    discount: Decimal,
    discount_method: Option<DiscountMethod>,
    tax_rate: Decimal,
    tax_method: Option<TaxMethod>,
    line_total: Decimal,
}

/// Detail-dialog payload for creating or replacing a line item.
///
/// Cost and quantity are required; the discount/tax fields follow the
/// leniency policy and fall back to zero / no-op when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemEdit {
    pub unit_cost: Option<Decimal>,
    pub quantity: Option<i64>,
    pub discount: Option<Decimal>,
    pub discount_method: Option<DiscountMethod>,
    pub tax_rate: Option<Decimal>,
    pub tax_method: Option<TaxMethod>,
}

impl LineItem {
    /// A freshly picked variant: quantity 1, everything else zeroed,
    /// awaiting the detail dialog.
    pub fn pending(variant_id: VariantId) -> Self {
        let mut line = Self {
            variant_id,
            unit_cost: Decimal::ZERO,
            quantity: Quantity::MIN,
            discount: Decimal::ZERO,
            discount_method: None,
            tax_rate: Decimal::ZERO,
            tax_method: None,
            line_total: Decimal::ZERO,
        };
        line.recompute();
        line
    }

    /// Build a line from a completed detail dialog.
    pub fn from_edit(variant_id: VariantId, edit: &LineItemEdit) -> Result<Self, PricingError> {
        let unit_cost = edit.unit_cost.ok_or(PricingError::MissingField("cost"))?;
        let quantity = edit.quantity.ok_or(PricingError::MissingField("quantity"))?;

        let mut line = Self {
            variant_id,
            unit_cost,
            quantity: Quantity::clamped(quantity),
            discount: edit.discount.unwrap_or(Decimal::ZERO),
            discount_method: edit.discount_method,
            tax_rate: edit.tax_rate.unwrap_or(Decimal::ZERO),
            tax_method: edit.tax_method,
            line_total: Decimal::ZERO,
        };
        line.recompute();
        Ok(line)
    }

    pub fn variant_id(&self) -> VariantId {
        self.variant_id
    }

    pub fn unit_cost(&self) -> Decimal {
        self.unit_cost
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn discount(&self) -> Decimal {
        self.discount
    }

    pub fn discount_method(&self) -> Option<DiscountMethod> {
        self.discount_method
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    pub fn tax_method(&self) -> Option<TaxMethod> {
        self.tax_method
    }

    /// The derived total for this line.
    pub fn total(&self) -> Decimal {
        self.line_total
    }

    /// Replace the editable fields from a completed detail dialog.
    ///
    /// Validation happens before any field changes, so a rejected edit
    /// leaves the line untouched.
    pub fn apply_edit(&mut self, edit: &LineItemEdit) -> Result<(), PricingError> {
        *self = Self::from_edit(self.variant_id, edit)?;
        Ok(())
    }

    /// Nudge the quantity by `delta`, clamped to the allowed range.
    ///
    /// Returns `false` when the clamp makes the nudge a no-op. The total is
    /// recomputed in the same step; there is no stale-total window.
    pub fn nudge_quantity(&mut self, delta: i64) -> bool {
        let nudged = self.quantity.saturating_add(delta);
        if nudged == self.quantity {
            return false;
        }
        self.quantity = nudged;
        self.recompute();
        true
    }

    fn recompute(&mut self) {
        self.line_total = compute_line_total(
            self.unit_cost,
            self.quantity,
            self.discount,
            self.discount_method,
            self.tax_rate,
            self.tax_method,
        );
    }
}
