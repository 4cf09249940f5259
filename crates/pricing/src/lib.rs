//! `backstock-pricing` — purchase line-item pricing and invoice totals.
//!
//! Pure, deterministic arithmetic over an order draft: per-line totals from
//! cost/quantity/discount/tax, and the order-level grand total from the
//! summed lines plus shipping, order discount and order tax. Every mutation
//! of a draft re-derives the affected totals in the same step — derived
//! values are never left stale and never independently settable.
//!
//! No IO, no async, no shared state: the engine is invoked once per user
//! edit and must yield identical output for identical input.

pub mod amount;
pub mod error;
pub mod line;
pub mod order;

pub use amount::sanitize_amount;
pub use error::PricingError;
pub use line::{DiscountMethod, LineItem, LineItemEdit, Quantity, TaxMethod, compute_line_total};
pub use order::{
    OrderCharges, OrderDraft, OrderTotals, grand_total, order_subtotal, recompute_order_totals,
};
