//! `backstock-purchasing` — purchase-order workflow domain module.
//!
//! A purchase order is composed as a draft (lines, charges, derived totals
//! via `backstock-pricing`), submitted to the supplier, and then settled
//! through payments.

pub mod order;

pub use order::{
    AddLineItem, AdjustQuantity, CreatePurchase, PaymentMethodId, PurchaseOrder,
    PurchaseOrderCommand, PurchaseOrderEvent, PurchaseOrderId, PurchaseStatus, RegisterPayment,
    RemoveLineItem, SetOrderCharges, SubmitPurchase, UpdateLineItem,
};
