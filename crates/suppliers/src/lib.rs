//! `backstock-suppliers` — supplier registry domain module.

pub mod supplier;

pub use supplier::{
    ContactInfo, RegisterSupplier, ReinstateSupplier, Supplier, SupplierCommand, SupplierEvent,
    SupplierId, SupplierStatus, SuspendSupplier, UpdateContact,
};
