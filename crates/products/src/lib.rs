//! `backstock-products` — product catalog domain module.
//!
//! Products carry sellable/purchasable **variants**; purchase-order lines
//! reference a variant, never a bare product.

pub mod product;

pub use product::{
    AddVariant, ArchiveProduct, ActivateProduct, CreateProduct, Product, ProductCommand,
    ProductEvent, ProductId, ProductStatus, Variant, VariantId,
};
