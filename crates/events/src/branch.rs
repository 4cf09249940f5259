use backstock_core::BranchId;

use crate::EventEnvelope;

/// Helper trait for branch-scoped messages.
///
/// Marks types that carry an associated branch, enabling branch-aware
/// processing in consumers (filter a subscription loop to one branch,
/// validate that a message belongs to the expected branch, etc.).
pub trait BranchScoped {
    fn branch_id(&self) -> BranchId;
}

impl<E> BranchScoped for EventEnvelope<E> {
    fn branch_id(&self) -> BranchId {
        self.branch_id()
    }
}
