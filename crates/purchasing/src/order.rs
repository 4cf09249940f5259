use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use backstock_core::{Aggregate, AggregateId, AggregateRoot, BranchId, DomainError};
use backstock_events::Event;
use backstock_pricing::{
    LineItem, LineItemEdit, OrderCharges, OrderDraft, OrderTotals, PricingError,
};
use backstock_products::VariantId;
use backstock_suppliers::SupplierId;

/// Purchase order identifier (branch-scoped via `branch_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(pub AggregateId);

impl PurchaseOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Payment method identifier (cash, card, transfer, ...; managed elsewhere).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethodId(pub AggregateId);

impl PaymentMethodId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PaymentMethodId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase order status lifecycle.
///
/// Draft orders are being composed and remain fully editable. Submission
/// freezes the line set; from then on only payments change the order, and
/// covering the grand total marks it paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Draft,
    Pending,
    Paid,
}

/// Aggregate root: PurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    branch_id: Option<BranchId>,
    supplier_id: Option<SupplierId>,
    order_date: Option<NaiveDate>,
    note: String,
    draft: OrderDraft,
    status: PurchaseStatus,
    paid_amount: Decimal,
    version: u64,
    created: bool,
}

impl PurchaseOrder {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: PurchaseOrderId) -> Self {
        Self {
            id,
            branch_id: None,
            supplier_id: None,
            order_date: None,
            note: String::new(),
            draft: OrderDraft::new(),
            status: PurchaseStatus::Draft,
            paid_amount: Decimal::ZERO,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> PurchaseOrderId {
        self.id
    }

    pub fn branch_id(&self) -> Option<BranchId> {
        self.branch_id
    }

    pub fn supplier_id(&self) -> Option<SupplierId> {
        self.supplier_id
    }

    pub fn order_date(&self) -> Option<NaiveDate> {
        self.order_date
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn status(&self) -> PurchaseStatus {
        self.status
    }

    pub fn lines(&self) -> &[LineItem] {
        self.draft.lines()
    }

    pub fn charges(&self) -> &OrderCharges {
        self.draft.charges()
    }

    /// Freshly derived totals; never stale (re-derived on every mutation).
    pub fn totals(&self) -> &OrderTotals {
        self.draft.totals()
    }

    pub fn grand_total(&self) -> Decimal {
        self.draft.totals().grand_total
    }

    pub fn paid_amount(&self) -> Decimal {
        self.paid_amount
    }

    /// What remains to be paid (never negative).
    pub fn outstanding_amount(&self) -> Decimal {
        (self.grand_total() - self.paid_amount).max(Decimal::ZERO)
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreatePurchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePurchase {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub supplier_id: SupplierId,
    pub order_date: NaiveDate,
    pub note: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddLineItem (only allowed in Draft; duplicates rejected).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLineItem {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub variant_id: VariantId,
    pub edit: LineItemEdit,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateLineItem (re-edit of an existing line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLineItem {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub variant_id: VariantId,
    pub edit: LineItemEdit,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdjustQuantity (clamped nudge from the +/- buttons).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustQuantity {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub variant_id: VariantId,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveLineItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLineItem {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub variant_id: VariantId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetOrderCharges (order tax / discount / shipping footer fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOrderCharges {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub charges: OrderCharges,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SubmitPurchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitPurchase {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RegisterPayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterPayment {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub payment_method_id: PaymentMethodId,
    pub amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderCommand {
    CreatePurchase(CreatePurchase),
    AddLineItem(AddLineItem),
    UpdateLineItem(UpdateLineItem),
    AdjustQuantity(AdjustQuantity),
    RemoveLineItem(RemoveLineItem),
    SetOrderCharges(SetOrderCharges),
    SubmitPurchase(SubmitPurchase),
    RegisterPayment(RegisterPayment),
}

/// Event: PurchaseCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseCreated {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub supplier_id: SupplierId,
    pub order_date: NaiveDate,
    pub note: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineItemAdded (carries the fully computed line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemAdded {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub line: LineItem,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineItemUpdated (in-place replacement for the same variant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemUpdated {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub line: LineItem,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuantityAdjusted.
///
/// Carries the delta; the clamp is deterministic, so replaying the event
/// always lands on the same quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityAdjusted {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub variant_id: VariantId,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineItemRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRemoved {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub variant_id: VariantId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderChargesSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChargesSet {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub charges: OrderCharges,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseSubmitted (snapshots the grand total sent to the backend).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseSubmitted {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub grand_total: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRegistered {
    pub branch_id: BranchId,
    pub order_id: PurchaseOrderId,
    pub payment_method_id: PaymentMethodId,
    pub amount: Decimal,
    pub new_paid_amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderEvent {
    PurchaseCreated(PurchaseCreated),
    LineItemAdded(LineItemAdded),
    LineItemUpdated(LineItemUpdated),
    QuantityAdjusted(QuantityAdjusted),
    LineItemRemoved(LineItemRemoved),
    OrderChargesSet(OrderChargesSet),
    PurchaseSubmitted(PurchaseSubmitted),
    PaymentRegistered(PaymentRegistered),
}

impl Event for PurchaseOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PurchaseOrderEvent::PurchaseCreated(_) => "purchasing.order.created",
            PurchaseOrderEvent::LineItemAdded(_) => "purchasing.order.line_added",
            PurchaseOrderEvent::LineItemUpdated(_) => "purchasing.order.line_updated",
            PurchaseOrderEvent::QuantityAdjusted(_) => "purchasing.order.quantity_adjusted",
            PurchaseOrderEvent::LineItemRemoved(_) => "purchasing.order.line_removed",
            PurchaseOrderEvent::OrderChargesSet(_) => "purchasing.order.charges_set",
            PurchaseOrderEvent::PurchaseSubmitted(_) => "purchasing.order.submitted",
            PurchaseOrderEvent::PaymentRegistered(_) => "purchasing.order.payment_registered",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PurchaseOrderEvent::PurchaseCreated(e) => e.occurred_at,
            PurchaseOrderEvent::LineItemAdded(e) => e.occurred_at,
            PurchaseOrderEvent::LineItemUpdated(e) => e.occurred_at,
            PurchaseOrderEvent::QuantityAdjusted(e) => e.occurred_at,
            PurchaseOrderEvent::LineItemRemoved(e) => e.occurred_at,
            PurchaseOrderEvent::OrderChargesSet(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseSubmitted(e) => e.occurred_at,
            PurchaseOrderEvent::PaymentRegistered(e) => e.occurred_at,
        }
    }
}

impl Aggregate for PurchaseOrder {
    type Command = PurchaseOrderCommand;
    type Event = PurchaseOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        // Events are validated facts decided by `handle`; the draft results
        // below cannot fail on a well-formed stream.
        match event {
            PurchaseOrderEvent::PurchaseCreated(e) => {
                self.id = e.order_id;
                self.branch_id = Some(e.branch_id);
                self.supplier_id = Some(e.supplier_id);
                self.order_date = Some(e.order_date);
                self.note = e.note.clone();
                self.draft = OrderDraft::new();
                self.status = PurchaseStatus::Draft;
                self.paid_amount = Decimal::ZERO;
                self.created = true;
            }
            PurchaseOrderEvent::LineItemAdded(e) => {
                let _ = self.draft.add_line(e.line.clone());
            }
            PurchaseOrderEvent::LineItemUpdated(e) => {
                let _ = self.draft.replace_line(e.line.clone());
            }
            PurchaseOrderEvent::QuantityAdjusted(e) => {
                let _ = self.draft.adjust_quantity(e.variant_id, e.delta);
            }
            PurchaseOrderEvent::LineItemRemoved(e) => {
                let _ = self.draft.remove_line(e.variant_id);
            }
            PurchaseOrderEvent::OrderChargesSet(e) => {
                self.draft.set_charges(e.charges);
            }
            PurchaseOrderEvent::PurchaseSubmitted(_) => {
                self.status = PurchaseStatus::Pending;
            }
            PurchaseOrderEvent::PaymentRegistered(e) => {
                self.paid_amount = e.new_paid_amount;
                if self.paid_amount >= self.grand_total() {
                    self.status = PurchaseStatus::Paid;
                }
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PurchaseOrderCommand::CreatePurchase(cmd) => self.handle_create(cmd),
            PurchaseOrderCommand::AddLineItem(cmd) => self.handle_add_line(cmd),
            PurchaseOrderCommand::UpdateLineItem(cmd) => self.handle_update_line(cmd),
            PurchaseOrderCommand::AdjustQuantity(cmd) => self.handle_adjust_quantity(cmd),
            PurchaseOrderCommand::RemoveLineItem(cmd) => self.handle_remove_line(cmd),
            PurchaseOrderCommand::SetOrderCharges(cmd) => self.handle_set_charges(cmd),
            PurchaseOrderCommand::SubmitPurchase(cmd) => self.handle_submit(cmd),
            PurchaseOrderCommand::RegisterPayment(cmd) => self.handle_register_payment(cmd),
        }
    }
}

impl PurchaseOrder {
    fn ensure_branch(&self, branch_id: BranchId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.branch_id != Some(branch_id) {
            return Err(DomainError::invariant("branch mismatch"));
        }
        Ok(())
    }

    fn ensure_order_id(&self, order_id: PurchaseOrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_editable(&self) -> Result<(), DomainError> {
        if self.status != PurchaseStatus::Draft {
            return Err(DomainError::invariant(
                "purchase can no longer be edited once submitted",
            ));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreatePurchase) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("purchase order already exists"));
        }

        Ok(vec![PurchaseOrderEvent::PurchaseCreated(PurchaseCreated {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            supplier_id: cmd.supplier_id,
            order_date: cmd.order_date,
            note: cmd.note.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line(&self, cmd: &AddLineItem) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_order_id(cmd.order_id)?;
        self.ensure_editable()?;

        // Never merge into an existing line: the add is fully discarded.
        if self.draft.line(cmd.variant_id).is_some() {
            return Err(PricingError::DuplicateLineItem(cmd.variant_id).into());
        }

        let line = LineItem::from_edit(cmd.variant_id, &cmd.edit)?;

        Ok(vec![PurchaseOrderEvent::LineItemAdded(LineItemAdded {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            line,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_line(
        &self,
        cmd: &UpdateLineItem,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_order_id(cmd.order_id)?;
        self.ensure_editable()?;

        if self.draft.line(cmd.variant_id).is_none() {
            return Err(PricingError::UnknownLineItem(cmd.variant_id).into());
        }

        let line = LineItem::from_edit(cmd.variant_id, &cmd.edit)?;

        Ok(vec![PurchaseOrderEvent::LineItemUpdated(LineItemUpdated {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            line,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_adjust_quantity(
        &self,
        cmd: &AdjustQuantity,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_order_id(cmd.order_id)?;
        self.ensure_editable()?;

        let line = self
            .draft
            .line(cmd.variant_id)
            .ok_or(PricingError::UnknownLineItem(cmd.variant_id))?;

        // A nudge past the allowed range is a no-op, not an error.
        if line.quantity().saturating_add(cmd.delta) == line.quantity() {
            tracing::debug!(
                variant_id = %cmd.variant_id,
                delta = cmd.delta,
                "quantity nudge clamped; nothing to record"
            );
            return Ok(vec![]);
        }

        Ok(vec![PurchaseOrderEvent::QuantityAdjusted(QuantityAdjusted {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            variant_id: cmd.variant_id,
            delta: cmd.delta,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_line(
        &self,
        cmd: &RemoveLineItem,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_order_id(cmd.order_id)?;
        self.ensure_editable()?;

        if self.draft.line(cmd.variant_id).is_none() {
            return Err(PricingError::UnknownLineItem(cmd.variant_id).into());
        }

        Ok(vec![PurchaseOrderEvent::LineItemRemoved(LineItemRemoved {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            variant_id: cmd.variant_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_charges(
        &self,
        cmd: &SetOrderCharges,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_order_id(cmd.order_id)?;
        self.ensure_editable()?;

        Ok(vec![PurchaseOrderEvent::OrderChargesSet(OrderChargesSet {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            charges: cmd.charges,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_submit(&self, cmd: &SubmitPurchase) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_order_id(cmd.order_id)?;

        if self.status != PurchaseStatus::Draft {
            return Err(DomainError::conflict("purchase has already been submitted"));
        }

        if self.draft.is_empty() {
            return Err(DomainError::validation(
                "cannot submit a purchase without line items",
            ));
        }

        Ok(vec![PurchaseOrderEvent::PurchaseSubmitted(PurchaseSubmitted {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            grand_total: self.grand_total(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_register_payment(
        &self,
        cmd: &RegisterPayment,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_order_id(cmd.order_id)?;

        if self.status == PurchaseStatus::Draft {
            return Err(DomainError::invariant(
                "cannot register payment on an unsubmitted purchase",
            ));
        }

        if cmd.amount <= Decimal::ZERO {
            return Err(DomainError::validation("payment amount must be positive"));
        }

        let new_paid_amount = self.paid_amount + cmd.amount;
        if new_paid_amount > self.grand_total() {
            return Err(DomainError::invariant("cannot overpay purchase"));
        }

        Ok(vec![PurchaseOrderEvent::PaymentRegistered(PaymentRegistered {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            payment_method_id: cmd.payment_method_id,
            amount: cmd.amount,
            new_paid_amount,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backstock_pricing::{DiscountMethod, TaxMethod};
    use rust_decimal_macros::dec;

    fn test_branch_id() -> BranchId {
        BranchId::new()
    }

    fn test_order_id() -> PurchaseOrderId {
        PurchaseOrderId::new(AggregateId::new())
    }

    fn test_supplier_id() -> SupplierId {
        SupplierId::new(AggregateId::new())
    }

    fn test_variant_id() -> VariantId {
        VariantId::new(AggregateId::new())
    }

    fn test_payment_method_id() -> PaymentMethodId {
        PaymentMethodId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    /// unitCost 100 × 2, Fixed 10 off, 10% tax on top → line total 198.
    fn edit_a() -> LineItemEdit {
        LineItemEdit {
            unit_cost: Some(dec!(100)),
            quantity: Some(2),
            discount: Some(dec!(10)),
            discount_method: Some(DiscountMethod::Fixed),
            tax_rate: Some(dec!(10)),
            tax_method: Some(TaxMethod::Exclude),
        }
    }

    /// unitCost 50 × 3, 20% off, tax included → line total 120.
    fn edit_b() -> LineItemEdit {
        LineItemEdit {
            unit_cost: Some(dec!(50)),
            quantity: Some(3),
            discount: Some(dec!(20)),
            discount_method: Some(DiscountMethod::Percent),
            tax_rate: Some(dec!(15)),
            tax_method: Some(TaxMethod::Include),
        }
    }

    struct Fixture {
        order: PurchaseOrder,
        branch_id: BranchId,
        order_id: PurchaseOrderId,
    }

    impl Fixture {
        fn created() -> Self {
            let branch_id = test_branch_id();
            let order_id = test_order_id();
            let mut order = PurchaseOrder::empty(order_id);
            let cmd = CreatePurchase {
                branch_id,
                order_id,
                supplier_id: test_supplier_id(),
                order_date: test_date(),
                note: "Quarterly restock".to_string(),
                occurred_at: test_time(),
            };
            let events = order
                .handle(&PurchaseOrderCommand::CreatePurchase(cmd))
                .unwrap();
            order.apply(&events[0]);
            Self {
                order,
                branch_id,
                order_id,
            }
        }

        fn dispatch(&mut self, command: PurchaseOrderCommand) -> Vec<PurchaseOrderEvent> {
            let events = self.order.handle(&command).unwrap();
            for event in &events {
                self.order.apply(event);
            }
            events
        }

        fn add_line(&mut self, variant_id: VariantId, edit: LineItemEdit) {
            self.dispatch(PurchaseOrderCommand::AddLineItem(AddLineItem {
                branch_id: self.branch_id,
                order_id: self.order_id,
                variant_id,
                edit,
                occurred_at: test_time(),
            }));
        }

        fn set_scenario_charges(&mut self) {
            self.dispatch(PurchaseOrderCommand::SetOrderCharges(SetOrderCharges {
                branch_id: self.branch_id,
                order_id: self.order_id,
                charges: OrderCharges {
                    shipping: dec!(15),
                    discount: dec!(18),
                    tax_rate: dec!(5),
                },
                occurred_at: test_time(),
            }));
        }

        fn submit(&mut self) {
            self.dispatch(PurchaseOrderCommand::SubmitPurchase(SubmitPurchase {
                branch_id: self.branch_id,
                order_id: self.order_id,
                occurred_at: test_time(),
            }));
        }
    }

    #[test]
    fn create_purchase_emits_purchase_created_event() {
        let order = PurchaseOrder::empty(test_order_id());
        let branch_id = test_branch_id();
        let order_id = test_order_id();
        let supplier_id = test_supplier_id();

        let cmd = CreatePurchase {
            branch_id,
            order_id,
            supplier_id,
            order_date: test_date(),
            note: String::new(),
            occurred_at: test_time(),
        };

        let events = order
            .handle(&PurchaseOrderCommand::CreatePurchase(cmd))
            .unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            PurchaseOrderEvent::PurchaseCreated(e) => {
                assert_eq!(e.branch_id, branch_id);
                assert_eq!(e.order_id, order_id);
                assert_eq!(e.supplier_id, supplier_id);
                assert_eq!(e.order_date, test_date());
            }
            _ => panic!("Expected PurchaseCreated event"),
        }
    }

    #[test]
    fn added_line_carries_its_computed_total() {
        let mut fx = Fixture::created();
        fx.add_line(test_variant_id(), edit_a());

        assert_eq!(fx.order.lines().len(), 1);
        assert_eq!(fx.order.lines()[0].total(), dec!(198));
        assert_eq!(fx.order.totals().subtotal, dec!(198));
    }

    #[test]
    fn duplicate_variant_add_is_a_conflict() {
        let mut fx = Fixture::created();
        let variant_id = test_variant_id();
        fx.add_line(variant_id, edit_a());

        let cmd = PurchaseOrderCommand::AddLineItem(AddLineItem {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            variant_id,
            edit: edit_b(),
            occurred_at: test_time(),
        });
        let err = fx.order.handle(&cmd).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        // The attempted add is fully discarded.
        assert_eq!(fx.order.lines().len(), 1);
        assert_eq!(fx.order.lines()[0].total(), dec!(198));
    }

    #[test]
    fn add_line_requires_cost_and_quantity() {
        let fx = Fixture::created();
        let cmd = PurchaseOrderCommand::AddLineItem(AddLineItem {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            variant_id: test_variant_id(),
            edit: LineItemEdit::default(),
            occurred_at: test_time(),
        });
        let err = fx.order.handle(&cmd).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn grand_total_matches_the_worked_scenario() {
        let mut fx = Fixture::created();
        fx.add_line(test_variant_id(), edit_a());
        fx.add_line(test_variant_id(), edit_b());
        fx.set_scenario_charges();

        let totals = fx.order.totals();
        assert_eq!(totals.subtotal, dec!(318));
        assert_eq!(totals.after_discount, dec!(300));
        assert_eq!(totals.grand_total, dec!(330));
    }

    #[test]
    fn update_line_replaces_and_recomputes() {
        let mut fx = Fixture::created();
        let variant_id = test_variant_id();
        fx.add_line(variant_id, edit_a());

        fx.dispatch(PurchaseOrderCommand::UpdateLineItem(UpdateLineItem {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            variant_id,
            edit: edit_b(),
            occurred_at: test_time(),
        }));

        assert_eq!(fx.order.lines().len(), 1);
        assert_eq!(fx.order.lines()[0].total(), dec!(120));
        assert_eq!(fx.order.totals().subtotal, dec!(120));
    }

    #[test]
    fn quantity_nudge_at_the_bound_emits_no_event() {
        let mut fx = Fixture::created();
        let variant_id = test_variant_id();
        fx.add_line(
            variant_id,
            LineItemEdit {
                unit_cost: Some(dec!(10)),
                quantity: Some(1),
                ..LineItemEdit::default()
            },
        );

        let events = fx.dispatch(PurchaseOrderCommand::AdjustQuantity(AdjustQuantity {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            variant_id,
            delta: -1,
            occurred_at: test_time(),
        }));
        assert!(events.is_empty());
        assert_eq!(fx.order.lines()[0].quantity().get(), 1);
    }

    #[test]
    fn quantity_nudge_recomputes_the_grand_total() {
        let mut fx = Fixture::created();
        let variant_id = test_variant_id();
        fx.add_line(variant_id, edit_a());
        assert_eq!(fx.order.grand_total(), dec!(198));

        let events = fx.dispatch(PurchaseOrderCommand::AdjustQuantity(AdjustQuantity {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            variant_id,
            delta: 1,
            occurred_at: test_time(),
        }));
        assert_eq!(events.len(), 1);
        assert_eq!(fx.order.lines()[0].quantity().get(), 3);
        assert_eq!(fx.order.grand_total(), dec!(297));
    }

    #[test]
    fn removing_a_line_recomputes_as_if_it_never_existed() {
        let mut fx = Fixture::created();
        let variant_a = test_variant_id();
        fx.add_line(variant_a, edit_a());
        fx.add_line(test_variant_id(), edit_b());
        fx.set_scenario_charges();
        assert_eq!(fx.order.grand_total(), dec!(330));

        fx.dispatch(PurchaseOrderCommand::RemoveLineItem(RemoveLineItem {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            variant_id: variant_a,
            occurred_at: test_time(),
        }));

        // subtotal 120, after discount 102, +5% tax, +15 shipping.
        assert_eq!(fx.order.totals().subtotal, dec!(120));
        assert_eq!(fx.order.grand_total(), dec!(122.1));
    }

    #[test]
    fn submit_requires_at_least_one_line() {
        let fx = Fixture::created();
        let cmd = PurchaseOrderCommand::SubmitPurchase(SubmitPurchase {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            occurred_at: test_time(),
        });
        let err = fx.order.handle(&cmd).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn submitted_purchase_rejects_further_edits() {
        let mut fx = Fixture::created();
        let variant_id = test_variant_id();
        fx.add_line(variant_id, edit_a());
        fx.submit();
        assert_eq!(fx.order.status(), PurchaseStatus::Pending);

        let cmd = PurchaseOrderCommand::AdjustQuantity(AdjustQuantity {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            variant_id,
            delta: 1,
            occurred_at: test_time(),
        });
        let err = fx.order.handle(&cmd).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn submit_snapshots_the_grand_total() {
        let mut fx = Fixture::created();
        fx.add_line(test_variant_id(), edit_a());
        fx.add_line(test_variant_id(), edit_b());
        fx.set_scenario_charges();

        let events = fx.dispatch(PurchaseOrderCommand::SubmitPurchase(SubmitPurchase {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            occurred_at: test_time(),
        }));
        match &events[0] {
            PurchaseOrderEvent::PurchaseSubmitted(e) => {
                assert_eq!(e.grand_total, dec!(330));
            }
            _ => panic!("Expected PurchaseSubmitted event"),
        }
    }

    #[test]
    fn cannot_pay_an_unsubmitted_purchase() {
        let mut fx = Fixture::created();
        fx.add_line(test_variant_id(), edit_a());

        let cmd = PurchaseOrderCommand::RegisterPayment(RegisterPayment {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            payment_method_id: test_payment_method_id(),
            amount: dec!(50),
            occurred_at: test_time(),
        });
        let err = fx.order.handle(&cmd).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg)
                if msg.contains("cannot register payment on an unsubmitted purchase") => {}
            _ => panic!("Expected InvariantViolation for paying a draft"),
        }
    }

    #[test]
    fn cannot_overpay_a_purchase() {
        let mut fx = Fixture::created();
        fx.add_line(test_variant_id(), edit_a());
        fx.submit();
        assert_eq!(fx.order.grand_total(), dec!(198));

        let cmd = PurchaseOrderCommand::RegisterPayment(RegisterPayment {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            payment_method_id: test_payment_method_id(),
            amount: dec!(198.01),
            occurred_at: test_time(),
        });
        let err = fx.order.handle(&cmd).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("cannot overpay purchase") => {}
            _ => panic!("Expected InvariantViolation for overpaying"),
        }
    }

    #[test]
    fn paying_to_the_grand_total_marks_the_purchase_paid() {
        let mut fx = Fixture::created();
        fx.add_line(test_variant_id(), edit_a());
        fx.submit();

        fx.dispatch(PurchaseOrderCommand::RegisterPayment(RegisterPayment {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            payment_method_id: test_payment_method_id(),
            amount: dec!(100),
            occurred_at: test_time(),
        }));
        assert_eq!(fx.order.paid_amount(), dec!(100));
        assert_eq!(fx.order.outstanding_amount(), dec!(98));
        assert_eq!(fx.order.status(), PurchaseStatus::Pending);

        fx.dispatch(PurchaseOrderCommand::RegisterPayment(RegisterPayment {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            payment_method_id: test_payment_method_id(),
            amount: dec!(98),
            occurred_at: test_time(),
        }));
        assert_eq!(fx.order.paid_amount(), dec!(198));
        assert_eq!(fx.order.outstanding_amount(), Decimal::ZERO);
        assert_eq!(fx.order.status(), PurchaseStatus::Paid);
    }

    #[test]
    fn wrong_branch_is_rejected() {
        let mut fx = Fixture::created();
        fx.add_line(test_variant_id(), edit_a());

        let cmd = PurchaseOrderCommand::SubmitPurchase(SubmitPurchase {
            branch_id: test_branch_id(),
            order_id: fx.order_id,
            occurred_at: test_time(),
        });
        let err = fx.order.handle(&cmd).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("branch mismatch") => {}
            _ => panic!("Expected InvariantViolation for branch mismatch"),
        }
    }

    #[test]
    fn version_increments_on_apply() {
        let mut fx = Fixture::created();
        assert_eq!(fx.order.version(), 1);
        fx.add_line(test_variant_id(), edit_a());
        assert_eq!(fx.order.version(), 2);
        fx.set_scenario_charges();
        assert_eq!(fx.order.version(), 3);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let fx = {
            let mut fx = Fixture::created();
            fx.add_line(test_variant_id(), edit_a());
            fx
        };
        let before = fx.order.clone();

        let cmd = PurchaseOrderCommand::SubmitPurchase(SubmitPurchase {
            branch_id: fx.branch_id,
            order_id: fx.order_id,
            occurred_at: test_time(),
        });
        let first = fx.order.handle(&cmd).unwrap();
        let second = fx.order.handle(&cmd).unwrap();

        assert_eq!(fx.order, before);
        assert_eq!(first, second);
    }
}
