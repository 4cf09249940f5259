use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use backstock_core::{Aggregate, AggregateId, AggregateRoot, BranchId, DomainError};
use backstock_events::Event;

/// Supplier identifier (branch-scoped via `branch_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierId(pub AggregateId);

impl SupplierId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SupplierId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Supplier status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplierStatus {
    Active,
    Suspended,
}

/// Contact information for a supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Aggregate root: Supplier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supplier {
    id: SupplierId,
    branch_id: Option<BranchId>,
    name: String,
    contact: ContactInfo,
    status: SupplierStatus,
    version: u64,
    created: bool,
}

impl Supplier {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: SupplierId) -> Self {
        Self {
            id,
            branch_id: None,
            name: String::new(),
            contact: ContactInfo::default(),
            status: SupplierStatus::Active,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> SupplierId {
        self.id
    }

    pub fn branch_id(&self) -> Option<BranchId> {
        self.branch_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn status(&self) -> SupplierStatus {
        self.status
    }

    /// Invariant helper: suspended suppliers cannot receive new purchase orders.
    pub fn can_transact(&self) -> bool {
        self.status == SupplierStatus::Active
    }
}

impl AggregateRoot for Supplier {
    type Id = SupplierId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterSupplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSupplier {
    pub branch_id: BranchId,
    pub supplier_id: SupplierId,
    pub name: String,
    pub contact: Option<ContactInfo>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateContact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateContact {
    pub branch_id: BranchId,
    pub supplier_id: SupplierId,
    pub contact: ContactInfo,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SuspendSupplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendSupplier {
    pub branch_id: BranchId,
    pub supplier_id: SupplierId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReinstateSupplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReinstateSupplier {
    pub branch_id: BranchId,
    pub supplier_id: SupplierId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplierCommand {
    RegisterSupplier(RegisterSupplier),
    UpdateContact(UpdateContact),
    SuspendSupplier(SuspendSupplier),
    ReinstateSupplier(ReinstateSupplier),
}

/// Event: SupplierRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRegistered {
    pub branch_id: BranchId,
    pub supplier_id: SupplierId,
    pub name: String,
    pub contact: ContactInfo,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ContactUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactUpdated {
    pub branch_id: BranchId,
    pub supplier_id: SupplierId,
    pub contact: ContactInfo,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SupplierSuspended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierSuspended {
    pub branch_id: BranchId,
    pub supplier_id: SupplierId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SupplierReinstated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierReinstated {
    pub branch_id: BranchId,
    pub supplier_id: SupplierId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplierEvent {
    SupplierRegistered(SupplierRegistered),
    ContactUpdated(ContactUpdated),
    SupplierSuspended(SupplierSuspended),
    SupplierReinstated(SupplierReinstated),
}

impl Event for SupplierEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SupplierEvent::SupplierRegistered(_) => "suppliers.supplier.registered",
            SupplierEvent::ContactUpdated(_) => "suppliers.supplier.contact_updated",
            SupplierEvent::SupplierSuspended(_) => "suppliers.supplier.suspended",
            SupplierEvent::SupplierReinstated(_) => "suppliers.supplier.reinstated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SupplierEvent::SupplierRegistered(e) => e.occurred_at,
            SupplierEvent::ContactUpdated(e) => e.occurred_at,
            SupplierEvent::SupplierSuspended(e) => e.occurred_at,
            SupplierEvent::SupplierReinstated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Supplier {
    type Command = SupplierCommand;
    type Event = SupplierEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SupplierEvent::SupplierRegistered(e) => {
                self.id = e.supplier_id;
                self.branch_id = Some(e.branch_id);
                self.name = e.name.clone();
                self.contact = e.contact.clone();
                self.status = SupplierStatus::Active;
                self.created = true;
            }
            SupplierEvent::ContactUpdated(e) => {
                self.contact = e.contact.clone();
            }
            SupplierEvent::SupplierSuspended(_) => {
                self.status = SupplierStatus::Suspended;
            }
            SupplierEvent::SupplierReinstated(_) => {
                self.status = SupplierStatus::Active;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SupplierCommand::RegisterSupplier(cmd) => self.handle_register(cmd),
            SupplierCommand::UpdateContact(cmd) => self.handle_update_contact(cmd),
            SupplierCommand::SuspendSupplier(cmd) => self.handle_suspend(cmd),
            SupplierCommand::ReinstateSupplier(cmd) => self.handle_reinstate(cmd),
        }
    }
}

impl Supplier {
    fn ensure_branch(&self, branch_id: BranchId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.branch_id != Some(branch_id) {
            return Err(DomainError::invariant("branch mismatch"));
        }
        Ok(())
    }

    fn ensure_supplier_id(&self, supplier_id: SupplierId) -> Result<(), DomainError> {
        if self.id != supplier_id {
            return Err(DomainError::invariant("supplier_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterSupplier) -> Result<Vec<SupplierEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("supplier already exists"));
        }

        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(vec![SupplierEvent::SupplierRegistered(SupplierRegistered {
            branch_id: cmd.branch_id,
            supplier_id: cmd.supplier_id,
            name: cmd.name.clone(),
            contact: cmd.contact.clone().unwrap_or_default(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_contact(&self, cmd: &UpdateContact) -> Result<Vec<SupplierEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_supplier_id(cmd.supplier_id)?;

        Ok(vec![SupplierEvent::ContactUpdated(ContactUpdated {
            branch_id: cmd.branch_id,
            supplier_id: cmd.supplier_id,
            contact: cmd.contact.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_suspend(&self, cmd: &SuspendSupplier) -> Result<Vec<SupplierEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_supplier_id(cmd.supplier_id)?;

        if self.status == SupplierStatus::Suspended {
            return Err(DomainError::conflict("supplier is already suspended"));
        }

        Ok(vec![SupplierEvent::SupplierSuspended(SupplierSuspended {
            branch_id: cmd.branch_id,
            supplier_id: cmd.supplier_id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reinstate(&self, cmd: &ReinstateSupplier) -> Result<Vec<SupplierEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_supplier_id(cmd.supplier_id)?;

        if self.status == SupplierStatus::Active {
            return Err(DomainError::conflict("supplier is already active"));
        }

        Ok(vec![SupplierEvent::SupplierReinstated(SupplierReinstated {
            branch_id: cmd.branch_id,
            supplier_id: cmd.supplier_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
