//! `backstock-events` — event/command abstractions and in-process distribution.
//!
//! Pure mechanics: no storage, no transport beyond an in-memory bus.

pub mod branch;
pub mod bus;
pub mod command;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use branch::BranchScoped;
pub use bus::{EventBus, Subscription};
pub use command::Command;
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::{CommandHandler, execute};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
