use crate::{Command, Event};

/// Handles a command and emits events (command handler abstraction).
///
/// A standalone interface for command → events transformation, independent of
/// the aggregate lifecycle. Useful for workers, tests, and handlers that do
/// not use the full aggregate machinery. Errors are domain-specific, so the
/// error type is associated.
pub trait CommandHandler {
    type Cmd: Command;
    type Ev: Event;
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn handle(&self, command: Self::Cmd) -> Result<Vec<Self::Ev>, Self::Error>;
}

/// Execute an aggregate command deterministically (no IO, no async).
///
/// The canonical event-sourced lifecycle in one step:
///
/// 1. **Decide**: `aggregate.handle(command)` returns events (pure, no mutation).
/// 2. **Evolve**: each event is applied via `aggregate.apply(event)`.
///
/// The aggregate maintains its own version tracking during `apply()`
/// (typically +1 per event). This mutates the aggregate in place; callers
/// that need persistence or publication wrap this with their own pipeline.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: backstock_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
