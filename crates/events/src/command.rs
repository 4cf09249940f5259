use backstock_core::AggregateId;

/// A command targets a specific aggregate (command abstraction).
///
/// Commands represent **intent** - a request to perform an action on an
/// aggregate. They are transient (not persisted) and are transformed into
/// events (which are the persisted facts). A command is rejected if invalid;
/// an event represents an accepted change.
///
/// Branch scoping is enforced at the **event level** (envelopes), not at the
/// command level: commands stay domain-focused while the enclosing layer
/// attaches the branch context during persistence/distribution.
pub trait Command: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn target_aggregate_id(&self) -> AggregateId;
}
