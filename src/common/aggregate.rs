use crate::common::{DomainEvent, DomainResult};
use serde::{Deserialize, Serialize};

pub trait AggregateRoot: Send + Sync + Clone {
    type Event: DomainEvent + Serialize + for<'de> Deserialize<'de>;

    fn aggregate_id(&self) -> &str;
    fn version(&self) -> u64;

    /// Apply an event to update the aggregate state
    fn apply(&mut self, event: &Self::Event) -> DomainResult<()>;

    fn uncommitted_events(&self) -> &[Self::Event];

    fn mark_events_as_committed(&mut self);

    fn add_event(&mut self, event: Self::Event);
}

/// Rebuild an aggregate by replaying stored events on top of an initial state.
pub fn load_from_history<T: AggregateRoot>(mut aggregate: T, events: &[T::Event]) -> DomainResult<T> {
    for event in events {
        aggregate.apply(event)?;
    }
    aggregate.mark_events_as_committed();
    Ok(aggregate)
}
