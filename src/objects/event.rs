//! Event handles and the event log
//!
//! Handles are minted from a GUID of the emitting address and are stored
//! inside that address's resources, so whoever later controls the address
//! keeps appending to the same stream.

use super::error::Result;
use super::guid::{Guid, GuidId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// An event payload
pub trait Event: Serialize + DeserializeOwned {
    /// Stable type name recorded next to each emitted payload
    const TYPE_TAG: &'static str;
}

/// Append-only stream of `E` events identified by a GUID
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct EventHandle<E> {
    /// Number of events emitted so far
    counter: u64,
    guid: Guid,
    #[serde(skip)]
    _event: PhantomData<fn() -> E>,
}

impl<E: Event> EventHandle<E> {
    pub(crate) fn new(guid: Guid) -> Self {
        Self {
            counter: 0,
            guid,
            _event: PhantomData,
        }
    }

    /// Encode `event` as the next entry of this stream
    pub(crate) fn record(&mut self, event: &E) -> Result<EmittedEvent> {
        let emitted = EmittedEvent {
            guid: self.guid.id(),
            sequence_number: self.counter,
            type_tag: E::TYPE_TAG.to_string(),
            data: bincode::serialize(event)?,
        };
        self.counter += 1;
        Ok(emitted)
    }
}

impl<E> EventHandle<E> {
    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn guid(&self) -> GuidId {
        self.guid.id()
    }
}

/// An event as written to the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedEvent {
    pub guid: GuidId,
    pub sequence_number: u64,
    pub type_tag: String,
    pub data: Vec<u8>,
}

impl EmittedEvent {
    /// Decode the payload; `None` if the event is of another type
    pub fn decode<E: Event>(&self) -> Option<E> {
        if self.type_tag != E::TYPE_TAG {
            return None;
        }
        bincode::deserialize(&self.data).ok()
    }
}

/// Event-log provider
pub trait EventLog {
    /// Append the events of one committed transaction
    fn append(&mut self, events: Vec<EmittedEvent>);

    /// All events of one stream in sequence order
    fn events_by_guid(&self, guid: &GuidId) -> Vec<EmittedEvent>;

    /// Total number of stored events
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory event log for testing
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    streams: BTreeMap<GuidId, Vec<EmittedEvent>>,
    total: usize,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded events of type `E` on one stream
    pub fn decoded<E: Event>(&self, guid: &GuidId) -> Vec<E> {
        self.streams
            .get(guid)
            .map(|events| events.iter().filter_map(|e| e.decode::<E>()).collect())
            .unwrap_or_default()
    }
}

impl EventLog for MemoryEventLog {
    fn append(&mut self, events: Vec<EmittedEvent>) {
        self.total += events.len();
        for event in events {
            self.streams.entry(event.guid).or_default().push(event);
        }
    }

    fn events_by_guid(&self, guid: &GuidId) -> Vec<EmittedEvent> {
        self.streams.get(guid).cloned().unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Address;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Ping {
        n: u64,
    }

    impl Event for Ping {
        const TYPE_TAG: &'static str = "test::Ping";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Pong;

    impl Event for Pong {
        const TYPE_TAG: &'static str = "test::Pong";
    }

    #[test]
    fn test_sequence_numbers_and_log() {
        let mut counter = 0;
        let guid = Guid::create(Address::from_u64(7), &mut counter);
        let mut handle = EventHandle::<Ping>::new(guid);
        let id = handle.guid();

        let first = handle.record(&Ping { n: 1 }).unwrap();
        let second = handle.record(&Ping { n: 2 }).unwrap();
        assert_eq!(first.sequence_number, 0);
        assert_eq!(second.sequence_number, 1);
        assert_eq!(handle.counter(), 2);

        let mut log = MemoryEventLog::new();
        log.append(vec![first, second]);

        assert_eq!(log.len(), 2);
        assert_eq!(log.decoded::<Ping>(&id), vec![Ping { n: 1 }, Ping { n: 2 }]);
        assert!(log.decoded::<Pong>(&id).is_empty());
    }

    #[test]
    fn test_handle_survives_storage() {
        let mut counter = 0;
        let guid = Guid::create(Address::from_u64(7), &mut counter);
        let mut handle = EventHandle::<Ping>::new(guid);
        handle.record(&Ping { n: 1 }).unwrap();

        let bytes = bincode::serialize(&handle).unwrap();
        let restored: EventHandle<Ping> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.counter(), 1);
        assert_eq!(restored.guid(), handle.guid());
    }
}
