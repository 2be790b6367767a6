/// An event stamped with its emission order.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<E> {
    pub seq: u64,
    pub payload: E,
}

/// FIFO of pending events.
///
/// Producers `emit`; the owner of the state the events act on `drain`s them
/// in order. Sequence numbers keep increasing across drains.
#[derive(Debug)]
pub struct EventBus<E> {
    events: Vec<Event<E>>,
    next_seq: u64,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, payload: E) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event { seq, payload });
        seq
    }

    pub fn events(&self) -> &[Event<E>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Event<E>> {
        std::mem::take(&mut self.events)
    }
}
