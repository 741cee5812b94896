use serde::Serialize;

/// Default queue size.
pub const MAX_EVENTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    KeyDown,
    KeyUp,
    Mouse,
    Joystick,
    Quit,
}

/// Input event. The meaning of the data fields depends on the kind: a key
/// code for key events, buttons and motion deltas for mouse and joystick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Event {
    pub kind: EventKind,
    pub data1: i32,
    pub data2: i32,
    pub data3: i32,
}

impl Event {
    pub fn new(kind: EventKind, data1: i32) -> Self {
        Event {
            kind,
            data1,
            data2: 0,
            data3: 0,
        }
    }

    pub fn key_down(key: i32) -> Self {
        Event::new(EventKind::KeyDown, key)
    }

    pub fn key_up(key: i32) -> Self {
        Event::new(EventKind::KeyUp, key)
    }
}

/// Fixed-size ring of pending events. Positions are free-running counters
/// reduced with a mask, so the capacity is always a power of two. When the
/// ring is full a push replaces the oldest unread event.
#[derive(Debug, Clone)]
pub struct EventQueue {
    slots: Vec<Option<Event>>,
    mask: usize,
    head: usize,
    tail: usize,
    dropped: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        EventQueue::with_capacity(MAX_EVENTS)
    }
}

impl EventQueue {
    /// `capacity` is rounded up to the next power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        EventQueue {
            slots: vec![None; capacity],
            mask: capacity - 1,
            head: 0,
            tail: 0,
            dropped: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.head.wrapping_sub(self.tail)
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Events lost to overwrites since the queue was created.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn push(&mut self, event: Event) {
        if self.len() == self.capacity() {
            self.tail = self.tail.wrapping_add(1);
            self.dropped += 1;
            log::debug!("event queue full, dropped oldest event");
        }
        self.slots[self.head & self.mask] = Some(event);
        self.head = self.head.wrapping_add(1);
    }

    pub fn pop(&mut self) -> Option<Event> {
        if self.is_empty() {
            return None;
        }
        let event = self.slots[self.tail & self.mask].take();
        self.tail = self.tail.wrapping_add(1);
        event
    }

    /// Pending events in arrival order. Each yielded event is consumed.
    pub fn drain(&mut self) -> Drain<'_> {
        Drain { queue: self }
    }
}

pub struct Drain<'a> {
    queue: &'a mut EventQueue,
}

impl Iterator for Drain<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        self.queue.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.queue.len();
        (len, Some(len))
    }
}

/// Something that may claim an event.
pub trait Responder {
    /// Returns true when the event was consumed.
    fn respond(&mut self, event: &Event) -> bool;
}

/// Offers every pending event to `menu`, then to `game` when the menu leaves
/// it unclaimed. With `accepts_input` false nothing is drained. Returns the
/// number of events dispatched.
pub fn dispatch_events(
    queue: &mut EventQueue,
    accepts_input: bool,
    menu: &mut dyn Responder,
    game: &mut dyn Responder,
) -> usize {
    if !accepts_input {
        return 0;
    }
    let mut count = 0;
    for event in queue.drain() {
        if !menu.respond(&event) {
            game.respond(&event);
        }
        count += 1;
    }
    count
}
