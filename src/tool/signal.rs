use std::fmt;

use serde::Serialize;

/// Step total a preview update reports progress against.
pub const PREVIEW_PROGRESS_STEPS: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

/// Synchronous multicast notification.
///
/// Handlers run on the sending thread in connection order.
pub struct Signal<T> {
    handlers: Vec<(ConnectionId, Box<dyn Fn(&T)>)>,
    next_id: u64,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, handler: impl Fn(&T) + 'static) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        before != self.handlers.len()
    }

    pub fn send(&self, value: &T) {
        for (_, handler) in &self.handlers {
            handler(value);
        }
    }

    pub fn connection_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Bounded progress counter of a running update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    steps_to_do: u32,
    done: u32,
}

impl Progress {
    pub fn restart(&mut self, steps_to_do: u32) {
        self.steps_to_do = steps_to_do;
        self.done = 0;
    }

    /// Advances by `steps`, saturating at the total.
    pub fn advance(&mut self, steps: u32) {
        self.done = self.done.saturating_add(steps).min(self.steps_to_do);
    }

    pub fn complete(&mut self) {
        self.done = self.steps_to_do;
    }

    pub fn done(&self) -> u32 {
        self.done
    }

    pub fn steps_to_do(&self) -> u32 {
        self.steps_to_do
    }

    pub fn remaining(&self) -> u32 {
        self.steps_to_do - self.done
    }

    pub fn is_complete(&self) -> bool {
        self.done == self.steps_to_do
    }
}
