//! Event handlers that remember what the driver asked of them.

use std::sync::Mutex;

use glam::{DVec2, DVec3};
use pointplane::{EventHandler, Remainder, Side, SideCrossing, TransferOutcome, Triangle};

/// One call made into a handler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// A free-flying point struck a triangle at `intersection`.
    Hit {
        /// Local coordinate struck.
        intersection: DVec2,
    },
    /// A tracked point reached an unlinked edge.
    AbsentLink {
        /// Edge reached.
        side: Side,
    },
    /// A tracked point reached a linked edge.
    Transfer {
        /// Edge reached.
        side: Side,
    },
}

/// Delegates to `inner` and logs every call.
///
/// # Examples
/// ```
/// use pointplane::AbsorbingHandler;
/// use test_utils::handlers::RecordingHandler;
/// let handler = RecordingHandler::new(AbsorbingHandler);
/// assert!(handler.events().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct RecordingHandler<H> {
    inner: H,
    events: Mutex<Vec<Event>>,
}

impl<H> RecordingHandler<H> {
    /// Wrap `inner`.
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Events seen so far, oldest first.
    ///
    /// # Panics
    /// Panics if another thread panicked while recording.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("event log poisoned").clone()
    }

    fn record(&self, event: Event) {
        self.events.lock().expect("event log poisoned").push(event);
    }
}

impl<H: EventHandler> EventHandler for RecordingHandler<H> {
    fn on_triangle_hit(
        &self,
        triangle: &Triangle,
        limit: DVec3,
        intersection: DVec2,
        target: DVec3,
    ) -> Remainder {
        self.record(Event::Hit { intersection });
        self.inner
            .on_triangle_hit(triangle, limit, intersection, target)
    }

    fn on_transfer_absent_link(
        &self,
        triangle: &Triangle,
        crossing: &SideCrossing,
        target: DVec3,
    ) -> Remainder {
        self.record(Event::AbsentLink {
            side: crossing.side,
        });
        self.inner.on_transfer_absent_link(triangle, crossing, target)
    }

    fn on_transfer(
        &self,
        from: &Triangle,
        crossing: &SideCrossing,
        to: &Triangle,
        target: DVec3,
    ) -> TransferOutcome {
        self.record(Event::Transfer {
            side: crossing.side,
        });
        self.inner.on_transfer(from, crossing, to, target)
    }
}
