//! Explicit event sink, replacing the global `wlc_system_signals` bus.
//!
//! `spec.md` §9 calls for re-architecting the global signal bus as a
//! message sink passed in at output construction. Each `Output` is
//! handed a `Box<dyn OutputEventSink>` at `Output::new`; nothing looks
//! the sink up through a global registry.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ids::{OutputId, SpaceId};

/// Events a single output emits to its owner over the lifetime of the
/// output (`spec.md` §6 "Event emissions").
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    /// `output.resolution(output, new_size)` on any resolution change.
    Resolution { output: OutputId, width: i32, height: i32 },
    /// `space.activated(space)` on focus change.
    SpaceActivated { output: OutputId, space: SpaceId },
    /// `OUTPUT_EVENT_REMOVE` on termination.
    Removed { output: OutputId },
}

/// Sink an output's events flow into. The host compositor implements
/// this to forward events onto whatever bus it actually uses (a Wayland
/// global, an mpsc channel, a test recorder, ...).
pub trait OutputEventSink {
    fn emit(&mut self, event: OutputEvent);
}

/// An in-memory sink that just appends events, for tests and for hosts
/// that want to drain events between event-loop ticks instead of
/// reacting to them inline.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<OutputEvent>,
}

impl OutputEventSink for RecordingSink {
    fn emit(&mut self, event: OutputEvent) {
        self.events.push(event);
    }
}

/// A `RecordingSink` whose event list is reachable through a cloned
/// handle after the sink itself has been boxed and moved into an
/// `Output` -- for tests that need to inspect what an output actually
/// emitted, not just its internal flags.
#[derive(Debug, Clone, Default)]
pub struct SharedRecordingSink(Rc<RefCell<Vec<OutputEvent>>>);

impl SharedRecordingSink {
    pub fn events(&self) -> Vec<OutputEvent> {
        self.0.borrow().clone()
    }
}

impl OutputEventSink for SharedRecordingSink {
    fn emit(&mut self, event: OutputEvent) {
        self.0.borrow_mut().push(event);
    }
}
