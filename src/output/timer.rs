//! Wiring an `Output`'s repaint schedule onto a host's shared
//! `calloop` event loop (`spec.md` §6 "Inbound from compositor core:
//! event_loop()").
//!
//! The 1ms-floor coalescing the scheduler wants for a burst of
//! `schedule_repaint` calls is exactly `calloop`'s idle-source
//! semantics; re-arming afterward at the adaptive `idle_interval_ms`
//! is an ordinary repeating timer. This mirrors the immediate-idle /
//! re-armed-timer split used for redraw scheduling in other
//! calloop-based compositors.
//!
//! `Output` owns no timer of its own -- it is event-loop agnostic by
//! design (`spec.md` §1 keeps the wire protocol dispatcher, and by
//! extension its event loop, out of this crate's scope). A host wires
//! these two functions to an output's own scheduler methods itself,
//! typically from the same place it calls `repaint`/`finish_frame`:
//!
//! ```ignore
//! queue_immediate_repaint(&handle, move |state| {
//!     let output = state.output_mut(id).unwrap();
//!     if output.repaint(now_ms()) {
//!         arm_repaint_timer(&handle, output.idle_interval_ms(), move |state| {
//!             let output = state.output_mut(id).unwrap();
//!             output.repaint(now_ms());
//!             output.scheduled().then(|| output.idle_interval_ms())
//!         });
//!     }
//! });
//! ```
//!
//! `schedule_repaint`'s coalescing already guarantees a burst of calls
//! before the idle source fires collapses into the single `on_fire`
//! above; this module just gets that single call onto the loop.

use std::time::Duration;

use calloop::timer::{TimeoutAction, Timer};
use calloop::{LoopHandle, RegistrationToken};

/// Registers a repeating timer that calls `on_fire` every time it
/// elapses. `on_fire` returns the next interval to wait, in
/// milliseconds, or `None` to stop re-arming (the caller re-registers
/// later via a fresh call once something schedules a repaint again).
pub fn arm_repaint_timer<Data, F>(
    loop_handle: &LoopHandle<'static, Data>,
    initial_interval_ms: f32,
    mut on_fire: F,
) -> RegistrationToken
where
    F: FnMut(&mut Data) -> Option<f32> + 'static,
{
    let timer = Timer::from_duration(Duration::from_secs_f32(initial_interval_ms.max(0.0) / 1000.0));
    loop_handle
        .insert_source(timer, move |_deadline, _metadata, data| match on_fire(data) {
            Some(next_ms) => TimeoutAction::ToDuration(Duration::from_secs_f32(next_ms.max(0.0) / 1000.0)),
            None => TimeoutAction::Drop,
        })
        .expect("failed to register output repaint timer")
}

/// Schedules a single, immediate repaint on the next event loop
/// iteration -- the coalescing entry point for a burst of
/// `schedule_repaint` calls arriving within the same tick.
pub fn queue_immediate_repaint<Data, F>(loop_handle: &LoopHandle<'static, Data>, on_fire: F)
where
    F: FnOnce(&mut Data) + 'static,
{
    loop_handle.insert_idle(on_fire);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn queue_immediate_repaint_runs_once_on_next_dispatch() {
        let mut event_loop: calloop::EventLoop<'static, Rc<Cell<u32>>> = calloop::EventLoop::try_new().unwrap();
        let counter = Rc::new(Cell::new(0));
        let mut data = counter.clone();

        for _ in 0..5 {
            queue_immediate_repaint(&event_loop.handle(), |c: &mut Rc<Cell<u32>>| c.set(c.get() + 1));
        }

        event_loop.dispatch(Some(Duration::from_millis(0)), &mut data).unwrap();
        assert_eq!(counter.get(), 5);

        // Nothing left queued; a second dispatch does not re-fire.
        event_loop.dispatch(Some(Duration::from_millis(0)), &mut data).unwrap();
        assert_eq!(counter.get(), 5);
    }

    #[test]
    fn arm_repaint_timer_fires_and_can_stop_rearming() {
        let mut event_loop: calloop::EventLoop<'static, Rc<Cell<u32>>> = calloop::EventLoop::try_new().unwrap();
        let fires = Rc::new(Cell::new(0));
        let handle = event_loop.handle();

        arm_repaint_timer(&handle, 0.0, move |c: &mut Rc<Cell<u32>>| {
            c.set(c.get() + 1);
            if c.get() < 3 {
                Some(0.0)
            } else {
                None
            }
        });

        let mut data = fires.clone();
        for _ in 0..3 {
            event_loop.dispatch(Some(Duration::from_millis(50)), &mut data).unwrap();
        }
        assert_eq!(fires.get(), 3);
    }
}
