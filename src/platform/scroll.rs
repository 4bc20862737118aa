//! Browser scroll sources
//!
//! [`NativeScroll`] forwards the target's own `scroll` events.
//! [`MomentumScroll`] takes over wheel and touch input, eases the position
//! on its own animation-frame loop and emits every interpolated value.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{TouchEvent, WheelEvent};

use super::dom::ScrollTarget;
use super::events::{EventListener, cancel_frame, request_frame};
use crate::stack::{
    Momentum, MomentumConfig, ScrollListener, ScrollSource, SourceKind, Subscription,
};

/// Pick the source for an engine
pub fn source_for(kind: SourceKind, target: ScrollTarget) -> Box<dyn ScrollSource> {
    match kind {
        SourceKind::Native => Box::new(NativeScroll::new(target)),
        SourceKind::Momentum => Box::new(MomentumScroll::new(target, MomentumConfig::default())),
    }
}

/// Native `scroll` events, used when motion is reduced
pub struct NativeScroll {
    target: ScrollTarget,
}

impl NativeScroll {
    pub fn new(target: ScrollTarget) -> Self {
        Self { target }
    }
}

impl ScrollSource for NativeScroll {
    fn subscribe(&mut self, mut listener: ScrollListener) -> Subscription {
        let Some(event_target) = self.target.event_target() else {
            return Subscription::empty();
        };
        let target = self.target.clone();
        let scroll = EventListener::new(&event_target, "scroll", true, move |_| {
            if let Some(snapshot) = target.snapshot() {
                listener(snapshot);
            }
        });
        Subscription::new(move || drop(scroll))
    }
}

/// Smoothed wheel/touch scrolling with its own frame loop
pub struct MomentumScroll {
    target: ScrollTarget,
    config: MomentumConfig,
}

impl MomentumScroll {
    pub fn new(target: ScrollTarget, config: MomentumConfig) -> Self {
        Self { target, config }
    }
}

type FrameLoop = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

impl ScrollSource for MomentumScroll {
    fn subscribe(&mut self, listener: ScrollListener) -> Subscription {
        let Some(event_target) = self.target.event_target() else {
            return Subscription::empty();
        };

        let start = self.target.snapshot().map(|s| s.scroll_top).unwrap_or(0.0);
        let momentum = Rc::new(RefCell::new(Momentum::new(
            self.config,
            start,
            self.target.max_scroll(),
        )));
        let listener = Rc::new(RefCell::new(listener));
        let last_touch_y = Rc::new(Cell::new(None::<f64>));
        let frame_id = Rc::new(Cell::new(None::<i32>));

        let wheel = {
            let momentum = Rc::clone(&momentum);
            let target = self.target.clone();
            EventListener::new(&event_target, "wheel", false, move |event| {
                let Some(wheel) = event.dyn_ref::<WheelEvent>() else {
                    return;
                };
                if wheel.ctrl_key() {
                    // Pinch zoom
                    return;
                }
                event.prevent_default();
                let mut m = momentum.borrow_mut();
                m.set_limit(target.max_scroll());
                m.wheel(wheel.delta_y());
            })
        };

        let touch_start = {
            let last_touch_y = Rc::clone(&last_touch_y);
            EventListener::new(&event_target, "touchstart", true, move |event| {
                let y = event
                    .dyn_ref::<TouchEvent>()
                    .and_then(|t| t.touches().get(0))
                    .map(|touch| touch.client_y() as f64);
                last_touch_y.set(y);
            })
        };

        let touch_move = {
            let momentum = Rc::clone(&momentum);
            let last_touch_y = Rc::clone(&last_touch_y);
            let target = self.target.clone();
            EventListener::new(&event_target, "touchmove", false, move |event| {
                let Some(y) = event
                    .dyn_ref::<TouchEvent>()
                    .and_then(|t| t.touches().get(0))
                    .map(|touch| touch.client_y() as f64)
                else {
                    return;
                };
                if let Some(previous) = last_touch_y.replace(Some(y)) {
                    event.prevent_default();
                    let mut m = momentum.borrow_mut();
                    m.set_limit(target.max_scroll());
                    m.touch(previous - y);
                }
            })
        };

        // Scrollbar drags and keyboard scrolling bypass the wheel handler
        let native = {
            let momentum = Rc::clone(&momentum);
            let listener = Rc::clone(&listener);
            let target = self.target.clone();
            EventListener::new(&event_target, "scroll", true, move |_| {
                let Some(snapshot) = target.snapshot() else {
                    return;
                };
                momentum.borrow_mut().observe(snapshot.scroll_top);
                let mut emit = listener.borrow_mut();
                (*emit)(snapshot);
            })
        };

        let frame_loop: FrameLoop = Rc::new(RefCell::new(None));
        {
            let momentum = Rc::clone(&momentum);
            let listener = Rc::clone(&listener);
            let target = self.target.clone();
            let frame_id = Rc::clone(&frame_id);
            let reschedule = Rc::clone(&frame_loop);
            *frame_loop.borrow_mut() = Some(Closure::new(move |_time: f64| {
                let moved = momentum.borrow_mut().step();
                if let Some(top) = moved {
                    target.scroll_to(top);
                    // Emit where the page landed; containers round to whole pixels
                    if let Some(snapshot) = target.snapshot() {
                        momentum.borrow_mut().observe(snapshot.scroll_top);
                        let mut emit = listener.borrow_mut();
                        (*emit)(snapshot);
                    }
                }
                if let Some(callback) = reschedule.borrow().as_ref() {
                    frame_id.set(request_frame(callback));
                }
            }));
        }
        if let Some(callback) = frame_loop.borrow().as_ref() {
            frame_id.set(request_frame(callback));
        }

        log::debug!("Momentum scrolling started at {start:.1}");

        Subscription::new(move || {
            if let Some(id) = frame_id.take() {
                cancel_frame(id);
            }
            // Breaks the closure's reference to itself
            frame_loop.borrow_mut().take();
            drop((wheel, touch_start, touch_move, native));
            log::debug!("Momentum scrolling disposed");
        })
    }
}
