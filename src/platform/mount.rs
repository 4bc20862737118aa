//! Stack mount lifecycle
//!
//! One [`StackMount`] per container. Mounting measures the cards, picks a
//! scroll source and wires resize, orientation and settle re-measurement.
//! Re-measurement is never a separate frame: it marks the engine stale and
//! the single render frame measures before computing transforms.
//! Every listener, frame request and timer it owns is released on
//! [`StackMount::unmount`] (or drop).

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, HtmlElement};

use super::PlatformError;
use super::dom::{DomLayout, DomSink, ScrollTarget, collect_cards, ensure_end_marker};
use super::events::{EventListener, cancel_frame, clear_timeout, request_frame, set_timeout};
use super::scroll::source_for;
use crate::consts::{COMPLETE_EVENT, SETTLE_DELAY_MS};
use crate::stack::{ScrollSnapshot, SourceKind, StackConfig, StackEngine, Subscription};

struct MountState {
    engine: RefCell<StackEngine>,
    root: HtmlElement,
    target: ScrollTarget,
    cards: Vec<HtmlElement>,
    end_marker: Option<HtmlElement>,
    render_frame: Cell<Option<i32>>,
    settle_timer: Cell<Option<i32>>,
    render_callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    settle_callback: RefCell<Option<Closure<dyn FnMut()>>>,
    listeners: RefCell<Vec<EventListener>>,
    subscription: RefCell<Option<Subscription>>,
}

impl MountState {
    /// Mark geometry stale; the next frame measures before it renders
    fn invalidate(&self) {
        self.engine.borrow_mut().invalidate_geometry();
        self.request_render();
    }

    fn on_scroll(&self, snapshot: ScrollSnapshot) {
        if self.engine.borrow_mut().notify_scroll(snapshot) {
            self.request_render();
        }
    }

    fn request_render(&self) {
        if self.render_frame.get().is_some() {
            return;
        }
        if let Some(callback) = self.render_callback.borrow().as_ref() {
            self.render_frame.set(request_frame(callback));
        }
    }

    fn render(&self) {
        self.render_frame.set(None);
        let layout = DomLayout {
            cards: &self.cards,
            end_marker: self.end_marker.as_ref(),
            target: &self.target,
        };
        let mut sink = DomSink { cards: &self.cards };

        let report = {
            let mut engine = self.engine.borrow_mut();
            if engine.needs_measure() {
                // Viewport height may have changed with the layout
                match self.target.snapshot() {
                    Some(snapshot) => {
                        engine.notify_scroll(snapshot);
                    }
                    None => log::warn!("No viewport to read the scroll position from"),
                }
            }
            engine.frame(&layout, &mut sink)
        };
        if report.completed {
            self.dispatch_complete();
        }
    }

    fn dispatch_complete(&self) {
        match CustomEvent::new(COMPLETE_EVENT) {
            Ok(event) => {
                let _ = self.root.dispatch_event(&event);
            }
            Err(e) => log::warn!("Could not create {COMPLETE_EVENT} event: {e:?}"),
        }
    }
}

/// A mounted scroll stack
pub struct StackMount {
    state: Option<Rc<MountState>>,
}

impl StackMount {
    /// Mount the engine on `root`.
    ///
    /// `on_complete` runs once each time the last card pins; it must not
    /// re-enter this mount.
    pub fn mount(
        root: HtmlElement,
        config: StackConfig,
        reduced_motion: bool,
        on_complete: Option<Box<dyn FnMut()>>,
    ) -> Result<Self, PlatformError> {
        let window = web_sys::window().ok_or(PlatformError::NoWindow)?;
        let document = window.document().ok_or(PlatformError::NoDocument)?;

        let cards = collect_cards(&root);
        let end_marker = ensure_end_marker(&document, &root);
        let target = ScrollTarget::new(config.use_window_scroll, &root);

        let mut engine = StackEngine::new(config).with_reduced_motion(reduced_motion);
        if let Some(callback) = on_complete {
            engine = engine.on_stack_complete(callback);
        }

        log::info!(
            "Mounting scroll stack: {} cards, {} scroll, reduced motion {}",
            cards.len(),
            if matches!(target, ScrollTarget::Window) { "window" } else { "container" },
            reduced_motion
        );

        let state = Rc::new(MountState {
            engine: RefCell::new(engine),
            root,
            target: target.clone(),
            cards,
            end_marker,
            render_frame: Cell::new(None),
            settle_timer: Cell::new(None),
            render_callback: RefCell::new(None),
            settle_callback: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            subscription: RefCell::new(None),
        });

        // Callbacks hold weak references so the mount can be dropped
        let weak = Rc::downgrade(&state);
        *state.render_callback.borrow_mut() = Some(Closure::new(with_state(&weak, |s, _: f64| {
            s.render()
        })));
        *state.settle_callback.borrow_mut() = Some(Closure::new({
            let weak = weak.clone();
            move || {
                if let Some(s) = weak.upgrade() {
                    s.settle_timer.set(None);
                    log::debug!("Settle re-measurement");
                    s.invalidate();
                }
            }
        }));

        let window_target: web_sys::EventTarget = window.into();
        for kind in ["resize", "orientationchange"] {
            let weak = weak.clone();
            state
                .listeners
                .borrow_mut()
                .push(EventListener::new(&window_target, kind, true, move |_| {
                    if let Some(s) = weak.upgrade() {
                        s.invalidate();
                    }
                }));
        }

        let mut source = source_for(SourceKind::select(reduced_motion), target);
        let subscription = source.subscribe(Box::new({
            let weak = weak.clone();
            move |snapshot| {
                if let Some(s) = weak.upgrade() {
                    s.on_scroll(snapshot);
                }
            }
        }));
        *state.subscription.borrow_mut() = Some(subscription);

        state.invalidate();
        if let Some(callback) = state.settle_callback.borrow().as_ref() {
            state.settle_timer.set(set_timeout(callback, SETTLE_DELAY_MS));
        }

        Ok(Self { state: Some(state) })
    }

    /// Stop listening, cancel pending work and clear the engine's caches
    pub fn unmount(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        if let Some(subscription) = state.subscription.borrow_mut().take() {
            subscription.cancel();
        }
        state.listeners.borrow_mut().clear();
        if let Some(id) = state.render_frame.take() {
            cancel_frame(id);
        }
        if let Some(id) = state.settle_timer.take() {
            clear_timeout(id);
        }
        state.render_callback.borrow_mut().take();
        state.settle_callback.borrow_mut().take();
        state.engine.borrow_mut().teardown();
        log::info!("Scroll stack unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.state.is_some()
    }
}

impl Drop for StackMount {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn with_state<A>(
    weak: &Weak<MountState>,
    f: impl Fn(&MountState, A) + 'static,
) -> impl FnMut(A) + 'static
where
    A: 'static,
{
    let weak = weak.clone();
    move |arg| {
        if let Some(state) = weak.upgrade() {
            f(&state, arg);
        }
    }
}
