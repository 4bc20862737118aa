//! DOM layout probe and style sink

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, EventTarget, HtmlElement};

use crate::consts::{CARD_CLASS, END_MARKER_CLASS, INNER_CLASS};
use crate::stack::{BaselineStyle, CardSink, LayoutProbe, ScrollSnapshot, TransformState};

/// Which element's scroll position drives the stack
#[derive(Debug, Clone)]
pub enum ScrollTarget {
    Window,
    Container(HtmlElement),
}

impl ScrollTarget {
    pub fn new(use_window_scroll: bool, container: &HtmlElement) -> Self {
        if use_window_scroll {
            ScrollTarget::Window
        } else {
            ScrollTarget::Container(container.clone())
        }
    }

    /// Current scroll position; `None` outside a browser
    pub fn snapshot(&self) -> Option<ScrollSnapshot> {
        match self {
            ScrollTarget::Window => {
                let window = web_sys::window()?;
                let scroll_top = window.scroll_y().ok()?;
                let height = window.inner_height().ok()?.as_f64()?;
                Some(ScrollSnapshot::new(scroll_top, height))
            }
            ScrollTarget::Container(el) => Some(ScrollSnapshot::new(
                el.scroll_top() as f64,
                el.client_height() as f64,
            )),
        }
    }

    /// Largest reachable scroll offset
    pub fn max_scroll(&self) -> f64 {
        match self {
            ScrollTarget::Window => {
                let Some(window) = web_sys::window() else {
                    return 0.0;
                };
                let height = window
                    .inner_height()
                    .ok()
                    .and_then(|h| h.as_f64())
                    .unwrap_or(0.0);
                let content = window
                    .document()
                    .and_then(|d| d.document_element())
                    .map(|e| e.scroll_height() as f64)
                    .unwrap_or(0.0);
                (content - height).max(0.0)
            }
            ScrollTarget::Container(el) => {
                (el.scroll_height() as f64 - el.client_height() as f64).max(0.0)
            }
        }
    }

    pub fn scroll_to(&self, top: f64) {
        match self {
            ScrollTarget::Window => {
                if let Some(window) = web_sys::window() {
                    window.scroll_to_with_x_and_y(0.0, top);
                }
            }
            ScrollTarget::Container(el) => el.set_scroll_top(top.round() as i32),
        }
    }

    /// Where `scroll`, `wheel` and `touch*` events arrive
    pub fn event_target(&self) -> Option<EventTarget> {
        match self {
            ScrollTarget::Window => web_sys::window().map(Into::into),
            ScrollTarget::Container(el) => Some(el.clone().into()),
        }
    }
}

/// Card elements under `root`, in document order
pub fn collect_cards(root: &Element) -> Vec<HtmlElement> {
    let Ok(list) = root.query_selector_all(&format!(".{CARD_CLASS}")) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
        .collect()
}

/// Find the end-of-stack sentinel, appending one after the last card if absent
pub fn ensure_end_marker(document: &Document, root: &Element) -> Option<HtmlElement> {
    if let Ok(Some(existing)) = root.query_selector(&format!(".{END_MARKER_CLASS}")) {
        return existing.dyn_into::<HtmlElement>().ok();
    }

    let parent = root
        .query_selector(&format!(".{INNER_CLASS}"))
        .ok()
        .flatten()
        .unwrap_or_else(|| root.clone());

    let marker = document.create_element("div").ok()?;
    marker.set_class_name(END_MARKER_CLASS);
    if let Err(e) = parent.append_child(&marker) {
        log::warn!("Could not append scroll stack end marker: {e:?}");
        return None;
    }
    marker.dyn_into::<HtmlElement>().ok()
}

/// Layout offset of `el` in document space.
///
/// Walks the offset-parent chain, which reports untransformed layout
/// positions, so it is safe to call while cards are translated.
pub fn document_offset(el: &HtmlElement) -> f64 {
    let mut top = 0.0;
    let mut node = Some(el.clone());
    while let Some(current) = node {
        top += current.offset_top() as f64;
        node = current
            .offset_parent()
            .and_then(|parent| parent.dyn_into::<HtmlElement>().ok());
    }
    top
}

/// Reads card offsets for the engine
pub struct DomLayout<'a> {
    pub cards: &'a [HtmlElement],
    pub end_marker: Option<&'a HtmlElement>,
    pub target: &'a ScrollTarget,
}

impl DomLayout<'_> {
    fn offset(&self, el: &HtmlElement) -> f64 {
        match self.target {
            ScrollTarget::Window => document_offset(el),
            ScrollTarget::Container(_) => el.offset_top() as f64,
        }
    }
}

impl LayoutProbe for DomLayout<'_> {
    fn card_offsets(&self) -> Vec<f64> {
        self.cards.iter().map(|card| self.offset(card)).collect()
    }

    fn end_marker_offset(&self) -> Option<f64> {
        self.end_marker.map(|marker| self.offset(marker))
    }
}

/// Writes inline styles on card elements
pub struct DomSink<'a> {
    pub cards: &'a [HtmlElement],
}

impl CardSink for DomSink<'_> {
    fn apply_baseline(&mut self, index: usize, style: &BaselineStyle) {
        let Some(card) = self.cards.get(index) else {
            return;
        };
        let css = card.style();
        for (property, value) in &style.properties {
            let _ = css.set_property(property, value);
        }
    }

    fn apply(&mut self, index: usize, state: &TransformState) {
        let Some(card) = self.cards.get(index) else {
            return;
        };
        let css = card.style();
        let _ = css.set_property("transform", &state.css_transform());
        let filter = state.css_filter();
        if filter.is_empty() {
            let _ = css.remove_property("filter");
        } else {
            let _ = css.set_property("filter", &filter);
        }
    }

    fn reset(&mut self, index: usize) {
        let Some(card) = self.cards.get(index) else {
            return;
        };
        let css = card.style();
        let _ = css.set_property("transform", "none");
        let _ = css.remove_property("filter");
    }
}
