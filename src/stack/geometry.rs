//! Card geometry measurement
//!
//! Measurement is a full replacement: every pass rebuilds the offsets from
//! the probe and never merges with the previous result.

use serde::{Deserialize, Serialize};

use super::config::StackConfig;

/// Scroll state read once per animation frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollSnapshot {
    pub scroll_top: f64,
    pub viewport_height: f64,
}

impl ScrollSnapshot {
    pub fn new(scroll_top: f64, viewport_height: f64) -> Self {
        Self {
            scroll_top,
            viewport_height,
        }
    }
}

/// Source of untransformed layout positions.
///
/// Offsets are document-space for window scrolling and container-space for
/// local scrolling; either way they must ignore any transform currently
/// applied to a card.
pub trait LayoutProbe {
    /// Top offset of every card, in document order
    fn card_offsets(&self) -> Vec<f64>;

    /// Top offset of the end-of-stack sentinel, if present
    fn end_marker_offset(&self) -> Option<f64>;
}

/// Cached measurement result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    /// `cardTop` per card index
    pub card_tops: Vec<f64>,
    /// Sentinel offset; `None` means cards never release their pin
    pub end_top: Option<f64>,
}

impl Geometry {
    /// Measure from a probe, discarding non-finite offsets as absent
    pub fn measure(probe: &impl LayoutProbe) -> Self {
        let card_tops = probe
            .card_offsets()
            .into_iter()
            .map(|top| if top.is_finite() { top } else { 0.0 })
            .collect();
        let end_top = probe.end_marker_offset().filter(|top| top.is_finite());

        Self { card_tops, end_top }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.card_tops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.card_tops.is_empty()
    }

    /// Scroll offset past which pinned cards freeze in place
    pub fn pin_end(&self, viewport_height: f64) -> f64 {
        match self.end_top {
            Some(top) => top - viewport_height / 2.0,
            None => f64::INFINITY,
        }
    }
}

/// Static (non-animated) style a card receives on every measurement pass
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineStyle {
    pub properties: Vec<(&'static str, String)>,
}

/// Baseline compositing hints for the card at `index` out of `count`.
///
/// Never touches `transform` or `filter`; those belong to the frame step.
pub fn baseline_style(index: usize, count: usize, config: &StackConfig) -> BaselineStyle {
    let mut properties = vec![
        ("will-change", "transform, filter".to_string()),
        ("transform-origin", "top center".to_string()),
        ("backface-visibility", "hidden".to_string()),
        ("perspective", "1000px".to_string()),
    ];
    if index + 1 < count {
        properties.push(("margin-bottom", format!("{}px", config.item_distance)));
    }
    BaselineStyle { properties }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLayout {
        cards: Vec<f64>,
        end: Option<f64>,
    }

    impl LayoutProbe for FixedLayout {
        fn card_offsets(&self) -> Vec<f64> {
            self.cards.clone()
        }

        fn end_marker_offset(&self) -> Option<f64> {
            self.end
        }
    }

    #[test]
    fn test_measure_is_idempotent() {
        let layout = FixedLayout {
            cards: vec![1000.0, 1500.0, 2000.0],
            end: Some(3000.0),
        };
        let first = Geometry::measure(&layout);
        let second = Geometry::measure(&layout);
        assert_eq!(first, second);
        assert_eq!(first.card_tops, vec![1000.0, 1500.0, 2000.0]);
    }

    #[test]
    fn test_measure_replaces_previous() {
        let before = Geometry::measure(&FixedLayout {
            cards: vec![1.0, 2.0, 3.0],
            end: None,
        });
        assert_eq!(before.len(), 3);
        let geometry = Geometry::measure(&FixedLayout {
            cards: vec![10.0],
            end: Some(50.0),
        });
        assert_eq!(geometry.card_tops, vec![10.0]);
        assert_eq!(geometry.end_top, Some(50.0));
    }

    #[test]
    fn test_missing_sentinel_never_releases() {
        let geometry = Geometry {
            card_tops: vec![0.0],
            end_top: None,
        };
        assert_eq!(geometry.pin_end(800.0), f64::INFINITY);

        let geometry = Geometry {
            card_tops: vec![0.0],
            end_top: Some(3000.0),
        };
        assert_eq!(geometry.pin_end(800.0), 2600.0);
    }

    #[test]
    fn test_non_finite_offsets_sanitized() {
        let geometry = Geometry::measure(&FixedLayout {
            cards: vec![f64::NAN, 20.0],
            end: Some(f64::INFINITY),
        });
        assert_eq!(geometry.card_tops, vec![0.0, 20.0]);
        assert_eq!(geometry.end_top, None);
    }

    #[test]
    fn test_baseline_margin_skips_last_card() {
        let config = StackConfig::default();
        let first = baseline_style(0, 3, &config);
        let last = baseline_style(2, 3, &config);
        assert!(first
            .properties
            .iter()
            .any(|(k, v)| *k == "margin-bottom" && v == "100px"));
        assert!(!last.properties.iter().any(|(k, _)| *k == "margin-bottom"));
        assert!(!first.properties.iter().any(|(k, _)| *k == "transform" || *k == "filter"));
    }
}
