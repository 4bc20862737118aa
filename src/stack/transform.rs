//! Per-frame transform computation
//!
//! Pure functions of `(cardTop, index, ScrollSnapshot, StackConfig)`. Nothing
//! here touches the DOM; the engine hands results to a [`CardSink`].
//!
//! [`CardSink`]: super::engine::CardSink

use serde::{Deserialize, Serialize};

use super::config::StackConfig;
use super::geometry::{Geometry, ScrollSnapshot};
use crate::consts::*;

/// Rendered visual state of one card
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    pub translate_y: f64,
    pub scale: f64,
    /// Degrees
    pub rotation: f64,
    /// Pixels
    pub blur: f64,
}

impl TransformState {
    pub const IDENTITY: TransformState = TransformState {
        translate_y: 0.0,
        scale: 1.0,
        rotation: 0.0,
        blur: 0.0,
    };

    /// Round to the precision written into styles
    pub fn rounded(self) -> Self {
        Self {
            translate_y: round_to(self.translate_y, 2),
            scale: round_to(self.scale, 3),
            rotation: round_to(self.rotation, 2),
            blur: round_to(self.blur, 2),
        }
    }

    /// Whether the difference to `other` is large enough to be visible
    pub fn differs_from(&self, other: &TransformState) -> bool {
        (self.translate_y - other.translate_y).abs() > TRANSLATE_EPSILON
            || (self.scale - other.scale).abs() > SCALE_EPSILON
            || (self.rotation - other.rotation).abs() > ROTATION_EPSILON
            || (self.blur - other.blur).abs() > BLUR_EPSILON
    }

    /// CSS `transform` value
    pub fn css_transform(&self) -> String {
        format!(
            "translate3d(0, {}px, 0) scale({}) rotate({}deg)",
            self.translate_y, self.scale, self.rotation
        )
    }

    /// CSS `filter` value (empty when unblurred)
    pub fn css_filter(&self) -> String {
        if self.blur > 0.0 {
            format!("blur({}px)", self.blur)
        } else {
            String::new()
        }
    }
}

impl Default for TransformState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Where a card is along the scroll axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardPhase {
    /// Still in normal flow
    Before,
    /// Held at the stack position
    Pinned,
    /// Past the end of the stacking region; translation frozen
    Released,
}

/// Scroll thresholds for one card
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerPoints {
    pub trigger_start: f64,
    pub trigger_end: f64,
    pub pin_start: f64,
    pub pin_end: f64,
}

/// Per-frame values shared by every card
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub scroll_top: f64,
    pub stack_position_px: f64,
    pub scale_end_position_px: f64,
    pub pin_end: f64,
}

impl FrameContext {
    pub fn new(snapshot: ScrollSnapshot, geometry: &Geometry, config: &StackConfig) -> Self {
        let height = snapshot.viewport_height;
        Self {
            scroll_top: snapshot.scroll_top,
            stack_position_px: config.stack_position.to_px(height),
            scale_end_position_px: config.scale_end_position.to_px(height),
            pin_end: geometry.pin_end(height),
        }
    }

    /// Thresholds for the card at `index` whose layout top is `card_top`
    pub fn trigger_points(&self, card_top: f64, index: usize, config: &StackConfig) -> TriggerPoints {
        let trigger_start = card_top - self.stack_position_px - config.stack_offset(index);
        TriggerPoints {
            trigger_start,
            trigger_end: card_top - self.scale_end_position_px,
            pin_start: trigger_start,
            pin_end: self.pin_end,
        }
    }
}

/// Computed transform plus diagnostics for one card
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardFrame {
    pub index: usize,
    pub phase: CardPhase,
    pub progress: f64,
    pub state: TransformState,
}

/// Scale-transition progress, always within `[0, 1]`.
///
/// A degenerate range (`start == end`) is a step at `start`.
pub fn progress(scroll_top: f64, start: f64, end: f64) -> f64 {
    if scroll_top < start {
        0.0
    } else if scroll_top > end || end == start {
        1.0
    } else {
        ((scroll_top - start) / (end - start)).clamp(0.0, 1.0)
    }
}

/// Index of the most recently pinned card (0 when none has triggered)
pub fn top_card_index(ctx: &FrameContext, geometry: &Geometry, config: &StackConfig) -> usize {
    geometry
        .card_tops
        .iter()
        .enumerate()
        .filter(|(i, top)| ctx.scroll_top >= ctx.trigger_points(**top, *i, config).trigger_start)
        .map(|(i, _)| i)
        .last()
        .unwrap_or(0)
}

/// Compute the transform of one card
pub fn compute_card(
    card_top: f64,
    index: usize,
    top_card: usize,
    ctx: &FrameContext,
    config: &StackConfig,
) -> CardFrame {
    let points = ctx.trigger_points(card_top, index, config);
    let scroll = ctx.scroll_top;

    let p = progress(scroll, points.trigger_start, points.trigger_end);
    let scale = 1.0 - p * (1.0 - config.target_scale(index));
    let rotation = if config.rotation_amount != 0.0 {
        index as f64 * config.rotation_amount * p
    } else {
        0.0
    };

    let blur = if config.blur_amount != 0.0 && index < top_card {
        ((top_card - index) as f64 * config.blur_amount).max(0.0)
    } else {
        0.0
    };

    let pinned_offset = ctx.stack_position_px + config.stack_offset(index) - card_top;
    let (phase, translate_y) = if scroll >= points.pin_start && scroll <= points.pin_end {
        (CardPhase::Pinned, scroll + pinned_offset)
    } else if scroll > points.pin_end {
        (CardPhase::Released, points.pin_end + pinned_offset)
    } else {
        (CardPhase::Before, 0.0)
    };

    CardFrame {
        index,
        phase,
        progress: p,
        state: TransformState {
            translate_y,
            scale,
            rotation,
            blur,
        }
        .rounded(),
    }
}

/// Compute every card for one frame. Empty geometry yields no frames.
pub fn compute_frame(
    snapshot: ScrollSnapshot,
    geometry: &Geometry,
    config: &StackConfig,
) -> Vec<CardFrame> {
    if geometry.is_empty() {
        return Vec::new();
    }
    let ctx = FrameContext::new(snapshot, geometry, config);
    let top_card = top_card_index(&ctx, geometry, config);

    geometry
        .card_tops
        .iter()
        .enumerate()
        .map(|(i, &top)| compute_card(top, i, top_card, &ctx, config))
        .collect()
}

/// Round half away from zero to `places` decimals
#[inline]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::config::StackPosition;
    use proptest::prelude::*;

    fn scenario_config() -> StackConfig {
        StackConfig {
            item_stack_distance: 30.0,
            stack_position: StackPosition::Percent(20.0),
            scale_end_position: StackPosition::Percent(10.0),
            base_scale: 0.9,
            item_scale: 0.04,
            ..Default::default()
        }
    }

    fn scenario_geometry() -> Geometry {
        Geometry {
            card_tops: vec![1000.0, 1600.0, 2200.0, 2800.0],
            end_top: Some(4000.0),
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let config = scenario_config();
        let geometry = scenario_geometry();

        // Fully scaled once scrollTop >= 1000 - 80
        let at = |scroll: f64| compute_frame(ScrollSnapshot::new(scroll, 800.0), &geometry, &config);
        assert!(at(919.0)[0].progress < 1.0);
        assert_eq!(at(920.0)[0].progress, 1.0);

        let frame = at(950.0);
        assert_eq!(frame[0].phase, CardPhase::Pinned);
        assert_eq!(frame[0].state.translate_y, 110.0);
        assert_eq!(frame[0].state.scale, 0.9);
        // Later cards are still in flow
        assert_eq!(frame[1].phase, CardPhase::Before);
        assert_eq!(frame[1].state, TransformState::IDENTITY);
    }

    #[test]
    fn test_pre_trigger_is_identity() {
        let frame = compute_frame(
            ScrollSnapshot::new(0.0, 800.0),
            &scenario_geometry(),
            &scenario_config(),
        );
        assert!(frame.iter().all(|c| c.state == TransformState::IDENTITY));
        assert!(frame.iter().all(|c| c.phase == CardPhase::Before));
    }

    #[test]
    fn test_release_freezes_translation() {
        let config = scenario_config();
        let geometry = scenario_geometry();
        // pinEnd = 4000 - 400 = 3600
        let at_end = compute_frame(ScrollSnapshot::new(3600.0, 800.0), &geometry, &config);
        let past = compute_frame(ScrollSnapshot::new(5000.0, 800.0), &geometry, &config);
        assert_eq!(at_end[0].phase, CardPhase::Pinned);
        assert_eq!(past[0].phase, CardPhase::Released);
        assert_eq!(at_end[0].state.translate_y, past[0].state.translate_y);
        assert_eq!(past[0].state.translate_y, 3600.0 - 1000.0 + 160.0);
    }

    #[test]
    fn test_stack_offset_cascades() {
        let config = scenario_config();
        let geometry = scenario_geometry();
        let frame = compute_frame(ScrollSnapshot::new(3000.0, 800.0), &geometry, &config);
        for card in &frame {
            assert_eq!(card.phase, CardPhase::Pinned);
        }
        // Each pinned card sits itemStackDistance below the previous one
        let y = |i: usize| 3000.0 - geometry.card_tops[i] + 160.0 + 30.0 * i as f64;
        for (i, card) in frame.iter().enumerate() {
            assert_eq!(card.state.translate_y, y(i));
        }
    }

    #[test]
    fn test_degenerate_range_is_complete() {
        assert_eq!(progress(500.0, 500.0, 500.0), 1.0);
        assert_eq!(progress(900.0, 500.0, 500.0), 1.0);
        assert_eq!(progress(100.0, 500.0, 500.0), 0.0);

        let config = StackConfig {
            stack_position: StackPosition::Pixels(100.0),
            scale_end_position: StackPosition::Pixels(100.0),
            item_stack_distance: 0.0,
            ..scenario_config()
        };
        let geometry = Geometry {
            card_tops: vec![1000.0],
            end_top: None,
        };
        let frame = compute_frame(ScrollSnapshot::new(900.0, 800.0), &geometry, &config);
        assert_eq!(frame[0].progress, 1.0);
        assert!(frame[0].state.scale.is_finite());
    }

    #[test]
    fn test_inverted_range_saturates() {
        // scaleEnd above stackPosition: once triggered the card is fully scaled
        assert_eq!(progress(850.0, 840.0, 800.0), 1.0);
        assert_eq!(progress(830.0, 840.0, 800.0), 0.0);
    }

    #[test]
    fn test_rotation_follows_progress() {
        let config = StackConfig {
            rotation_amount: 2.0,
            ..scenario_config()
        };
        let geometry = scenario_geometry();
        // Card 1: triggerStart = 1600 - 160 - 30 = 1410, triggerEnd = 1520
        let mid = compute_frame(ScrollSnapshot::new(1465.0, 800.0), &geometry, &config);
        assert_eq!(mid[1].progress, 0.5);
        assert_eq!(mid[1].state.rotation, 1.0);
        // Card 0 never rotates
        assert_eq!(mid[0].state.rotation, 0.0);
    }

    #[test]
    fn test_blur_recedes_older_cards() {
        let config = StackConfig {
            blur_amount: 1.5,
            ..scenario_config()
        };
        let geometry = scenario_geometry();
        // Card 2 triggers at 2200 - 160 - 60 = 1980
        let frame = compute_frame(ScrollSnapshot::new(2000.0, 800.0), &geometry, &config);
        assert_eq!(frame[0].state.blur, 3.0);
        assert_eq!(frame[1].state.blur, 1.5);
        assert_eq!(frame[2].state.blur, 0.0);
        assert_eq!(frame[3].state.blur, 0.0);
        assert_eq!(frame[0].state.css_filter(), "blur(3px)");
        assert_eq!(frame[3].state.css_filter(), "");
    }

    #[test]
    fn test_empty_geometry_is_noop() {
        let frame = compute_frame(
            ScrollSnapshot::new(100.0, 800.0),
            &Geometry::default(),
            &StackConfig::default(),
        );
        assert!(frame.is_empty());
    }

    #[test]
    fn test_rounding_and_diff() {
        let state = TransformState {
            translate_y: 10.12345,
            scale: 0.987654,
            rotation: 1.23456,
            blur: 0.0,
        }
        .rounded();
        assert_eq!(state.translate_y, 10.12);
        assert_eq!(state.scale, 0.988);
        assert_eq!(state.rotation, 1.23);

        let nudged = TransformState {
            translate_y: state.translate_y + 0.05,
            ..state
        };
        assert!(!nudged.differs_from(&state));
        let moved = TransformState {
            translate_y: state.translate_y + 0.5,
            ..state
        };
        assert!(moved.differs_from(&state));
    }

    #[test]
    fn test_css_transform_format() {
        let state = TransformState {
            translate_y: 110.0,
            scale: 0.9,
            rotation: 0.0,
            blur: 0.0,
        };
        assert_eq!(
            state.css_transform(),
            "translate3d(0, 110px, 0) scale(0.9) rotate(0deg)"
        );
    }

    proptest! {
        #[test]
        fn prop_pin_triggers_monotonic(
            gaps in prop::collection::vec(0.0f64..2000.0, 1..16),
            stack_distance in 0.001f64..200.0,
            viewport in 200.0f64..2000.0,
        ) {
            let config = StackConfig {
                item_stack_distance: stack_distance,
                ..StackConfig::default()
            };
            // Real cards are always further apart than the stack offset
            let mut top = 500.0;
            let card_tops: Vec<f64> = gaps
                .iter()
                .map(|extra| {
                    top += stack_distance + extra;
                    top
                })
                .collect();
            let geometry = Geometry { card_tops, end_top: None };
            let ctx = FrameContext::new(ScrollSnapshot::new(0.0, viewport), &geometry, &config);

            let starts: Vec<f64> = geometry
                .card_tops
                .iter()
                .enumerate()
                .map(|(i, t)| ctx.trigger_points(*t, i, &config).trigger_start)
                .collect();
            for pair in starts.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }

        #[test]
        fn prop_progress_clamped(
            scroll in prop_oneof![Just(-1000.0f64), Just(1e9f64), -1e9f64..1e9],
            start in -5000.0f64..5000.0,
            span in -2000.0f64..2000.0,
        ) {
            let p = progress(scroll, start, start + span);
            prop_assert!((0.0..=1.0).contains(&p));
        }

        #[test]
        fn prop_frame_values_finite(
            scroll in -1e6f64..1e6,
            viewport in 0.0f64..4000.0,
        ) {
            let frame = compute_frame(
                ScrollSnapshot::new(scroll, viewport),
                &scenario_geometry(),
                &scenario_config(),
            );
            for card in frame {
                prop_assert!(card.state.translate_y.is_finite());
                prop_assert!(card.state.scale.is_finite());
                prop_assert!((0.0..=1.0).contains(&card.progress));
            }
        }
    }
}
