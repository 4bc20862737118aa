//! Stack engine state
//!
//! Owns the cached geometry, the last-applied transform per card and the
//! completion edge. Scroll notifications only mark the engine dirty; the
//! next animation frame does the work, so any number of notifications
//! within one frame collapse into a single pass.

use std::collections::HashMap;
use std::fmt;

use super::config::StackConfig;
use super::geometry::{BaselineStyle, Geometry, LayoutProbe, ScrollSnapshot, baseline_style};
use super::transform::{CardPhase, TransformState, compute_frame};

/// Imperative style boundary. Only the engine's frame step calls it.
pub trait CardSink {
    /// Static compositing hints, written once per measurement pass
    fn apply_baseline(&mut self, index: usize, style: &BaselineStyle);
    /// Write `transform` and `filter` for one card
    fn apply(&mut self, index: usize, state: &TransformState);
    /// `transform: none` and no filter
    fn reset(&mut self, index: usize);
}

/// Outcome of one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// A snapshot was pending and the frame did work
    pub ran: bool,
    /// Cards whose styles were written
    pub written: usize,
    /// Cards left untouched by the diff
    pub skipped: usize,
    /// The stack-complete callback fired this frame
    pub completed: bool,
}

/// Scroll-linked stacking engine for one mounted container
pub struct StackEngine {
    config: StackConfig,
    geometry: Geometry,
    last_applied: HashMap<usize, TransformState>,
    reduced_motion: bool,
    stack_completed: bool,
    on_complete: Option<Box<dyn FnMut()>>,
    pending: Option<ScrollSnapshot>,
    last_snapshot: Option<ScrollSnapshot>,
    needs_measure: bool,
}

impl StackEngine {
    pub fn new(config: StackConfig) -> Self {
        Self {
            config,
            geometry: Geometry::default(),
            last_applied: HashMap::new(),
            reduced_motion: false,
            stack_completed: false,
            on_complete: None,
            pending: None,
            last_snapshot: None,
            needs_measure: false,
        }
    }

    /// Skip all transform math; cards render untransformed
    pub fn with_reduced_motion(mut self, reduced: bool) -> Self {
        self.reduced_motion = reduced;
        self
    }

    /// One-shot callback fired when the last card pins
    pub fn on_stack_complete(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    #[inline]
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    /// Re-measure every card, replacing the cached offsets, and write the
    /// baseline styles. The next frame recomputes against the new layout.
    pub fn measure(&mut self, probe: &impl LayoutProbe, sink: &mut impl CardSink) {
        self.needs_measure = false;
        self.geometry = Geometry::measure(probe);
        let count = self.geometry.len();

        if count == 0 {
            log::warn!("Scroll stack has no cards to measure");
        } else if self.geometry.end_top.is_none() {
            log::warn!("Scroll stack end marker missing; cards will stay pinned");
        }
        log::debug!(
            "Measured {} cards (end marker at {:?})",
            count,
            self.geometry.end_top
        );

        for index in 0..count {
            sink.apply_baseline(index, &baseline_style(index, count, &self.config));
        }

        // Indices beyond the new count belong to cards that no longer exist
        self.last_applied.retain(|index, _| *index < count);

        if self.pending.is_none() {
            self.pending = self.last_snapshot;
        }
    }

    /// Record the latest scroll position. Returns `true` when the caller
    /// must schedule an animation frame (the engine was clean).
    pub fn notify_scroll(&mut self, snapshot: ScrollSnapshot) -> bool {
        let was_clean = self.pending.is_none();
        self.pending = Some(snapshot);
        was_clean
    }

    /// Whether a frame is waiting to run
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.pending.is_some() || self.needs_measure
    }

    /// Mark the cached geometry stale (resize, late layout shift). The next
    /// [`frame`](Self::frame) measures before computing any transform, so
    /// any number of invalidations within one frame cost one measurement.
    /// Returns `true` when the caller must schedule a frame.
    pub fn invalidate_geometry(&mut self) -> bool {
        let was_clean = !self.is_dirty();
        self.needs_measure = true;
        was_clean
    }

    #[inline]
    pub fn needs_measure(&self) -> bool {
        self.needs_measure
    }

    /// Full animation-frame step: pending measurement first, then transforms
    pub fn frame(&mut self, probe: &impl LayoutProbe, sink: &mut impl CardSink) -> FrameReport {
        if self.needs_measure {
            self.measure(probe, sink);
        }
        self.run_frame(sink)
    }

    /// Animation-frame step: recompute every card from the most recent
    /// snapshot and write only the styles that visibly changed.
    pub fn run_frame(&mut self, sink: &mut impl CardSink) -> FrameReport {
        let Some(snapshot) = self.pending.take() else {
            return FrameReport::default();
        };
        self.last_snapshot = Some(snapshot);

        if self.geometry.is_empty() {
            return FrameReport {
                ran: true,
                ..Default::default()
            };
        }

        if self.reduced_motion {
            return self.reset_all(sink);
        }

        let frames = compute_frame(snapshot, &self.geometry, &self.config);
        let mut report = FrameReport {
            ran: true,
            ..Default::default()
        };

        for card in &frames {
            let changed = self
                .last_applied
                .get(&card.index)
                .is_none_or(|last| card.state.differs_from(last));
            if changed {
                sink.apply(card.index, &card.state);
                self.last_applied.insert(card.index, card.state);
                report.written += 1;
            } else {
                report.skipped += 1;
            }
        }

        if let Some(last) = frames.last() {
            report.completed = self.update_completion(last.phase);
        }

        log::trace!(
            "Frame at {:.1}: {} written, {} skipped",
            snapshot.scroll_top,
            report.written,
            report.skipped
        );
        report
    }

    fn reset_all(&mut self, sink: &mut impl CardSink) -> FrameReport {
        let mut report = FrameReport {
            ran: true,
            ..Default::default()
        };
        for index in 0..self.geometry.len() {
            if self.last_applied.get(&index) == Some(&TransformState::IDENTITY) {
                report.skipped += 1;
                continue;
            }
            sink.reset(index);
            self.last_applied.insert(index, TransformState::IDENTITY);
            report.written += 1;
        }
        report
    }

    /// Edge-triggered completion. Re-arms only once the last card drops
    /// back above its pin range; releasing past the end keeps it spent.
    fn update_completion(&mut self, last_phase: CardPhase) -> bool {
        match last_phase {
            CardPhase::Pinned if !self.stack_completed => {
                self.stack_completed = true;
                log::debug!("Scroll stack complete");
                if let Some(callback) = self.on_complete.as_mut() {
                    callback();
                }
                true
            }
            CardPhase::Before => {
                self.stack_completed = false;
                false
            }
            _ => false,
        }
    }

    /// Release every cache; the engine is inert until measured again
    pub fn teardown(&mut self) {
        self.geometry = Geometry::default();
        self.last_applied.clear();
        self.pending = None;
        self.last_snapshot = None;
        self.stack_completed = false;
        self.needs_measure = false;
    }
}

impl fmt::Debug for StackEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackEngine")
            .field("config", &self.config)
            .field("geometry", &self.geometry)
            .field("reduced_motion", &self.reduced_motion)
            .field("stack_completed", &self.stack_completed)
            .field("pending", &self.pending)
            .field("needs_measure", &self.needs_measure)
            .finish_non_exhaustive()
    }
}
