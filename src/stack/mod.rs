//! Scroll-linked stacking engine
//!
//! Everything in here is pure and platform independent:
//! - Geometry is measured through a [`LayoutProbe`]
//! - Transforms are a function of `(cardTop, index, snapshot, config)`
//! - Style writes go through a single [`CardSink`] boundary
//! - Scroll updates arrive through a [`ScrollSource`]

pub mod config;
pub mod engine;
pub mod geometry;
pub mod momentum;
pub mod source;
pub mod transform;

pub use config::{ConfigError, StackConfig, StackPosition};
pub use engine::{CardSink, FrameReport, StackEngine};
pub use geometry::{BaselineStyle, Geometry, LayoutProbe, ScrollSnapshot, baseline_style};
pub use momentum::{Momentum, MomentumConfig};
pub use source::{ScrollListener, ScrollSource, SourceKind, Subscription};
pub use transform::{
    CardFrame, CardPhase, FrameContext, TransformState, TriggerPoints, compute_card,
    compute_frame, progress, round_to, top_card_index,
};
