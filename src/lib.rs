//! Scroll Stack - birthday tribute site engine
//!
//! Core modules:
//! - `stack`: Scroll-linked card stacking engine (pure, platform independent)
//! - `platform`: Browser bindings (DOM, scroll sources, mount lifecycle, uploads)
//! - `media`: Recording lifecycle and upload planning
//! - `wishes`: Wish submissions and moderation
//! - `admin`: Admin session gate
//! - `settings`: Visitor preferences

pub mod admin;
pub mod media;
pub mod platform;
pub mod settings;
pub mod stack;
pub mod wishes;

pub use settings::{MotionPreference, Settings};
pub use stack::{ScrollSnapshot, StackConfig, StackEngine, StackPosition, TransformState};

/// Engine constants
pub mod consts {
    /// Default spacing between unstacked cards (px)
    pub const DEFAULT_ITEM_DISTANCE: f64 = 100.0;
    /// Default scale delta per stack depth
    pub const DEFAULT_ITEM_SCALE: f64 = 0.03;
    /// Default offset between pinned cards (px)
    pub const DEFAULT_ITEM_STACK_DISTANCE: f64 = 30.0;
    /// Default scale of the first card at full pin
    pub const DEFAULT_BASE_SCALE: f64 = 0.85;

    /// Style-write thresholds (below these a change is invisible)
    pub const TRANSLATE_EPSILON: f64 = 0.1;
    pub const SCALE_EPSILON: f64 = 0.001;
    pub const ROTATION_EPSILON: f64 = 0.1;
    pub const BLUR_EPSILON: f64 = 0.1;

    /// Delay before the one-shot settle re-measurement (late images/fonts)
    pub const SETTLE_DELAY_MS: i32 = 300;
    /// Momentum snaps to its target once closer than this (px)
    pub const MOMENTUM_SNAP_PX: f64 = 0.5;
    /// Reported positions further than this from the eased one were moved
    /// by something else (scrollbar drag, keyboard)
    pub const MOMENTUM_RESYNC_PX: f64 = 1.0;

    /// DOM markers
    pub const CARD_CLASS: &str = "scroll-stack-card";
    pub const END_MARKER_CLASS: &str = "scroll-stack-end";
    pub const INNER_CLASS: &str = "scroll-stack-inner";
    pub const CONFIG_ATTRIBUTE: &str = "data-scroll-stack";
    /// Event dispatched on the container when the last card pins
    pub const COMPLETE_EVENT: &str = "scrollstackcomplete";
}
