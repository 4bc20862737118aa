//! Reduced-motion detection

use crate::settings::{MotionPreference, Settings};

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Whether the platform asks for reduced motion.
///
/// Any failure (no window, no `matchMedia`) means motion is not reduced.
pub fn prefers_reduced_motion() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media(REDUCED_MOTION_QUERY).ok().flatten())
        .map(|query| query.matches())
        .unwrap_or(false)
}

/// Visitor override first, platform signal otherwise
pub fn effective_reduced_motion(settings: &Settings) -> bool {
    match settings.motion {
        MotionPreference::Auto => prefers_reduced_motion(),
        preference => preference.reduced(false),
    }
}
