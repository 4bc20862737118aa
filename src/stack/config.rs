//! Engine configuration
//!
//! Immutable for the lifetime of one engine. Pages attach it as JSON
//! (camelCase keys, every field optional) on the stack container.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Configuration parse failures
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid stack position `{0}` (expected e.g. \"20%\", \"160px\" or 160)")]
    InvalidPosition(String),
    #[error("position must be finite, got {0}")]
    NonFinite(f64),
    #[error("invalid stack configuration: {0}")]
    Json(String),
}

/// Viewport-relative trigger point: a percentage of the viewport height or
/// an absolute pixel offset from the viewport top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PositionRepr", into = "PositionRepr")]
pub enum StackPosition {
    Percent(f64),
    Pixels(f64),
}

impl StackPosition {
    /// Resolve against the current viewport height
    #[inline]
    pub fn to_px(self, viewport_height: f64) -> f64 {
        match self {
            StackPosition::Percent(p) => p / 100.0 * viewport_height,
            StackPosition::Pixels(px) => px,
        }
    }
}

impl Default for StackPosition {
    fn default() -> Self {
        StackPosition::Percent(20.0)
    }
}

impl FromStr for StackPosition {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || ConfigError::InvalidPosition(s.to_string());

        let (number, percent) = if let Some(n) = trimmed.strip_suffix('%') {
            (n, true)
        } else if let Some(n) = trimmed.strip_suffix("px") {
            (n, false)
        } else {
            (trimmed, false)
        };

        let value: f64 = number.trim().parse().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(ConfigError::NonFinite(value));
        }

        Ok(if percent {
            StackPosition::Percent(value)
        } else {
            StackPosition::Pixels(value)
        })
    }
}

impl fmt::Display for StackPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackPosition::Percent(p) => write!(f, "{p}%"),
            StackPosition::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PositionRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<PositionRepr> for StackPosition {
    type Error = ConfigError;

    fn try_from(repr: PositionRepr) -> Result<Self, Self::Error> {
        match repr {
            PositionRepr::Number(px) if px.is_finite() => Ok(StackPosition::Pixels(px)),
            PositionRepr::Number(px) => Err(ConfigError::NonFinite(px)),
            PositionRepr::Text(s) => s.parse(),
        }
    }
}

impl From<StackPosition> for PositionRepr {
    fn from(pos: StackPosition) -> Self {
        match pos {
            StackPosition::Pixels(px) => PositionRepr::Number(px),
            StackPosition::Percent(_) => PositionRepr::Text(pos.to_string()),
        }
    }
}

/// Stacking engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StackConfig {
    /// Spacing between cards while unstacked (px, applied as bottom margin)
    pub item_distance: f64,
    /// Scale delta per stack depth
    pub item_scale: f64,
    /// Offset between consecutively pinned cards (px)
    pub item_stack_distance: f64,
    /// Where cards pin, measured from the viewport top
    pub stack_position: StackPosition,
    /// Where the scale transition completes, measured from the viewport top
    pub scale_end_position: StackPosition,
    /// Scale factor of the first card at full pin
    pub base_scale: f64,
    /// Degrees of rotation per stack depth
    pub rotation_amount: f64,
    /// Pixels of blur per depth below the top pinned card
    pub blur_amount: f64,
    /// Track window scroll instead of the container's own scroll
    pub use_window_scroll: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            item_distance: DEFAULT_ITEM_DISTANCE,
            item_scale: DEFAULT_ITEM_SCALE,
            item_stack_distance: DEFAULT_ITEM_STACK_DISTANCE,
            stack_position: StackPosition::Percent(20.0),
            scale_end_position: StackPosition::Percent(10.0),
            base_scale: DEFAULT_BASE_SCALE,
            rotation_amount: 0.0,
            blur_amount: 0.0,
            use_window_scroll: false,
        }
    }
}

impl StackConfig {
    /// Parse a JSON configuration (missing keys fall back to defaults)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// Final scale of the card at `index` once fully pinned
    #[inline]
    pub fn target_scale(&self, index: usize) -> f64 {
        self.base_scale + index as f64 * self.item_scale
    }

    /// Extra downward offset of the card at `index` while pinned
    #[inline]
    pub fn stack_offset(&self, index: usize) -> f64 {
        self.item_stack_distance * index as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positions() {
        assert_eq!("20%".parse::<StackPosition>(), Ok(StackPosition::Percent(20.0)));
        assert_eq!(" 12.5 % ".parse::<StackPosition>(), Ok(StackPosition::Percent(12.5)));
        assert_eq!("160px".parse::<StackPosition>(), Ok(StackPosition::Pixels(160.0)));
        assert_eq!("160".parse::<StackPosition>(), Ok(StackPosition::Pixels(160.0)));
        assert!(matches!(
            "abc".parse::<StackPosition>(),
            Err(ConfigError::InvalidPosition(_))
        ));
        assert!("inf%".parse::<StackPosition>().is_err());
    }

    #[test]
    fn test_position_to_px() {
        assert_eq!(StackPosition::Percent(20.0).to_px(800.0), 160.0);
        assert_eq!(StackPosition::Percent(10.0).to_px(800.0), 80.0);
        assert_eq!(StackPosition::Pixels(42.0).to_px(800.0), 42.0);
    }

    #[test]
    fn test_config_from_json_partial() {
        let config = StackConfig::from_json(
            r#"{"itemStackDistance": 40, "stackPosition": "25%", "scaleEndPosition": 60, "blurAmount": 2}"#,
        )
        .unwrap();
        assert_eq!(config.item_stack_distance, 40.0);
        assert_eq!(config.stack_position, StackPosition::Percent(25.0));
        assert_eq!(config.scale_end_position, StackPosition::Pixels(60.0));
        assert_eq!(config.blur_amount, 2.0);
        // Untouched keys keep their defaults
        assert_eq!(config.base_scale, DEFAULT_BASE_SCALE);
        assert!(!config.use_window_scroll);
    }

    #[test]
    fn test_config_rejects_bad_position() {
        let err = StackConfig::from_json(r#"{"stackPosition": "top"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_config_json_keeps_percent_strings() {
        let json = serde_json::to_string(&StackConfig::default()).unwrap();
        assert!(json.contains(r#""stackPosition":"20%""#));
        assert_eq!(StackConfig::from_json(&json).unwrap(), StackConfig::default());
    }

    #[test]
    fn test_target_scale_and_offset() {
        let config = StackConfig {
            base_scale: 0.9,
            item_scale: 0.04,
            item_stack_distance: 30.0,
            ..Default::default()
        };
        assert_eq!(config.target_scale(0), 0.9);
        assert!((config.target_scale(2) - 0.98).abs() < 1e-12);
        assert_eq!(config.stack_offset(3), 90.0);
    }
}
