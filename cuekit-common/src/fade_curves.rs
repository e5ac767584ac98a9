//! Fade curve implementations for cue volume envelopes
//!
//! Provides five fade curve types with precise mathematical formulas,
//! plus the direction-resolved [`FadeShape`] the fade engine interpolates
//! with.

use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Fade curve types for volume envelopes
///
/// Each curve type provides a different perceptual quality:
/// - Linear: Constant rate of change (precise, predictable)
/// - Exponential: Slow start, fast finish (natural-sounding fade-in)
/// - Logarithmic: Fast start, slow finish (natural-sounding fade-out)
/// - SCurve: Smooth acceleration and deceleration (gentle, musical)
/// - EqualPower: Constant perceived loudness
///
/// Fade-in gains rise from 0.0 to 1.0; fade-out gains fall from 1.0 to 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// Linear: y = t
    Linear,

    /// Exponential: y = t² (fade-in: slow start, fast finish)
    Exponential,

    /// Logarithmic: y = (1-t)² as fade-out (fast start, slow finish)
    Logarithmic,

    /// S-Curve: y = 0.5 × (1 - cos(π × t))
    SCurve,

    /// Equal-Power: y = sin(t × π/2), constant perceived loudness
    EqualPower,
}

impl FadeCurve {
    /// Fade-in gain at normalized position `t` in [0, 1].
    ///
    /// Returns a volume multiplier rising from 0.0 (silence) to 1.0 (full).
    pub fn fade_in_gain(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::Exponential => t * t,
            // Logarithmic is the fade-out family; as a fade-in we invert
            // the quadratic so it keeps its fast-start character.
            FadeCurve::Logarithmic => t.sqrt(),
            FadeCurve::SCurve => 0.5 * (1.0 - (std::f32::consts::PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Fade-out gain at normalized position `t` in [0, 1].
    ///
    /// Returns a volume multiplier falling from 1.0 (full) to 0.0 (silence).
    pub fn fade_out_gain(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => 1.0 - t,
            FadeCurve::Exponential => {
                let inv = 1.0 - t;
                inv * inv
            }
            FadeCurve::Logarithmic => {
                let inv = 1.0 - t;
                inv * inv
            }
            FadeCurve::SCurve => 0.5 * (1.0 + (std::f32::consts::PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).cos(),
        }
    }

    /// Parse a curve from its configuration name.
    ///
    /// Accepts the canonical names plus common aliases:
    /// 'cosine', 'scurve', 's-curve', 's_curve' all map to SCurve;
    /// 'equal_power' and 'equalpower' map to EqualPower.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(FadeCurve::Linear),
            "exponential" => Some(FadeCurve::Exponential),
            "logarithmic" => Some(FadeCurve::Logarithmic),
            "cosine" | "scurve" | "s-curve" | "s_curve" => Some(FadeCurve::SCurve),
            "equal_power" | "equalpower" => Some(FadeCurve::EqualPower),
            _ => None,
        }
    }

    /// Canonical configuration name (lowercase, underscored).
    pub fn name(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "linear",
            FadeCurve::Exponential => "exponential",
            FadeCurve::Logarithmic => "logarithmic",
            FadeCurve::SCurve => "s_curve",
            FadeCurve::EqualPower => "equal_power",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "Linear",
            FadeCurve::Exponential => "Exponential",
            FadeCurve::Logarithmic => "Logarithmic",
            FadeCurve::SCurve => "S-Curve",
            FadeCurve::EqualPower => "Equal Power",
        }
    }

    /// All available fade curve variants (for UI dropdowns and validation).
    pub fn all_variants() -> &'static [FadeCurve] {
        &[
            FadeCurve::Linear,
            FadeCurve::Exponential,
            FadeCurve::Logarithmic,
            FadeCurve::SCurve,
            FadeCurve::EqualPower,
        ]
    }
}

impl Default for FadeCurve {
    /// Default fade curve is Exponential (natural-sounding fade-in).
    fn default() -> Self {
        FadeCurve::Exponential
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Direction a fade runs in. Selects which gain family of a [`FadeCurve`]
/// shapes the ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeDirection {
    In,
    Out,
}

/// A direction-resolved fade shape.
///
/// `progress` is a monotonic map [0, 1] -> [0, 1] with f(0) = 0 and
/// f(1) = 1 for both directions, suitable as the interpolation parameter
/// of `lerp(start, end, progress(t))`:
/// - fade-in rises along the curve's fade-in gain;
/// - fade-out rises as the complement of the fade-out gain, so the lerp
///   toward zero traces the curve's gain contour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeShape {
    pub curve: FadeCurve,
    pub direction: FadeDirection,
}

impl FadeShape {
    /// Shape for a fade toward full level.
    pub fn fade_in(curve: FadeCurve) -> Self {
        Self {
            curve,
            direction: FadeDirection::In,
        }
    }

    /// Shape for a fade toward silence.
    pub fn fade_out(curve: FadeCurve) -> Self {
        Self {
            curve,
            direction: FadeDirection::Out,
        }
    }

    /// Normalized rising progress at position `t` in [0, 1].
    pub fn progress(&self, t: f32) -> f32 {
        match self.direction {
            FadeDirection::In => self.curve.fade_in_gain(t),
            FadeDirection::Out => 1.0 - self.curve.fade_out_gain(t),
        }
    }
}
