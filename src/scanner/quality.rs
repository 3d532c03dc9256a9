//! User-facing quality categories.
//!
//! The boundaries are part of the display contract and must not drift:
//!
//! | Metric | Bands |
//! |---|---|
//! | Blur | `>500` Excellent, `>250` Good, `>100` Fair, `>50` Poor, else Very Blurry |
//! | Brightness | `<20` Very Dark, `<40` Dark, `<80` Dim, `<180` Good, `<220` Bright, else Very Bright |
//! | Resolution (shorter side) | `<240` Tiny, `<480` Low, `<720` SD, `<1080` HD, `<1440` Full HD, `<2160` High Res, else Ultra HD |
//!
//! A negative input (the `-1` sentinel) maps to `Unknown` everywhere.

use serde::Serialize;
use std::fmt;

/// Sharpness band of a blur score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlurCategory {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryBlurry,
    Unknown,
}

impl BlurCategory {
    /// Classify a blur score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 0.0 {
            Self::Unknown
        } else if score > 500.0 {
            Self::Excellent
        } else if score > 250.0 {
            Self::Good
        } else if score > 100.0 {
            Self::Fair
        } else if score > 50.0 {
            Self::Poor
        } else {
            Self::VeryBlurry
        }
    }
}

impl fmt::Display for BlurCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::VeryBlurry => "Very Blurry",
            Self::Unknown => "Unknown",
        })
    }
}

/// Exposure band of a brightness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BrightnessCategory {
    VeryDark,
    Dark,
    Dim,
    Good,
    Bright,
    VeryBright,
    Unknown,
}

impl BrightnessCategory {
    /// Classify a brightness score in `[0, 255]`.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 0.0 {
            Self::Unknown
        } else if score < 20.0 {
            Self::VeryDark
        } else if score < 40.0 {
            Self::Dark
        } else if score < 80.0 {
            Self::Dim
        } else if score < 180.0 {
            Self::Good
        } else if score < 220.0 {
            Self::Bright
        } else {
            Self::VeryBright
        }
    }
}

impl fmt::Display for BrightnessCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VeryDark => "Very Dark",
            Self::Dark => "Dark",
            Self::Dim => "Dim",
            Self::Good => "Good",
            Self::Bright => "Bright",
            Self::VeryBright => "Very Bright",
            Self::Unknown => "Unknown",
        })
    }
}

/// Resolution band by the shorter image side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResolutionCategory {
    Tiny,
    Low,
    Sd,
    Hd,
    FullHd,
    HighRes,
    UltraHd,
    Unknown,
}

impl ResolutionCategory {
    /// Classify by shorter side; negative means unknown.
    #[must_use]
    pub fn from_shorter_side(side: i64) -> Self {
        match side {
            s if s < 0 => Self::Unknown,
            s if s < 240 => Self::Tiny,
            s if s < 480 => Self::Low,
            s if s < 720 => Self::Sd,
            s if s < 1080 => Self::Hd,
            s if s < 1440 => Self::FullHd,
            s if s < 2160 => Self::HighRes,
            _ => Self::UltraHd,
        }
    }

    /// Classify `width x height`.
    #[must_use]
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self::from_shorter_side(i64::from(width.min(height)))
    }
}

impl fmt::Display for ResolutionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tiny => "Tiny",
            Self::Low => "Low",
            Self::Sd => "SD",
            Self::Hd => "HD",
            Self::FullHd => "Full HD",
            Self::HighRes => "High Res",
            Self::UltraHd => "Ultra HD",
            Self::Unknown => "Unknown",
        })
    }
}
