//! Scale factors that make a page fill the display box along one axis.
//!
//! All functions are pure. Inputs must be positive and finite.

use crate::types::*;

/// Which axis a fit pass matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FitMode {
    /// Page height equals display height
    Height,
    /// Page width equals display width
    Width,
    /// Height when the display box is not taller than it is wide, width otherwise
    #[default]
    Auto,
}

impl FitMode {
    /// Resolve `Auto` against a display box. Ties go to `Height`.
    pub fn resolve(self, display: Size) -> FitMode {
        match self {
            FitMode::Auto if display.height <= display.width => FitMode::Height,
            FitMode::Auto => FitMode::Width,
            mode => mode,
        }
    }
}

pub fn fit_height(display_height: f64, natural_height: f64) -> Result<f64> {
    check_length("display height", display_height)?;
    check_length("natural height", natural_height)?;
    Ok(display_height / natural_height)
}

pub fn fit_width(display_width: f64, natural_width: f64) -> Result<f64> {
    check_length("display width", display_width)?;
    check_length("natural width", natural_width)?;
    Ok(display_width / natural_width)
}

/// Pick fit-by-height or fit-by-width from the display box's shape.
///
/// This is a heuristic: the page may still overflow the other axis.
pub fn auto_fit(display: Size, natural: Size) -> Result<f64> {
    fit_scale(FitMode::Auto, display, natural)
}

pub fn fit_scale(mode: FitMode, display: Size, natural: Size) -> Result<f64> {
    match mode.resolve(display) {
        FitMode::Height => fit_height(display.height, natural.height),
        FitMode::Width | FitMode::Auto => fit_width(display.width, natural.width),
    }
}

/// Left offset that centers a rendered page inside its container.
///
/// Pages at least as wide as the container minus `inset` sit flush left.
pub fn centered_left(container_width: f64, page_width: f64, inset: f64) -> f64 {
    if page_width < container_width - inset {
        (container_width - page_width) / 2.0
    } else {
        0.0
    }
}

fn check_length(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ViewError::InvalidDimensions(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}
