use crate::scheduler::check_scale;
use crate::types::*;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Space kept free inside the container when fitting and centering a page
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitInset {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Default for FitInset {
    fn default() -> Self {
        Self {
            horizontal: 20.0,
            vertical: 5.0,
        }
    }
}

/// View configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ViewOptions {
    /// Scale used for the first render unless `auto_fit` replaces it
    pub initial_scale: f64,

    /// Run an auto-fit pass after load and after every container resize
    pub auto_fit: bool,

    pub fit_inset: FitInset,

    /// Give up on a render after this many milliseconds
    pub render_timeout_ms: Option<u64>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            initial_scale: 1.0,
            auto_fit: false,
            fit_inset: FitInset::default(),
            render_timeout_ms: None,
        }
    }
}

impl ViewOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| ViewError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ViewError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        check_scale(self.initial_scale)
            .map_err(|_| ViewError::Config(format!("Initial scale must be positive, got {}", self.initial_scale)))?;

        let FitInset { horizontal, vertical } = self.fit_inset;
        if !(horizontal.is_finite() && horizontal >= 0.0 && vertical.is_finite() && vertical >= 0.0) {
            return Err(ViewError::Config(format!(
                "Fit insets must be non-negative, got {horizontal}x{vertical}"
            )));
        }

        if self.render_timeout_ms == Some(0) {
            return Err(ViewError::Config(
                "Render timeout must be at least 1 ms".to_string(),
            ));
        }

        Ok(())
    }

    pub fn render_timeout(&self) -> Option<Duration> {
        self.render_timeout_ms.map(Duration::from_millis)
    }

    /// The part of `container` a fit pass may fill
    pub fn fit_area(&self, container: Size) -> Size {
        Size::new(
            container.width - self.fit_inset.horizontal,
            container.height - self.fit_inset.vertical,
        )
    }
}
