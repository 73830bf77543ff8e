use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::grid::GridDims;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub cell_size: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub wheel_zoom_in: f64,
    pub wheel_zoom_out: f64,
    pub button_zoom_step: f64,
    pub hover_throttle_ms: u64,
    pub wheel_settle_ms: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            cell_size: 10.0,
            min_zoom: 0.1,
            max_zoom: 10.0,
            wheel_zoom_in: 1.1,
            wheel_zoom_out: 0.9,
            button_zoom_step: 1.5,
            hover_throttle_ms: 16,
            wheel_settle_ms: 100,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    pub background: Color,
    pub line_color: Color,
    pub line_width: f64,
    pub line_zoom_threshold: f64,
    pub hover_outline: Color,
    pub hover_outline_width: f64,
    pub preview_alpha: f64,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            background: Color::white(),
            line_color: Color::parse("#DDDDDD").unwrap_or_default(),
            line_width: 0.5,
            line_zoom_threshold: 0.5,
            hover_outline: Color::black(),
            hover_outline_width: 2.0,
            preview_alpha: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_ms: u64,
    pub factor: f64,
    pub max_ms: u64,
}

impl BackoffConfig {
    pub fn base(&self) -> Duration {
        Duration::from_millis(self.base_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: 1000,
            factor: 1.5,
            max_ms: 30_000,
        }
    }
}

/// Everything a client session needs that is not an endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub grid: GridDims,
    pub view: ViewConfig,
    pub style: RenderStyle,
    pub backoff: BackoffConfig,
}
