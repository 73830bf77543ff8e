use serde::{Deserialize, Serialize};

use crate::config::ViewConfig;
use crate::grid::{CellCoord, GridDims};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Grid coordinate before bounds checking; may be negative or past the edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridPoint {
    pub x: i64,
    pub y: i64,
}

impl GridPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn to_cell(self, dims: GridDims) -> Option<CellCoord> {
        if dims.contains(self.x, self.y) {
            Some(CellCoord::new(self.x as u32, self.y as u32))
        } else {
            None
        }
    }
}

impl From<CellCoord> for GridPoint {
    fn from(value: CellCoord) -> Self {
        Self::new(value.x as i64, value.y as i64)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Half-open range of cells `[x0, x1) x [y0, y1)` currently on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellWindow {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CellWindow {
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.x >= self.x0 && coord.x < self.x1 && coord.y >= self.y0 && coord.y < self.y1
    }
}

pub fn screen_to_grid(point: ScreenPoint, pan: ScreenPoint, zoom: f64, cell_size: f64) -> GridPoint {
    let scaled = cell_size * zoom;
    GridPoint::new(
        ((point.x - pan.x) / scaled).floor() as i64,
        ((point.y - pan.y) / scaled).floor() as i64,
    )
}

pub fn grid_to_screen(point: GridPoint, pan: ScreenPoint, zoom: f64, cell_size: f64) -> ScreenPoint {
    let scaled = cell_size * zoom;
    ScreenPoint::new(
        pan.x + point.x as f64 * scaled,
        pan.y + point.y as f64 * scaled,
    )
}

/// Pan that keeps the grid position under `anchor` fixed when the zoom
/// changes from `old_zoom` to `new_zoom`.
pub fn zoom_around(
    anchor: ScreenPoint,
    old_zoom: f64,
    new_zoom: f64,
    old_pan: ScreenPoint,
    cell_size: f64,
) -> ScreenPoint {
    let old_scaled = cell_size * old_zoom;
    let new_scaled = cell_size * new_zoom;
    let grid_x = (anchor.x - old_pan.x) / old_scaled;
    let grid_y = (anchor.y - old_pan.y) / old_scaled;
    ScreenPoint::new(anchor.x - grid_x * new_scaled, anchor.y - grid_y * new_scaled)
}

pub fn clamp_zoom(zoom: f64, min: f64, max: f64) -> f64 {
    if zoom.is_nan() {
        return min;
    }
    zoom.clamp(min, max)
}

#[derive(Clone, Debug)]
pub struct Viewport {
    pan: ScreenPoint,
    zoom: f64,
    width: f64,
    height: f64,
    dims: GridDims,
    config: ViewConfig,
}

impl Viewport {
    pub fn new(dims: GridDims, config: ViewConfig) -> Self {
        Self {
            pan: ScreenPoint::default(),
            zoom: clamp_zoom(1.0, config.min_zoom, config.max_zoom),
            width: 0.0,
            height: 0.0,
            dims,
            config,
        }
    }

    pub fn pan(&self) -> ScreenPoint {
        self.pan
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn cell_size(&self) -> f64 {
        self.config.cell_size
    }

    pub fn scaled_cell(&self) -> f64 {
        self.config.cell_size * self.zoom
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn screen_to_grid(&self, point: ScreenPoint) -> GridPoint {
        screen_to_grid(point, self.pan, self.zoom, self.config.cell_size)
    }

    pub fn grid_to_screen(&self, point: GridPoint) -> ScreenPoint {
        grid_to_screen(point, self.pan, self.zoom, self.config.cell_size)
    }

    /// The in-bounds cell under a screen point, if any.
    pub fn cell_at(&self, point: ScreenPoint) -> Option<CellCoord> {
        self.screen_to_grid(point).to_cell(self.dims)
    }

    pub fn cell_rect(&self, coord: CellCoord) -> Rect {
        let origin = self.grid_to_screen(coord.into());
        let scaled = self.scaled_cell();
        Rect::new(origin.x, origin.y, scaled, scaled)
    }

    /// Multiplies the zoom by `factor` around `anchor`. Returns false when the
    /// clamped zoom did not change.
    pub fn zoom_at(&mut self, factor: f64, anchor: ScreenPoint) -> bool {
        if factor.is_nan() || factor <= 0.0 {
            return false;
        }
        let old_zoom = self.zoom;
        let new_zoom = clamp_zoom(old_zoom * factor, self.config.min_zoom, self.config.max_zoom);
        if new_zoom == old_zoom {
            return false;
        }
        self.pan = zoom_around(anchor, old_zoom, new_zoom, self.pan, self.config.cell_size);
        self.zoom = new_zoom;
        true
    }

    pub fn wheel_zoom(&mut self, delta_y: f64, anchor: ScreenPoint) -> bool {
        let factor = if delta_y > 0.0 {
            self.config.wheel_zoom_out
        } else {
            self.config.wheel_zoom_in
        };
        self.zoom_at(factor, anchor)
    }

    pub fn zoom_in(&mut self) -> bool {
        let center = self.center();
        self.zoom_at(self.config.button_zoom_step, center)
    }

    pub fn zoom_out(&mut self) -> bool {
        let center = self.center();
        self.zoom_at(1.0 / self.config.button_zoom_step, center)
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan.x += dx;
        self.pan.y += dy;
    }

    pub fn reset(&mut self) {
        self.pan = ScreenPoint::default();
        self.zoom = clamp_zoom(1.0, self.config.min_zoom, self.config.max_zoom);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    /// Cells overlapping the surface, clamped to the grid.
    pub fn visible_window(&self) -> CellWindow {
        let scaled = self.scaled_cell();
        let clamp = |value: f64, limit: u32| value.max(0.0).min(limit as f64) as u32;
        let x0 = clamp((-self.pan.x / scaled).floor(), self.dims.width);
        let y0 = clamp((-self.pan.y / scaled).floor(), self.dims.height);
        let x1 = clamp(((self.width - self.pan.x) / scaled).ceil(), self.dims.width);
        let y1 = clamp(((self.height - self.pan.y) / scaled).ceil(), self.dims.height);
        CellWindow { x0, y0, x1, y1 }
    }
}
