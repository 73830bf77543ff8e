use std::collections::HashMap;

use crate::color::Color;
use crate::config::{RenderStyle, ViewConfig};
use crate::grid::{CellCoord, GridDims, GridError, GridStore};
use crate::viewport::{CellWindow, GridPoint, Rect, ScreenPoint, Viewport};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    pub from: ScreenPoint,
    pub to: ScreenPoint,
}

/// Minimal 2D drawing vocabulary shared by the visible surface and its
/// off-screen layers.
pub trait DrawTarget {
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: &Color, alpha: f64);
    fn stroke_rect(&mut self, rect: Rect, color: &Color, width: f64);
    /// Strokes every segment as one path.
    fn stroke_lines(&mut self, segments: &[LineSegment], color: &Color, width: f64);
}

pub trait Surface: DrawTarget {
    type Layer: DrawTarget;

    fn size(&self) -> (f64, f64);
    fn create_layer(&mut self, width: f64, height: f64) -> Self::Layer;
    fn draw_layer(&mut self, layer: &Self::Layer);
    /// Asks the host to call `RenderEngine::on_frame` on the next refresh.
    fn request_frame(&mut self);
}

pub struct RenderEngine<S: Surface> {
    surface: S,
    content: S::Layer,
    lines: S::Layer,
    grid: GridStore,
    viewport: Viewport,
    style: RenderStyle,
    selected: Color,
    hovered: Option<CellCoord>,
    needs_full_redraw: bool,
    frame_pending: bool,
}

impl<S: Surface> RenderEngine<S> {
    pub fn new(mut surface: S, dims: GridDims, view: ViewConfig, style: RenderStyle) -> Self {
        let (width, height) = surface.size();
        let content = surface.create_layer(width, height);
        let lines = surface.create_layer(width, height);
        let mut viewport = Viewport::new(dims, view);
        viewport.resize(width, height);
        let grid = GridStore::with_background(dims, style.background.clone());
        Self {
            surface,
            content,
            lines,
            grid,
            viewport,
            style,
            selected: Color::black(),
            hovered: None,
            needs_full_redraw: true,
            frame_pending: false,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn grid(&self) -> &GridStore {
        &self.grid
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    pub fn needs_full_redraw(&self) -> bool {
        self.needs_full_redraw
    }

    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    pub fn selected_color(&self) -> &Color {
        &self.selected
    }

    pub fn set_selected_color(&mut self, color: Color) {
        self.selected = color;
        if self.hovered.is_some() {
            self.request_frame();
        }
    }

    pub fn hovered(&self) -> Option<CellCoord> {
        self.hovered
    }

    pub fn set_grid(&mut self, cells: HashMap<CellCoord, Color>) {
        self.grid.replace(cells);
        self.invalidate();
    }

    pub fn set_pixel(&mut self, coord: CellCoord, color: Color) -> Result<(), GridError> {
        self.grid.set_pixel(coord, color.clone())?;
        if !self.needs_full_redraw {
            let rect = self.viewport.cell_rect(coord);
            self.content.fill_rect(rect, &color, 1.0);
        }
        self.request_frame();
        Ok(())
    }

    pub fn get_pixel(&self, coord: CellCoord) -> &Color {
        self.grid.get_pixel(coord)
    }

    /// Coalesces redraw triggers into one pending frame.
    pub fn request_frame(&mut self) {
        if self.frame_pending {
            return;
        }
        self.frame_pending = true;
        self.surface.request_frame();
    }

    pub fn on_frame(&mut self) {
        self.frame_pending = false;
        if self.needs_full_redraw {
            self.redraw_buffers();
        }
        self.composite();
    }

    pub fn redraw_buffers(&mut self) {
        let window = self.viewport.visible_window();
        self.content.clear();
        self.lines.clear();
        self.needs_full_redraw = false;
        if window.is_empty() {
            return;
        }
        let scaled = self.viewport.scaled_cell();
        let origin = self
            .viewport
            .grid_to_screen(GridPoint::new(window.x0 as i64, window.y0 as i64));
        let extent = Rect::new(
            origin.x,
            origin.y,
            (window.x1 - window.x0) as f64 * scaled,
            (window.y1 - window.y0) as f64 * scaled,
        );
        self.content.fill_rect(extent, &self.style.background, 1.0);
        for (coord, color) in self.grid.cells_in(window.x0, window.y0, window.x1, window.y1) {
            self.content.fill_rect(self.viewport.cell_rect(*coord), color, 1.0);
        }
        if self.lines_visible() {
            let segments = grid_line_segments(&self.viewport, window);
            self.lines
                .stroke_lines(&segments, &self.style.line_color, self.style.line_width);
        }
    }

    pub fn composite(&mut self) {
        self.surface.clear();
        self.surface.draw_layer(&self.content);
        if self.lines_visible() {
            self.surface.draw_layer(&self.lines);
        }
        let Some(hovered) = self.hovered else {
            return;
        };
        if !self.viewport.visible_window().contains(hovered) {
            return;
        }
        let rect = self.viewport.cell_rect(hovered);
        self.surface.stroke_rect(
            rect,
            &self.style.hover_outline,
            self.style.hover_outline_width,
        );
        self.surface
            .fill_rect(rect, &self.selected, self.style.preview_alpha);
    }

    /// Returns true when the hovered cell changed and a frame was requested.
    pub fn set_hovered(&mut self, cell: Option<CellCoord>) -> bool {
        if self.hovered == cell {
            return false;
        }
        self.hovered = cell;
        self.request_frame();
        true
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.resize(width, height);
        self.content = self.surface.create_layer(width, height);
        self.lines = self.surface.create_layer(width, height);
        self.invalidate();
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.viewport.pan_by(dx, dy);
        self.invalidate();
    }

    pub fn wheel_zoom(&mut self, delta_y: f64, anchor: ScreenPoint) -> bool {
        let changed = self.viewport.wheel_zoom(delta_y, anchor);
        if changed {
            self.invalidate();
        }
        changed
    }

    pub fn zoom_in(&mut self) -> bool {
        let changed = self.viewport.zoom_in();
        if changed {
            self.invalidate();
        }
        changed
    }

    pub fn zoom_out(&mut self) -> bool {
        let changed = self.viewport.zoom_out();
        if changed {
            self.invalidate();
        }
        changed
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.needs_full_redraw = true;
        self.request_frame();
    }

    fn lines_visible(&self) -> bool {
        self.viewport.zoom() >= self.style.line_zoom_threshold
    }
}

fn grid_line_segments(viewport: &Viewport, window: CellWindow) -> Vec<LineSegment> {
    let top_left = viewport.grid_to_screen(GridPoint::new(window.x0 as i64, window.y0 as i64));
    let bottom_right = viewport.grid_to_screen(GridPoint::new(window.x1 as i64, window.y1 as i64));
    let columns = (window.x0..=window.x1).map(|x| {
        let sx = viewport.grid_to_screen(GridPoint::new(x as i64, 0)).x;
        LineSegment {
            from: ScreenPoint::new(sx, top_left.y),
            to: ScreenPoint::new(sx, bottom_right.y),
        }
    });
    let rows = (window.y0..=window.y1).map(|y| {
        let sy = viewport.grid_to_screen(GridPoint::new(0, y as i64)).y;
        LineSegment {
            from: ScreenPoint::new(top_left.x, sy),
            to: ScreenPoint::new(bottom_right.x, sy),
        }
    });
    columns.chain(rows).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        let mut view = Viewport::new(GridDims::default(), ViewConfig::default());
        view.resize(45.0, 25.0);
        view
    }

    #[test]
    fn line_segments_cover_window_edges() {
        let view = viewport();
        let window = view.visible_window();
        assert_eq!(window, CellWindow { x0: 0, y0: 0, x1: 5, y1: 3 });
        let segments = grid_line_segments(&view, window);
        assert_eq!(segments.len(), 6 + 4);
        assert_eq!(
            segments[0],
            LineSegment {
                from: ScreenPoint::new(0.0, 0.0),
                to: ScreenPoint::new(0.0, 30.0),
            }
        );
        let last = segments[segments.len() - 1];
        assert_eq!(last.from, ScreenPoint::new(0.0, 30.0));
        assert_eq!(last.to, ScreenPoint::new(50.0, 30.0));
    }

    #[test]
    fn horizontal_lines_follow_vertical_pan() {
        let mut view = viewport();
        view.pan_by(3.0, -4.0);
        let window = view.visible_window();
        let segments = grid_line_segments(&view, window);
        let columns = (window.x1 - window.x0 + 1) as usize;
        let first_column = segments[0];
        assert_eq!(first_column.from.y, -4.0);
        let first_row = segments[columns];
        assert_eq!(first_row.from.y, -4.0);
        assert_eq!(first_row.from.x, 3.0);
    }
}
