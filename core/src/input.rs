use crate::protocol::WriteIntent;
use crate::render::{RenderEngine, Surface};
use crate::viewport::{GridPoint, ScreenPoint};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
    Other(i16),
}

impl PointerButton {
    /// Maps a DOM `MouseEvent.button` value.
    pub fn from_dom(button: i16) -> Self {
        match button {
            0 => PointerButton::Primary,
            1 => PointerButton::Middle,
            2 => PointerButton::Secondary,
            other => PointerButton::Other(other),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Turns raw pointer events on the canvas into pan, zoom, hover and write
/// intents.
#[derive(Clone, Debug)]
pub struct CanvasInput {
    throttle_ms: f64,
    dragging: bool,
    last_drag: ScreenPoint,
    last_move_ms: Option<f64>,
    pending_hover: Option<ScreenPoint>,
}

impl CanvasInput {
    pub fn new(throttle_ms: u64) -> Self {
        Self {
            throttle_ms: throttle_ms as f64,
            dragging: false,
            last_drag: ScreenPoint::default(),
            last_move_ms: None,
            pending_hover: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Secondary button, or primary with Ctrl, starts a pan. Returns true when
    /// the event was consumed.
    pub fn pointer_down(
        &mut self,
        position: ScreenPoint,
        button: PointerButton,
        modifiers: InputModifiers,
    ) -> bool {
        let pans = match button {
            PointerButton::Secondary => true,
            PointerButton::Primary => modifiers.ctrl,
            _ => false,
        };
        if pans {
            self.dragging = true;
            self.last_drag = position;
        }
        pans
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    /// Handles a move at `now_ms`. Moves inside the throttle window are
    /// dropped. Returns the grid point under the pointer when hover was
    /// recomputed, for the coordinate readout.
    pub fn pointer_move<S: Surface>(
        &mut self,
        engine: &mut RenderEngine<S>,
        position: ScreenPoint,
        now_ms: f64,
    ) -> Option<GridPoint> {
        if let Some(last) = self.last_move_ms {
            if now_ms - last < self.throttle_ms {
                return None;
            }
        }
        self.last_move_ms = Some(now_ms);
        if self.dragging {
            engine.pan_by(position.x - self.last_drag.x, position.y - self.last_drag.y);
            self.last_drag = position;
            return None;
        }
        Some(update_hover(engine, position))
    }

    /// A click places a pixel unless it ended a pan or Ctrl is held.
    pub fn click<S: Surface>(
        &self,
        engine: &RenderEngine<S>,
        position: ScreenPoint,
        modifiers: InputModifiers,
    ) -> Option<WriteIntent> {
        if self.dragging || modifiers.ctrl {
            return None;
        }
        let cell = engine.viewport().cell_at(position)?;
        Some(WriteIntent::new(cell, engine.selected_color().clone()))
    }

    /// Zooms around the cursor. Hover is refreshed later by `settle_hover`
    /// once the wheel goes quiet.
    pub fn wheel<S: Surface>(
        &mut self,
        engine: &mut RenderEngine<S>,
        delta_y: f64,
        position: ScreenPoint,
    ) -> bool {
        self.pending_hover = Some(position);
        engine.wheel_zoom(delta_y, position)
    }

    pub fn settle_hover<S: Surface>(&mut self, engine: &mut RenderEngine<S>) -> Option<GridPoint> {
        let position = self.pending_hover.take()?;
        Some(update_hover(engine, position))
    }

    pub fn leave<S: Surface>(&mut self, engine: &mut RenderEngine<S>) {
        self.dragging = false;
        self.pending_hover = None;
        engine.set_hovered(None);
    }
}

fn update_hover<S: Surface>(engine: &mut RenderEngine<S>, position: ScreenPoint) -> GridPoint {
    let point = engine.viewport().screen_to_grid(position);
    let cell = point.to_cell(engine.viewport().dims());
    engine.set_hovered(cell);
    point
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::config::{RenderStyle, ViewConfig};
    use crate::grid::{CellCoord, GridDims};
    use crate::raster::RasterSurface;

    fn engine() -> RenderEngine<RasterSurface> {
        RenderEngine::new(
            RasterSurface::new(200, 100),
            GridDims::default(),
            ViewConfig::default(),
            RenderStyle::default(),
        )
    }

    fn ctrl() -> InputModifiers {
        InputModifiers {
            ctrl: true,
            ..InputModifiers::default()
        }
    }

    #[test]
    fn click_emits_selected_color() {
        let mut engine = engine();
        engine.set_selected_color(Color::parse("#00FF00").unwrap());
        let input = CanvasInput::new(16);
        let intent = input
            .click(&engine, ScreenPoint::new(55.0, 21.0), InputModifiers::default())
            .unwrap();
        assert_eq!(intent.coord(), CellCoord::new(5, 2));
        assert_eq!(intent.color.as_str(), "#00FF00");
    }

    #[test]
    fn ctrl_click_and_outside_click_do_nothing() {
        let mut engine = engine();
        let input = CanvasInput::new(16);
        assert!(input.click(&engine, ScreenPoint::new(5.0, 5.0), ctrl()).is_none());
        engine.pan_by(50.0, 0.0);
        assert!(input
            .click(&engine, ScreenPoint::new(10.0, 5.0), InputModifiers::default())
            .is_none());
    }

    #[test]
    fn secondary_drag_pans() {
        let mut engine = engine();
        let mut input = CanvasInput::new(16);
        assert!(input.pointer_down(
            ScreenPoint::new(10.0, 10.0),
            PointerButton::Secondary,
            InputModifiers::default()
        ));
        input.pointer_move(&mut engine, ScreenPoint::new(30.0, 5.0), 0.0);
        assert_eq!(engine.viewport().pan(), ScreenPoint::new(20.0, -5.0));
        assert!(input
            .click(&engine, ScreenPoint::new(50.0, 50.0), InputModifiers::default())
            .is_none());
        input.pointer_up();
        assert!(!input.is_dragging());
    }

    #[test]
    fn plain_primary_does_not_pan() {
        let mut input = CanvasInput::new(16);
        assert!(!input.pointer_down(
            ScreenPoint::default(),
            PointerButton::Primary,
            InputModifiers::default()
        ));
        assert!(input.pointer_down(ScreenPoint::default(), PointerButton::Primary, ctrl()));
    }

    #[test]
    fn moves_inside_throttle_window_are_dropped() {
        let mut engine = engine();
        let mut input = CanvasInput::new(16);
        let first = input.pointer_move(&mut engine, ScreenPoint::new(15.0, 15.0), 100.0);
        assert_eq!(first, Some(GridPoint::new(1, 1)));
        assert_eq!(engine.hovered(), Some(CellCoord::new(1, 1)));
        assert_eq!(input.pointer_move(&mut engine, ScreenPoint::new(45.0, 15.0), 110.0), None);
        assert_eq!(engine.hovered(), Some(CellCoord::new(1, 1)));
        input.pointer_move(&mut engine, ScreenPoint::new(45.0, 15.0), 116.0);
        assert_eq!(engine.hovered(), Some(CellCoord::new(4, 1)));
    }

    #[test]
    fn hover_outside_grid_reports_coordinates_but_clears_cell() {
        let mut engine = engine();
        engine.pan_by(100.0, 0.0);
        let mut input = CanvasInput::new(16);
        let point = input.pointer_move(&mut engine, ScreenPoint::new(85.0, 5.0), 0.0);
        assert_eq!(point, Some(GridPoint::new(-2, 0)));
        assert_eq!(engine.hovered(), None);
    }

    #[test]
    fn wheel_defers_hover_until_settled() {
        let mut engine = engine();
        let mut input = CanvasInput::new(16);
        assert!(input.wheel(&mut engine, -120.0, ScreenPoint::new(100.0, 50.0)));
        assert_eq!(engine.hovered(), None);
        assert!(input.settle_hover(&mut engine).is_some());
        assert!(engine.hovered().is_some());
        assert!(input.settle_hover(&mut engine).is_none());
    }

    #[test]
    fn leave_ends_drag_and_hover() {
        let mut engine = engine();
        let mut input = CanvasInput::new(16);
        input.pointer_move(&mut engine, ScreenPoint::new(5.0, 5.0), 0.0);
        input.pointer_down(ScreenPoint::default(), PointerButton::Secondary, InputModifiers::default());
        input.leave(&mut engine);
        assert!(!input.is_dragging());
        assert_eq!(engine.hovered(), None);
    }
}
