use std::collections::HashMap;

use image::Rgba;
use pixelbattle_core::{
    CellCoord, Color, GridDims, RasterSurface, RenderEngine, RenderStyle, ScreenPoint, ViewConfig,
};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

fn engine(width: u32, height: u32) -> RenderEngine<RasterSurface> {
    RenderEngine::new(
        RasterSurface::new(width, height),
        GridDims::default(),
        ViewConfig::default(),
        RenderStyle::default(),
    )
}

fn red() -> Color {
    Color::parse("#FF0000").unwrap()
}

#[test]
fn first_frame_paints_background_and_lines() {
    let mut engine = engine(40, 30);
    assert!(engine.needs_full_redraw());
    engine.on_frame();
    assert!(!engine.needs_full_redraw());
    assert_eq!(engine.surface().pixel(5, 5), Some(WHITE));
    // Grid lines are blended over white, so they are darker than the cell.
    let line = engine.surface().pixel(10, 5).unwrap();
    assert!(line[0] < 255 && line[0] > 200, "{line:?}");
}

#[test]
fn lines_hidden_below_threshold() {
    let mut engine = engine(40, 30);
    while engine.zoom_out() {}
    assert!(engine.viewport().zoom() < 0.5);
    engine.on_frame();
    assert_eq!(engine.surface().pixel(10, 5), Some(WHITE));
}

#[test]
fn set_pixel_then_get_pixel() {
    let mut engine = engine(40, 30);
    let coord = CellCoord::new(5, 5);
    assert_eq!(engine.get_pixel(coord), &Color::white());
    engine.set_pixel(coord, red()).unwrap();
    assert_eq!(engine.get_pixel(coord), &red());
}

#[test]
fn set_pixel_paints_incrementally() {
    let mut engine = engine(40, 30);
    engine.on_frame();
    engine.set_pixel(CellCoord::new(1, 1), red()).unwrap();
    assert!(!engine.needs_full_redraw());
    assert!(engine.frame_pending());
    engine.on_frame();
    assert_eq!(engine.surface().pixel(15, 15), Some(RED));
    assert!(!engine.needs_full_redraw());
}

#[test]
fn frame_requests_coalesce() {
    let mut engine = engine(40, 30);
    engine.set_pixel(CellCoord::new(0, 0), red()).unwrap();
    engine.set_pixel(CellCoord::new(1, 0), red()).unwrap();
    engine.pan_by(3.0, 0.0);
    assert_eq!(engine.surface().requested_frames(), 1);
    engine.on_frame();
    assert!(!engine.frame_pending());
    engine.set_pixel(CellCoord::new(2, 0), red()).unwrap();
    assert_eq!(engine.surface().requested_frames(), 2);
}

#[test]
fn set_grid_replaces_everything() {
    let mut engine = engine(40, 30);
    engine.set_pixel(CellCoord::new(0, 0), red()).unwrap();
    engine.on_frame();
    let mut cells = HashMap::new();
    cells.insert(CellCoord::new(2, 2), red());
    engine.set_grid(cells);
    assert!(engine.needs_full_redraw());
    engine.on_frame();
    assert_eq!(engine.surface().pixel(5, 5), Some(WHITE));
    assert_eq!(engine.surface().pixel(25, 25), Some(RED));
}

#[test]
fn hover_only_requests_frame_on_change() {
    let mut engine = engine(40, 30);
    engine.on_frame();
    let before = engine.surface().requested_frames();
    assert!(engine.set_hovered(Some(CellCoord::new(1, 1))));
    engine.on_frame();
    assert!(!engine.set_hovered(Some(CellCoord::new(1, 1))));
    assert_eq!(engine.surface().requested_frames(), before + 1);
}

#[test]
fn hover_draws_outline_and_preview() {
    let mut engine = engine(40, 30);
    engine.set_selected_color(Color::black());
    engine.set_hovered(Some(CellCoord::new(1, 1)));
    engine.on_frame();
    // Outline straddles the cell edge.
    assert_eq!(engine.surface().pixel(10, 15), Some(Rgba([0, 0, 0, 255])));
    let preview = engine.surface().pixel(15, 15).unwrap();
    assert!(preview[0] > 100 && preview[0] < 160, "{preview:?}");
    engine.set_hovered(None);
    engine.on_frame();
    assert_eq!(engine.surface().pixel(15, 15), Some(WHITE));
}

#[test]
fn pan_and_zoom_mark_buffers_dirty() {
    let mut engine = engine(40, 30);
    engine.on_frame();
    engine.pan_by(5.0, 0.0);
    assert!(engine.needs_full_redraw());
    engine.on_frame();
    assert!(engine.zoom_in());
    assert!(engine.needs_full_redraw());
    engine.on_frame();
    assert!(engine.wheel_zoom(1.0, ScreenPoint::new(10.0, 10.0)));
    assert!(engine.needs_full_redraw());
    engine.on_frame();
    engine.reset_view();
    assert!(engine.needs_full_redraw());
    assert_eq!(engine.viewport().zoom(), 1.0);
}

#[test]
fn resize_rebuilds_buffers() {
    let mut engine = engine(40, 30);
    engine.on_frame();
    engine.resize(60.0, 20.0);
    assert!(engine.needs_full_redraw());
    engine.on_frame();
    assert_eq!(engine.surface().frame().dimensions(), (60, 20));
    assert_eq!(engine.viewport().visible_window().x1, 6);
}

#[test]
fn off_grid_area_stays_clear() {
    let mut engine = engine(40, 30);
    engine.pan_by(20.0, 0.0);
    engine.on_frame();
    assert_eq!(engine.surface().pixel(5, 5), Some(Rgba([0, 0, 0, 0])));
    assert_eq!(engine.surface().pixel(25, 5), Some(WHITE));
}
