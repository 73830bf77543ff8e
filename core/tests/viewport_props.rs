use pixelbattle_core::viewport::{grid_to_screen, screen_to_grid, zoom_around};
use pixelbattle_core::{GridDims, GridPoint, ScreenPoint, ViewConfig, Viewport};
use proptest::prelude::*;

const CELL: f64 = 10.0;

#[derive(Clone, Debug)]
enum ViewOp {
    Wheel { delta: f64, x: f64, y: f64 },
    ZoomIn,
    ZoomOut,
    Pan { dx: f64, dy: f64 },
}

fn view_op() -> impl Strategy<Value = ViewOp> {
    prop_oneof![
        (-500.0..500.0f64, 0.0..800.0f64, 0.0..600.0f64)
            .prop_map(|(delta, x, y)| ViewOp::Wheel { delta, x, y }),
        Just(ViewOp::ZoomIn),
        Just(ViewOp::ZoomOut),
        (-300.0..300.0f64, -300.0..300.0f64).prop_map(|(dx, dy)| ViewOp::Pan { dx, dy }),
    ]
}

fn apply(view: &mut Viewport, op: &ViewOp) {
    match *op {
        ViewOp::Wheel { delta, x, y } => {
            view.wheel_zoom(delta, ScreenPoint::new(x, y));
        }
        ViewOp::ZoomIn => {
            view.zoom_in();
        }
        ViewOp::ZoomOut => {
            view.zoom_out();
        }
        ViewOp::Pan { dx, dy } => view.pan_by(dx, dy),
    }
}

fn continuous_grid(view: &Viewport, anchor: ScreenPoint) -> (f64, f64) {
    let scaled = view.scaled_cell();
    (
        (anchor.x - view.pan().x) / scaled,
        (anchor.y - view.pan().y) / scaled,
    )
}

proptest! {
    #[test]
    fn cell_centers_round_trip(
        gx in 0i64..1000,
        gy in 0i64..1000,
        pan_x in -10_000.0..10_000.0f64,
        pan_y in -10_000.0..10_000.0f64,
        zoom in 0.1..10.0f64,
    ) {
        let pan = ScreenPoint::new(pan_x, pan_y);
        let cell = GridPoint::new(gx, gy);
        let corner = grid_to_screen(cell, pan, zoom, CELL);
        let half = CELL * zoom * 0.5;
        let center = ScreenPoint::new(corner.x + half, corner.y + half);
        prop_assert_eq!(screen_to_grid(center, pan, zoom, CELL), cell);
    }

    #[test]
    fn zoom_stays_clamped(ops in proptest::collection::vec(view_op(), 1..60)) {
        let mut view = Viewport::new(GridDims::default(), ViewConfig::default());
        view.resize(800.0, 600.0);
        for op in &ops {
            apply(&mut view, op);
            prop_assert!(view.zoom() >= 0.1 && view.zoom() <= 10.0, "zoom {}", view.zoom());
        }
    }

    #[test]
    fn zoom_preserves_anchor(
        ops in proptest::collection::vec(view_op(), 0..20),
        delta in -200.0..200.0f64,
        ax in 0.0..800.0f64,
        ay in 0.0..600.0f64,
    ) {
        let mut view = Viewport::new(GridDims::default(), ViewConfig::default());
        view.resize(800.0, 600.0);
        for op in &ops {
            apply(&mut view, op);
        }
        let anchor = ScreenPoint::new(ax, ay);
        let before = continuous_grid(&view, anchor);
        view.wheel_zoom(delta, anchor);
        let after = continuous_grid(&view, anchor);
        prop_assert!((before.0 - after.0).abs() < 1e-6 * (1.0 + before.0.abs()));
        prop_assert!((before.1 - after.1).abs() < 1e-6 * (1.0 + before.1.abs()));
    }

    #[test]
    fn zoom_around_matches_closed_form(
        old_zoom in 0.1..10.0f64,
        new_zoom in 0.1..10.0f64,
        pan_x in -5000.0..5000.0f64,
        anchor_x in 0.0..1000.0f64,
    ) {
        let anchor = ScreenPoint::new(anchor_x, 0.0);
        let pan = zoom_around(anchor, old_zoom, new_zoom, ScreenPoint::new(pan_x, 0.0), CELL);
        let expected = anchor_x - (anchor_x - pan_x) * new_zoom / old_zoom;
        prop_assert!((pan.x - expected).abs() < 1e-6 * (1.0 + expected.abs()));
    }
}

#[test]
fn wheel_zoom_in_at_cursor() {
    let mut view = Viewport::new(GridDims::default(), ViewConfig::default());
    view.resize(800.0, 600.0);
    let anchor = ScreenPoint::new(100.0, 100.0);
    let before = continuous_grid(&view, anchor);
    view.wheel_zoom(-1.0, anchor);
    assert!((view.zoom() - 1.1).abs() < 1e-9);
    assert!((view.pan().x - -10.0).abs() < 1e-9);
    assert!((view.pan().y - -10.0).abs() < 1e-9);
    let after = continuous_grid(&view, anchor);
    assert!((before.0 - after.0).abs() < 1e-9);
    assert!((before.1 - after.1).abs() < 1e-9);
}
