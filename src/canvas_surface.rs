use std::rc::Rc;

use gloo::render::{request_animation_frame, AnimationFrame};
use pixelbattle_core::{Color, DrawTarget, LineSegment, Rect, Surface};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
}

/// A canvas plus its 2D context. A layer whose canvas could not be created
/// draws nothing.
pub(crate) struct CanvasLayer {
    target: Option<(HtmlCanvasElement, CanvasRenderingContext2d)>,
}

impl CanvasLayer {
    fn attach(canvas: HtmlCanvasElement) -> Option<Self> {
        let ctx = context_2d(&canvas)?;
        Some(Self {
            target: Some((canvas, ctx)),
        })
    }

    fn offscreen(width: f64, height: f64) -> Self {
        let canvas = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.create_element("canvas").ok())
            .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok());
        let Some(canvas) = canvas else {
            tracing::warn!("failed to create off-screen canvas");
            return Self { target: None };
        };
        canvas.set_width(width.max(0.0) as u32);
        canvas.set_height(height.max(0.0) as u32);
        Self::attach(canvas).unwrap_or(Self { target: None })
    }

    fn size(&self) -> (f64, f64) {
        match &self.target {
            Some((canvas, _)) => (canvas.width() as f64, canvas.height() as f64),
            None => (0.0, 0.0),
        }
    }

    fn ctx(&self) -> Option<&CanvasRenderingContext2d> {
        self.target.as_ref().map(|(_, ctx)| ctx)
    }
}

impl DrawTarget for CanvasLayer {
    fn clear(&mut self) {
        let (width, height) = self.size();
        if let Some(ctx) = self.ctx() {
            ctx.clear_rect(0.0, 0.0, width, height);
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: &Color, alpha: f64) {
        let Some(ctx) = self.ctx() else {
            return;
        };
        ctx.set_global_alpha(alpha);
        ctx.set_fill_style_str(color.as_str());
        ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
        ctx.set_global_alpha(1.0);
    }

    fn stroke_rect(&mut self, rect: Rect, color: &Color, width: f64) {
        let Some(ctx) = self.ctx() else {
            return;
        };
        ctx.set_stroke_style_str(color.as_str());
        ctx.set_line_width(width);
        ctx.stroke_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn stroke_lines(&mut self, segments: &[LineSegment], color: &Color, width: f64) {
        let Some(ctx) = self.ctx() else {
            return;
        };
        ctx.set_stroke_style_str(color.as_str());
        ctx.set_line_width(width);
        ctx.begin_path();
        for segment in segments {
            ctx.move_to(segment.from.x, segment.from.y);
            ctx.line_to(segment.to.x, segment.to.y);
        }
        ctx.stroke();
    }
}

/// The visible canvas. Frames are scheduled with `requestAnimationFrame` and
/// delivered to the callback set by `set_frame_callback`.
pub(crate) struct CanvasSurface {
    visible: CanvasLayer,
    on_frame: Option<Rc<dyn Fn()>>,
    frame: Option<AnimationFrame>,
}

impl CanvasSurface {
    pub(crate) fn new(canvas: HtmlCanvasElement) -> Result<Self, String> {
        let visible = CanvasLayer::attach(canvas).ok_or("canvas has no 2d context")?;
        Ok(Self {
            visible,
            on_frame: None,
            frame: None,
        })
    }

    pub(crate) fn set_frame_callback(&mut self, callback: Rc<dyn Fn()>) {
        self.on_frame = Some(callback);
    }

    #[cfg(test)]
    pub(crate) fn context(&self) -> Option<&CanvasRenderingContext2d> {
        self.visible.ctx()
    }

    fn fit(&mut self, width: f64, height: f64) {
        let Some((canvas, _)) = &self.visible.target else {
            return;
        };
        let (width, height) = (width.max(0.0) as u32, height.max(0.0) as u32);
        if canvas.width() != width {
            canvas.set_width(width);
        }
        if canvas.height() != height {
            canvas.set_height(height);
        }
    }
}

impl DrawTarget for CanvasSurface {
    fn clear(&mut self) {
        self.visible.clear();
    }

    fn fill_rect(&mut self, rect: Rect, color: &Color, alpha: f64) {
        self.visible.fill_rect(rect, color, alpha);
    }

    fn stroke_rect(&mut self, rect: Rect, color: &Color, width: f64) {
        self.visible.stroke_rect(rect, color, width);
    }

    fn stroke_lines(&mut self, segments: &[LineSegment], color: &Color, width: f64) {
        self.visible.stroke_lines(segments, color, width);
    }
}

impl Surface for CanvasSurface {
    type Layer = CanvasLayer;

    fn size(&self) -> (f64, f64) {
        self.visible.size()
    }

    fn create_layer(&mut self, width: f64, height: f64) -> CanvasLayer {
        self.fit(width, height);
        CanvasLayer::offscreen(width, height)
    }

    fn draw_layer(&mut self, layer: &CanvasLayer) {
        let (Some(ctx), Some((canvas, _))) = (self.visible.ctx(), &layer.target) else {
            return;
        };
        let _ = ctx.draw_image_with_html_canvas_element(canvas, 0.0, 0.0);
    }

    fn request_frame(&mut self) {
        let Some(callback) = self.on_frame.clone() else {
            tracing::debug!("frame requested before a frame callback was set");
            return;
        };
        self.frame = Some(request_animation_frame(move |_timestamp| callback()));
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use pixelbattle_core::{CellCoord, GridDims, RenderEngine, RenderStyle, ViewConfig};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn canvas(width: u32, height: u32) -> HtmlCanvasElement {
        let document = web_sys::window().unwrap().document().unwrap();
        let canvas = document
            .create_element("canvas")
            .unwrap()
            .dyn_into::<HtmlCanvasElement>()
            .unwrap();
        canvas.set_width(width);
        canvas.set_height(height);
        canvas
    }

    fn rgb_at(surface: &CanvasSurface, x: f64, y: f64) -> [u8; 3] {
        let data = surface
            .context()
            .unwrap()
            .get_image_data(x, y, 1.0, 1.0)
            .unwrap()
            .data();
        [data[0], data[1], data[2]]
    }

    #[wasm_bindgen_test]
    fn frame_paints_cells_on_the_canvas() {
        let surface = CanvasSurface::new(canvas(60, 40)).unwrap();
        let mut engine = RenderEngine::new(
            surface,
            GridDims::default(),
            ViewConfig::default(),
            RenderStyle::default(),
        );
        engine
            .set_pixel(CellCoord::new(2, 1), Color::parse("#FF0000").unwrap())
            .unwrap();
        engine.on_frame();
        assert_eq!(rgb_at(engine.surface(), 25.0, 15.0), [255, 0, 0]);
        assert_eq!(rgb_at(engine.surface(), 45.0, 35.0), [255, 255, 255]);
    }

    #[wasm_bindgen_test]
    fn resize_refits_the_visible_canvas() {
        let surface = CanvasSurface::new(canvas(60, 40)).unwrap();
        let mut engine = RenderEngine::new(
            surface,
            GridDims::default(),
            ViewConfig::default(),
            RenderStyle::default(),
        );
        engine.resize(120.0, 80.0);
        assert_eq!(engine.surface().size(), (120.0, 80.0));
        assert!(engine.needs_full_redraw());
    }
}
