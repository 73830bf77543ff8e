use image::{Pixel, Rgba, RgbaImage};

use crate::color::Color;
use crate::render::{DrawTarget, LineSegment, Surface};
use crate::viewport::Rect;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// CPU-side layer backed by an RGBA image.
pub struct RasterLayer {
    image: RgbaImage,
}

impl RasterLayer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, TRANSPARENT),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.image.get_pixel_checked(x, y).copied()
    }

    fn blend_span(&mut self, rect: Rect, source: Rgba<u8>) {
        let (width, height) = self.image.dimensions();
        let x0 = rect.x.round().max(0.0) as u32;
        let y0 = rect.y.round().max(0.0) as u32;
        let x1 = (rect.x + rect.width).round().clamp(0.0, width as f64) as u32;
        let y1 = (rect.y + rect.height).round().clamp(0.0, height as f64) as u32;
        for y in y0..y1 {
            for x in x0..x1 {
                self.image.get_pixel_mut(x, y).blend(&source);
            }
        }
    }

    fn plot(&mut self, x: f64, y: f64, source: Rgba<u8>) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if let Some(pixel) = self.image.get_pixel_mut_checked(x, y) {
            pixel.blend(&source);
        }
    }
}

fn rgba(color: &Color, alpha: f64) -> Rgba<u8> {
    let (r, g, b) = color.rgb();
    Rgba([r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
}

impl DrawTarget for RasterLayer {
    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = TRANSPARENT;
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: &Color, alpha: f64) {
        self.blend_span(rect, rgba(color, alpha));
    }

    fn stroke_rect(&mut self, rect: Rect, color: &Color, width: f64) {
        let source = rgba(color, 1.0);
        let half = width * 0.5;
        let edges = [
            Rect::new(rect.x - half, rect.y - half, rect.width + width, width),
            Rect::new(rect.x - half, rect.y + rect.height - half, rect.width + width, width),
            Rect::new(rect.x - half, rect.y + half, width, rect.height - width),
            Rect::new(rect.x + rect.width - half, rect.y + half, width, rect.height - width),
        ];
        for edge in edges {
            self.blend_span(edge, source);
        }
    }

    fn stroke_lines(&mut self, segments: &[LineSegment], color: &Color, width: f64) {
        // Sub-pixel widths become partial coverage.
        let source = rgba(color, width.min(1.0));
        for segment in segments {
            let dx = segment.to.x - segment.from.x;
            let dy = segment.to.y - segment.from.y;
            let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
            for step in 0..steps {
                let t = step as f64 / steps as f64;
                self.plot(segment.from.x + dx * t, segment.from.y + dy * t, source);
            }
        }
    }
}

/// Headless surface; frame requests are counted instead of scheduled.
pub struct RasterSurface {
    frame: RasterLayer,
    requested_frames: usize,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: RasterLayer::new(width, height),
            requested_frames: 0,
        }
    }

    pub fn frame(&self) -> &RgbaImage {
        self.frame.image()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.frame.pixel(x, y)
    }

    pub fn requested_frames(&self) -> usize {
        self.requested_frames
    }

    pub fn into_image(self) -> RgbaImage {
        self.frame.image
    }
}

impl DrawTarget for RasterSurface {
    fn clear(&mut self) {
        self.frame.clear();
    }

    fn fill_rect(&mut self, rect: Rect, color: &Color, alpha: f64) {
        self.frame.fill_rect(rect, color, alpha);
    }

    fn stroke_rect(&mut self, rect: Rect, color: &Color, width: f64) {
        self.frame.stroke_rect(rect, color, width);
    }

    fn stroke_lines(&mut self, segments: &[LineSegment], color: &Color, width: f64) {
        self.frame.stroke_lines(segments, color, width);
    }
}

impl Surface for RasterSurface {
    type Layer = RasterLayer;

    fn size(&self) -> (f64, f64) {
        let (width, height) = self.frame.image.dimensions();
        (width as f64, height as f64)
    }

    fn create_layer(&mut self, width: f64, height: f64) -> RasterLayer {
        let (current_w, current_h) = self.frame.image.dimensions();
        let (width, height) = (width.max(0.0) as u32, height.max(0.0) as u32);
        if (width, height) != (current_w, current_h) {
            self.frame = RasterLayer::new(width, height);
        }
        RasterLayer::new(width, height)
    }

    fn draw_layer(&mut self, layer: &RasterLayer) {
        image::imageops::overlay(&mut self.frame.image, &layer.image, 0, 0);
    }

    fn request_frame(&mut self) {
        self.requested_frames += 1;
    }
}
