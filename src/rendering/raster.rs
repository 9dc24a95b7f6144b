//! Software rasterizer: paint commands to RGBA pixels to PNG

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};

use crate::rendering::images::{encode_png, Bitmap, ImageSource};
use crate::rendering::layout::StatusGlyph;
use crate::rendering::paint::{char_advance, PaintCommand};
use crate::rendering::theme::Rgba;
use crate::rendering::Screenshot;
use crate::{Error, Result};

/// Supersampling factors accepted by [`rasterize`].
pub const SUPPORTED_SCALES: [u32; 2] = [1, 2];

/// Largest device-resolution edge (`canvas_size * scale`) the rasterizer accepts.
pub const MAX_DEVICE_SIZE: u32 = 8192;

/// Device-resolution edge for `size` at `scale`, if within [`MAX_DEVICE_SIZE`].
pub fn device_size(size: u32, scale: u32) -> Option<u32> {
    size.checked_mul(scale).filter(|&d| d > 0 && d <= MAX_DEVICE_SIZE)
}

// Glyphs missing from the bundled 8x8 tables.
const GLYPH_ELLIPSIS: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x49, 0x00];
const GLYPH_EURO: [u8; 8] = [0x3C, 0x42, 0x0F, 0x02, 0x0F, 0x42, 0x3C, 0x00];
const GLYPH_ARROW: [u8; 8] = [0x00, 0x10, 0x20, 0x7F, 0x20, 0x10, 0x00, 0x00];

/// Bitmap for `c`; `None` for characters the font cannot draw.
fn glyph_bits(c: char) -> Option<[u8; 8]> {
    match c {
        '…' => Some(GLYPH_ELLIPSIS),
        '€' => Some(GLYPH_EURO),
        '→' => Some(GLYPH_ARROW),
        _ => BASIC_FONTS.get(c).or_else(|| LATIN_FONTS.get(c)),
    }
}

/// RGBA8 drawing surface.
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }

    fn blend(&mut self, x: i64, y: i64, rgba: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = ((y as u32 * self.width + x as u32) * 4) as usize;
        let (r, g, b, a) = rgba;
        if a == 0 {
            return;
        }
        let dst = &mut self.pixels[i..i + 4];
        if a == 255 {
            dst.copy_from_slice(&[r, g, b, 255]);
            return;
        }
        let a32 = a as u32;
        let inv = 255 - a32;
        dst[0] = ((r as u32 * a32 + dst[0] as u32 * inv) / 255) as u8;
        dst[1] = ((g as u32 * a32 + dst[1] as u32 * inv) / 255) as u8;
        dst[2] = ((b as u32 * a32 + dst[2] as u32 * inv) / 255) as u8;
        dst[3] = (a32 + dst[3] as u32 * inv / 255) as u8;
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, rgba: Rgba) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width as i64).min(self.width as i64);
        let y1 = (y + height as i64).min(self.height as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, rgba);
            }
        }
    }

    pub fn vertical_gradient(&mut self, x: i64, y: i64, width: u32, height: u32, top: Rgba, bottom: Rgba) {
        let span = height.saturating_sub(1).max(1) as i64;
        let lerp = |a: u8, b: u8, t: i64| (a as i64 + (b as i64 - a as i64) * t / span) as u8;
        for row in 0..height as i64 {
            let color = (
                lerp(top.0, bottom.0, row),
                lerp(top.1, bottom.1, row),
                lerp(top.2, bottom.2, row),
                lerp(top.3, bottom.3, row),
            );
            self.fill_rect(x, y + row, width, 1, color);
        }
    }

    pub fn outline(&mut self, x: i64, y: i64, width: u32, height: u32, thickness: u32, rgba: Rgba) {
        let t = thickness.min(width / 2).min(height / 2);
        self.fill_rect(x, y, width, t, rgba);
        self.fill_rect(x, y + height as i64 - t as i64, width, t, rgba);
        self.fill_rect(x, y + t as i64, t, height - 2 * t, rgba);
        self.fill_rect(x + width as i64 - t as i64, y + t as i64, t, height - 2 * t, rgba);
    }

    pub fn dot(&mut self, cx: i64, cy: i64, radius: u32, rgba: Rgba) {
        let r = radius as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.blend(cx + dx, cy + dy, rgba);
                }
            }
        }
    }

    /// Draw `text` with its top-left corner at (x, y); `size` is the cell height
    /// and `advance` the cell width, both in device pixels.
    pub fn text(&mut self, x: i64, y: i64, size: u32, advance: u32, text: &str, rgba: Rgba) {
        if size == 0 || advance == 0 {
            return;
        }
        let mut cx = x;
        for c in text.chars() {
            if let Some(bits) = glyph_bits(c) {
                for py in 0..size {
                    let row = bits[(py * 8 / size) as usize];
                    if row == 0 {
                        continue;
                    }
                    for px in 0..advance {
                        let col = px * 8 / advance;
                        if row & (1 << col) != 0 {
                            self.blend(cx + px as i64, y + py as i64, rgba);
                        }
                    }
                }
            }
            cx += advance as i64;
        }
    }

    /// Scale `bitmap` into the box, preserving aspect ratio and centring it.
    pub fn image(&mut self, bitmap: &Bitmap, x: i64, y: i64, width: u32, height: u32) {
        if bitmap.width == 0 || bitmap.height == 0 || width == 0 || height == 0 {
            return;
        }
        let fit_w = (width as u64 * bitmap.height as u64) <= (height as u64 * bitmap.width as u64);
        let (dw, dh) = if fit_w {
            (width, ((bitmap.height as u64 * width as u64) / bitmap.width as u64).max(1) as u32)
        } else {
            (((bitmap.width as u64 * height as u64) / bitmap.height as u64).max(1) as u32, height)
        };
        let ox = x + (width - dw) as i64 / 2;
        let oy = y + (height - dh) as i64 / 2;
        for py in 0..dh {
            let sy = py * bitmap.height / dh;
            for px in 0..dw {
                let sx = px * bitmap.width / dw;
                let [r, g, b, a] = bitmap.pixel(sx, sy);
                self.blend(ox + px as i64, oy + py as i64, (r, g, b, a));
            }
        }
    }

    fn stroke(&mut self, from: (f32, f32), to: (f32, f32), thickness: u32, rgba: Rgba) {
        let steps = ((to.0 - from.0).abs().max((to.1 - from.1).abs()) as u32).max(1);
        let half = (thickness / 2) as i64;
        let mut last = None;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let px = (from.0 + (to.0 - from.0) * t).round() as i64;
            let py = (from.1 + (to.1 - from.1) * t).round() as i64;
            if last == Some((px, py)) {
                continue;
            }
            last = Some((px, py));
            for dy in -half..=half {
                for dx in -half..=half {
                    self.blend(px + dx, py + dy, rgba);
                }
            }
        }
    }

    pub fn status_glyph(&mut self, glyph: StatusGlyph, x: i64, y: i64, size: u32, rgba: Rgba) {
        let s = size as f32;
        let (x, y) = (x as f32, y as f32);
        let pen = (size / 7).max(2);
        match glyph {
            StatusGlyph::Check => {
                self.stroke((x + s * 0.1, y + s * 0.55), (x + s * 0.4, y + s * 0.85), pen, rgba);
                self.stroke((x + s * 0.4, y + s * 0.85), (x + s * 0.9, y + s * 0.15), pen, rgba);
            }
            StatusGlyph::Cross => {
                self.stroke((x + s * 0.15, y + s * 0.15), (x + s * 0.85, y + s * 0.85), pen, rgba);
                self.stroke((x + s * 0.85, y + s * 0.15), (x + s * 0.15, y + s * 0.85), pen, rgba);
            }
        }
    }

    /// Box-filter down by an integer factor.
    pub fn downscale(&self, factor: u32) -> Canvas {
        if factor <= 1 {
            return Canvas { width: self.width, height: self.height, pixels: self.pixels.clone() };
        }
        let w = self.width / factor;
        let h = self.height / factor;
        let area = factor * factor;
        let mut out = Canvas::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let mut acc = [0u32; 4];
                for sy in 0..factor {
                    for sx in 0..factor {
                        let p = self.pixel(x * factor + sx, y * factor + sy);
                        for (a, v) in acc.iter_mut().zip(p) {
                            *a += v as u32;
                        }
                    }
                }
                let i = ((y * w + x) * 4) as usize;
                for (c, a) in acc.iter().enumerate() {
                    out.pixels[i + c] = ((a + area / 2) / area) as u8;
                }
            }
        }
        out
    }
}

fn scaled(v: i32, scale: u32) -> i64 {
    v as i64 * scale as i64
}

/// Execute `commands` on a `size`×`size` canvas supersampled by `scale`,
/// then encode the result as PNG at `size`×`size`.
pub fn rasterize(commands: &[PaintCommand], size: u32, scale: u32, images: &dyn ImageSource) -> Result<Screenshot> {
    if !SUPPORTED_SCALES.contains(&scale) {
        return Err(Error::ConfigError(format!("unsupported render scale {} (expected 1 or 2)", scale)));
    }
    if size == 0 {
        return Err(Error::ConfigError("canvas size must be positive".into()));
    }
    if device_size(size, scale).is_none() {
        return Err(Error::RenderError(format!(
            "canvas {}px at scale {} exceeds {}px",
            size, scale, MAX_DEVICE_SIZE
        )));
    }
    let canvas = draw(commands, size, scale, images).downscale(scale);
    let png_data = encode_png(canvas.width, canvas.height, &canvas.pixels)?;
    Ok(Screenshot { width: canvas.width, height: canvas.height, png_data })
}

/// Draw at device resolution without encoding. Callers check [`device_size`].
fn draw(commands: &[PaintCommand], size: u32, scale: u32, images: &dyn ImageSource) -> Canvas {
    let mut canvas = Canvas::new(size * scale, size * scale);
    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { x, y, width, height, rgba } => {
                canvas.fill_rect(scaled(*x, scale), scaled(*y, scale), width * scale, height * scale, *rgba)
            }
            PaintCommand::VerticalGradient { x, y, width, height, top, bottom } => canvas.vertical_gradient(
                scaled(*x, scale),
                scaled(*y, scale),
                width * scale,
                height * scale,
                *top,
                *bottom,
            ),
            PaintCommand::RectOutline { x, y, width, height, thickness, rgba } => canvas.outline(
                scaled(*x, scale),
                scaled(*y, scale),
                width * scale,
                height * scale,
                thickness * scale,
                *rgba,
            ),
            PaintCommand::Text { x, y, size, text, rgba } => canvas.text(
                scaled(*x, scale),
                scaled(*y, scale),
                size * scale,
                char_advance(*size) * scale,
                text,
                *rgba,
            ),
            PaintCommand::Image { sources, x, y, width, height } => {
                match images.load_first(sources) {
                    Some(bitmap) => canvas.image(&bitmap, scaled(*x, scale), scaled(*y, scale), width * scale, height * scale),
                    None => log::trace!("no image for {:?}", sources),
                }
            }
            PaintCommand::Glyph { glyph, x, y, size, rgba } => {
                canvas.status_glyph(*glyph, scaled(*x, scale), scaled(*y, scale), size * scale, *rgba)
            }
            PaintCommand::Dot { cx, cy, radius, rgba } => {
                canvas.dot(scaled(*cx, scale), scaled(*cy, scale), radius * scale, *rgba)
            }
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::images::{decode_png, NoImages};

    const WHITE: Rgba = (255, 255, 255, 255);
    const RED: Rgba = (255, 0, 0, 255);

    #[test]
    fn rejects_unsupported_scale() {
        let err = rasterize(&[], 64, 3, &NoImages).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn rejects_oversized_canvas() {
        let err = rasterize(&[], 40_000, 2, &NoImages).unwrap_err();
        assert!(matches!(err, Error::RenderError(_)));
        let err = rasterize(&[], u32::MAX, 2, &NoImages).unwrap_err();
        assert!(matches!(err, Error::RenderError(_)));
        assert_eq!(device_size(1080, 2), Some(2160));
        assert_eq!(device_size(MAX_DEVICE_SIZE / 2 + 1, 2), None);
    }

    #[test]
    fn output_size_is_independent_of_scale() {
        let cmds = vec![PaintCommand::SolidRect { x: 0, y: 0, width: 32, height: 32, rgba: RED }];
        for scale in SUPPORTED_SCALES {
            let shot = rasterize(&cmds, 64, scale, &NoImages).unwrap();
            assert_eq!((shot.width, shot.height), (64, 64));
            assert_eq!(&shot.png_data[0..8], b"\x89PNG\r\n\x1a\n");
            let bmp = decode_png(&shot.png_data).unwrap();
            assert_eq!(bmp.pixel(10, 10), [255, 0, 0, 255]);
            assert_eq!(bmp.pixel(50, 50), [0, 0, 0, 0]);
        }
    }

    #[test]
    fn text_sets_pixels_inside_its_cell() {
        let mut canvas = Canvas::new(64, 32);
        canvas.text(0, 0, 16, 10, "€→…", WHITE);
        let lit = canvas.pixels().chunks(4).filter(|p| p[3] == 255).count();
        assert!(lit > 0);
        for y in 0..32 {
            for x in 30..64 {
                assert_eq!(canvas.pixel(x, y)[3], 0, "pixel {},{} outside text run", x, y);
            }
        }
        assert_eq!(canvas.pixel(0, 20)[3], 0);
    }

    #[test]
    fn unknown_chars_are_skipped() {
        assert!(glyph_bits('\u{4E00}').is_none());
        assert!(glyph_bits('Ú').is_some());
        assert!(glyph_bits('A').is_some());

        let mut canvas = Canvas::new(32, 16);
        canvas.text(0, 0, 16, 10, "\u{4E00}", WHITE);
        assert!(canvas.pixels().iter().all(|b| *b == 0));
    }

    #[test]
    fn half_alpha_blends() {
        let mut canvas = Canvas::new(1, 1);
        canvas.fill_rect(0, 0, 1, 1, WHITE);
        canvas.fill_rect(0, 0, 1, 1, (0, 0, 0, 128));
        let p = canvas.pixel(0, 0);
        assert!(p[0] > 120 && p[0] < 135, "{:?}", p);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn images_fit_and_clip() {
        let bmp = Bitmap { width: 2, height: 1, rgba: vec![255, 0, 0, 255, 0, 0, 255, 255] };
        let mut canvas = Canvas::new(8, 8);
        canvas.image(&bmp, 0, 0, 8, 8);
        // 2:1 image in a square box: 8x4 centred vertically
        assert_eq!(canvas.pixel(0, 1)[3], 0);
        assert_eq!(canvas.pixel(0, 3), [255, 0, 0, 255]);
        assert_eq!(canvas.pixel(7, 3), [0, 0, 255, 255]);
        canvas.image(&bmp, -100, -100, 8, 8);
    }

    #[test]
    fn missing_images_leave_slot_empty() {
        let cmds = vec![PaintCommand::Image { sources: vec!["/nope.png".into()], x: 0, y: 0, width: 8, height: 8 }];
        let canvas = draw(&cmds, 8, 1, &NoImages);
        assert!(canvas.pixels().iter().all(|b| *b == 0));
    }

    #[test]
    fn status_glyphs_draw() {
        let mut canvas = Canvas::new(40, 40);
        canvas.status_glyph(StatusGlyph::Cross, 0, 0, 40, RED);
        assert_eq!(canvas.pixel(20, 20), [255, 0, 0, 255]);
    }
}
