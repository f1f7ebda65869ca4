//! Shared mutable pixel-buffer handles.
//!
//! A `Sprite` is a cheap-to-clone handle; every clone sees the same
//! buffer. Mutations bump a version counter and raise the redraw flags
//! of any watching worlds, which is how image edits propagate to
//! rendering without the sprite knowing who displays it.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use image::{imageops, Rgba, RgbaImage};

use crate::font;

pub const PLACEHOLDER_WIDTH: u32 = 100;
pub const PLACEHOLDER_HEIGHT: u32 = 20;
const PLACEHOLDER_COLOR: [u8; 4] = [200, 200, 200, 255];
const DEFAULT_DRAW_COLOR: [u8; 4] = [0, 0, 0, 255];
const DEFAULT_TEXT_SCALE: u32 = 2;
const TEXT_PADDING_CELLS: u32 = 2;

struct SpriteData {
    name: String,
    buffer: RgbaImage,
    draw_color: [u8; 4],
    text_scale: u32,
    version: u64,
    watchers: Vec<Weak<Cell<bool>>>,
}

#[derive(Clone)]
pub struct Sprite {
    inner: Rc<RefCell<SpriteData>>,
}

impl Sprite {
    /// Blank fully transparent sprite.
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_buffer("", RgbaImage::new(width.max(1), height.max(1)))
    }

    pub(crate) fn from_buffer(name: &str, buffer: RgbaImage) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SpriteData {
                name: name.to_string(),
                buffer,
                draw_color: DEFAULT_DRAW_COLOR,
                text_scale: DEFAULT_TEXT_SCALE,
                version: 0,
                watchers: Vec::new(),
            })),
        }
    }

    /// Stand-in used when an image cannot be resolved.
    pub fn placeholder() -> Self {
        let buffer = RgbaImage::from_pixel(
            PLACEHOLDER_WIDTH,
            PLACEHOLDER_HEIGHT,
            Rgba(PLACEHOLDER_COLOR),
        );
        Self::from_buffer("", buffer)
    }

    /// Sprite sized to fit `text`, rendered in `foreground` over an
    /// optional `background` fill.
    pub fn from_text(text: &str, scale: u32, foreground: [u8; 4], background: Option<[u8; 4]>) -> Self {
        let scale = scale.max(1);
        let pad = TEXT_PADDING_CELLS * scale;
        let width = font::text_width(text, scale) + pad * 2;
        let height = font::text_height(scale) + pad * 2;
        let fill = background.unwrap_or([0, 0, 0, 0]);
        let mut buffer = RgbaImage::from_pixel(width.max(1), height.max(1), Rgba(fill));
        font::draw_text(&mut buffer, pad as i32, pad as i32, text, scale, foreground);
        let sprite = Self::from_buffer("", buffer);
        sprite.set_text_scale(scale);
        sprite
    }

    /// Deep copy: fresh buffer, no watchers.
    pub fn duplicate(&self) -> Self {
        let data = self.inner.borrow();
        let copy = Self::from_buffer(&data.name, data.buffer.clone());
        copy.set_draw_color(data.draw_color);
        copy.set_text_scale(data.text_scale);
        copy
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    pub fn width(&self) -> u32 {
        self.inner.borrow().buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.borrow().buffer.height()
    }

    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    pub fn ptr_eq(&self, other: &Sprite) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn draw_color(&self) -> [u8; 4] {
        self.inner.borrow().draw_color
    }

    pub fn set_draw_color(&self, color: [u8; 4]) {
        self.inner.borrow_mut().draw_color = color;
    }

    pub fn text_scale(&self) -> u32 {
        self.inner.borrow().text_scale
    }

    pub fn set_text_scale(&self, scale: u32) {
        self.inner.borrow_mut().text_scale = scale.max(1);
    }

    pub fn pixel_at(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let data = self.inner.borrow();
        if x < data.buffer.width() && y < data.buffer.height() {
            Some(data.buffer.get_pixel(x, y).0)
        } else {
            None
        }
    }

    pub fn set_pixel_at(&self, x: u32, y: u32, color: [u8; 4]) {
        self.mutate(|data| {
            if x < data.buffer.width() && y < data.buffer.height() {
                data.buffer.put_pixel(x, y, Rgba(color));
            }
        });
    }

    /// Fills the whole buffer with the current draw color.
    pub fn fill(&self) {
        self.mutate(|data| {
            let color = Rgba(data.draw_color);
            for pixel in data.buffer.pixels_mut() {
                *pixel = color;
            }
        });
    }

    /// Resets every pixel to fully transparent.
    pub fn clear(&self) {
        self.mutate(|data| {
            for pixel in data.buffer.pixels_mut() {
                *pixel = Rgba([0, 0, 0, 0]);
            }
        });
    }

    pub fn fill_rect(&self, x: i32, y: i32, width: i32, height: i32) {
        self.mutate(|data| {
            let color = data.draw_color;
            fill_rect_raw(&mut data.buffer, x, y, width, height, color);
        });
    }

    pub fn draw_rect(&self, x: i32, y: i32, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        self.mutate(|data| {
            let color = data.draw_color;
            fill_rect_raw(&mut data.buffer, x, y, width, 1, color);
            fill_rect_raw(&mut data.buffer, x, y + height - 1, width, 1, color);
            fill_rect_raw(&mut data.buffer, x, y, 1, height, color);
            fill_rect_raw(&mut data.buffer, x + width - 1, y, 1, height, color);
        });
    }

    pub fn fill_oval(&self, x: i32, y: i32, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        self.mutate(|data| {
            let color = Rgba(data.draw_color);
            let rx = width as f64 / 2.0;
            let ry = height as f64 / 2.0;
            let cx = x as f64 + rx;
            let cy = y as f64 + ry;
            let (bw, bh) = (data.buffer.width() as i32, data.buffer.height() as i32);
            for py in y.max(0)..(y + height).min(bh) {
                for px in x.max(0)..(x + width).min(bw) {
                    let nx = (px as f64 + 0.5 - cx) / rx;
                    let ny = (py as f64 + 0.5 - cy) / ry;
                    if nx * nx + ny * ny <= 1.0 {
                        data.buffer.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        });
    }

    pub fn draw_oval(&self, x: i32, y: i32, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        self.mutate(|data| {
            let color = data.draw_color;
            let rx = (width as f64 - 1.0) / 2.0;
            let ry = (height as f64 - 1.0) / 2.0;
            let cx = x as f64 + width as f64 / 2.0;
            let cy = y as f64 + height as f64 / 2.0;
            let steps = ((width + height) * 4).max(16);
            for step in 0..steps {
                let theta = step as f64 / steps as f64 * std::f64::consts::TAU;
                let px = (cx + rx * theta.cos() - 0.5).round() as i32;
                let py = (cy + ry * theta.sin() - 0.5).round() as i32;
                put_pixel_clipped(&mut data.buffer, px, py, color);
            }
        });
    }

    pub fn draw_line(&self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.mutate(|data| {
            let color = data.draw_color;
            draw_line_raw(&mut data.buffer, x1, y1, x2, y2, color);
        });
    }

    pub fn draw_polygon(&self, xs: &[i32], ys: &[i32]) {
        let count = xs.len().min(ys.len());
        if count < 2 {
            return;
        }
        self.mutate(|data| {
            let color = data.draw_color;
            for i in 0..count {
                let j = (i + 1) % count;
                draw_line_raw(&mut data.buffer, xs[i], ys[i], xs[j], ys[j], color);
            }
        });
    }

    /// Even-odd scanline fill.
    pub fn fill_polygon(&self, xs: &[i32], ys: &[i32]) {
        let count = xs.len().min(ys.len());
        if count < 3 {
            return;
        }
        self.mutate(|data| {
            let color = Rgba(data.draw_color);
            let min_y = ys[..count].iter().copied().min().unwrap_or(0).max(0);
            let max_y = ys[..count]
                .iter()
                .copied()
                .max()
                .unwrap_or(0)
                .min(data.buffer.height() as i32 - 1);
            for py in min_y..=max_y {
                let scan = py as f64 + 0.5;
                let mut crossings = Vec::new();
                for i in 0..count {
                    let j = (i + 1) % count;
                    let (y1, y2) = (ys[i] as f64, ys[j] as f64);
                    if (y1 <= scan && y2 > scan) || (y2 <= scan && y1 > scan) {
                        let t = (scan - y1) / (y2 - y1);
                        crossings.push(xs[i] as f64 + t * (xs[j] as f64 - xs[i] as f64));
                    }
                }
                crossings.sort_by(|a, b| a.total_cmp(b));
                for pair in crossings.chunks_exact(2) {
                    let start = pair[0].round().max(0.0) as i32;
                    let end = pair[1].round().min(data.buffer.width() as f64) as i32;
                    for px in start..end {
                        data.buffer.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        });
    }

    /// Draws `text` with its top-left at `(x, y)` using the draw color
    /// and the sprite's text scale.
    pub fn draw_string(&self, text: &str, x: i32, y: i32) {
        self.mutate(|data| {
            let color = data.draw_color;
            let scale = data.text_scale;
            font::draw_text(&mut data.buffer, x, y, text, scale, color);
        });
    }

    /// Alpha-composites `source` onto this sprite with its top-left at
    /// `(x, y)`. Compositing a sprite onto itself is allowed.
    pub fn draw_image(&self, source: &Sprite, x: i32, y: i32) {
        let src = source.inner.borrow().buffer.clone();
        self.mutate(|data| {
            for (sx, sy, pixel) in src.enumerate_pixels() {
                let px = x + sx as i32;
                let py = y + sy as i32;
                if px < 0
                    || py < 0
                    || px >= data.buffer.width() as i32
                    || py >= data.buffer.height() as i32
                {
                    continue;
                }
                let dst = data.buffer.get_pixel_mut(px as u32, py as u32);
                *dst = Rgba(blend(dst.0, pixel.0));
            }
        });
    }

    /// Nearest-neighbor resize into a fresh buffer.
    pub fn scale(&self, width: u32, height: u32) {
        self.mutate(|data| {
            data.buffer = imageops::resize(
                &data.buffer,
                width.max(1),
                height.max(1),
                imageops::FilterType::Nearest,
            );
        });
    }

    pub fn mirror_horizontally(&self) {
        self.mutate(|data| {
            data.buffer = imageops::flip_horizontal(&data.buffer);
        });
    }

    pub fn mirror_vertically(&self) {
        self.mutate(|data| {
            data.buffer = imageops::flip_vertical(&data.buffer);
        });
    }

    /// Rotates the content about the buffer center into a fresh buffer
    /// of the same size; corners that leave the canvas are clipped.
    pub fn rotate(&self, degrees: i32) {
        self.mutate(|data| {
            let (width, height) = (data.buffer.width(), data.buffer.height());
            let cx = width as f64 / 2.0;
            let cy = height as f64 / 2.0;
            let radians = (degrees as f64).to_radians();
            let (sin, cos) = radians.sin_cos();
            let mut rotated = RgbaImage::new(width, height);
            for (dx, dy, pixel) in rotated.enumerate_pixels_mut() {
                let ox = dx as f64 + 0.5 - cx;
                let oy = dy as f64 + 0.5 - cy;
                // Inverse mapping: rotate destination back into source space.
                let sx = ox * cos + oy * sin + cx;
                let sy = -ox * sin + oy * cos + cy;
                let sx = sx.floor() as i32;
                let sy = sy.floor() as i32;
                if sx >= 0 && sy >= 0 && (sx as u32) < width && (sy as u32) < height {
                    *pixel = *data.buffer.get_pixel(sx as u32, sy as u32);
                }
            }
            data.buffer = rotated;
        });
    }

    pub(crate) fn with_buffer<R>(&self, f: impl FnOnce(&RgbaImage) -> R) -> R {
        f(&self.inner.borrow().buffer)
    }

    pub(crate) fn watch(&self, flag: &Rc<Cell<bool>>) {
        self.inner.borrow_mut().watchers.push(Rc::downgrade(flag));
    }

    pub(crate) fn unwatch(&self, flag: &Rc<Cell<bool>>) {
        let mut data = self.inner.borrow_mut();
        if let Some(index) = data.watchers.iter().position(|watcher| {
            watcher
                .upgrade()
                .is_some_and(|live| Rc::ptr_eq(&live, flag))
        }) {
            data.watchers.swap_remove(index);
        }
    }

    fn mutate(&self, f: impl FnOnce(&mut SpriteData)) {
        let mut data = self.inner.borrow_mut();
        f(&mut data);
        data.version += 1;
        data.watchers.retain(|watcher| match watcher.upgrade() {
            Some(flag) => {
                flag.set(true);
                true
            }
            None => false,
        });
    }
}

fn blend(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let alpha = src[3] as u32;
    if alpha == 255 {
        return src;
    }
    if alpha == 0 {
        return dst;
    }
    let inv = 255 - alpha;
    let out_alpha = alpha + dst[3] as u32 * inv / 255;
    let channel = |s: u8, d: u8| ((s as u32 * alpha + d as u32 * inv) / 255) as u8;
    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        out_alpha.min(255) as u8,
    ]
}

fn put_pixel_clipped(buffer: &mut RgbaImage, x: i32, y: i32, color: [u8; 4]) {
    if x >= 0 && y >= 0 && (x as u32) < buffer.width() && (y as u32) < buffer.height() {
        buffer.put_pixel(x as u32, y as u32, Rgba(color));
    }
}

fn fill_rect_raw(buffer: &mut RgbaImage, x: i32, y: i32, width: i32, height: i32, color: [u8; 4]) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = (x + width).min(buffer.width() as i32);
    let end_y = (y + height).min(buffer.height() as i32);
    for py in start_y..end_y {
        for px in start_x..end_x {
            buffer.put_pixel(px as u32, py as u32, Rgba(color));
        }
    }
}

fn draw_line_raw(buffer: &mut RgbaImage, x1: i32, y1: i32, x2: i32, y2: i32, color: [u8; 4]) {
    let dx = (x2 - x1).abs();
    let dy = -(y2 - y1).abs();
    let sx = if x1 < x2 { 1 } else { -1 };
    let sy = if y1 < y2 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x1, y1);
    loop {
        put_pixel_clipped(buffer, x, y, color);
        if x == x2 && y == y2 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += sx;
        }
        if doubled <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];

    #[test]
    fn new_sprite_is_transparent_at_requested_size() {
        let sprite = Sprite::new(8, 4);
        assert_eq!(sprite.width(), 8);
        assert_eq!(sprite.height(), 4);
        assert_eq!(sprite.pixel_at(3, 2), Some([0, 0, 0, 0]));
        assert_eq!(sprite.pixel_at(8, 0), None);
    }

    #[test]
    fn placeholder_has_the_stand_in_dimensions() {
        let sprite = Sprite::placeholder();
        assert_eq!(sprite.width(), PLACEHOLDER_WIDTH);
        assert_eq!(sprite.height(), PLACEHOLDER_HEIGHT);
        assert_eq!(sprite.pixel_at(0, 0), Some(PLACEHOLDER_COLOR));
    }

    #[test]
    fn clones_share_the_buffer_but_duplicates_do_not() {
        let sprite = Sprite::new(4, 4);
        let alias = sprite.clone();
        let copy = sprite.duplicate();
        sprite.set_draw_color(RED);
        sprite.fill();
        assert_eq!(alias.pixel_at(0, 0), Some(RED));
        assert_eq!(copy.pixel_at(0, 0), Some([0, 0, 0, 0]));
        assert!(sprite.ptr_eq(&alias));
        assert!(!sprite.ptr_eq(&copy));
    }

    #[test]
    fn mutations_bump_the_version_and_raise_watcher_flags() {
        let sprite = Sprite::new(4, 4);
        let flag = Rc::new(Cell::new(false));
        sprite.watch(&flag);
        let before = sprite.version();
        sprite.fill_rect(0, 0, 2, 2);
        assert!(sprite.version() > before);
        assert!(flag.get());

        flag.set(false);
        sprite.unwatch(&flag);
        sprite.fill_rect(0, 0, 1, 1);
        assert!(!flag.get());
    }

    #[test]
    fn dropped_watchers_are_pruned_on_the_next_mutation() {
        let sprite = Sprite::new(2, 2);
        {
            let flag = Rc::new(Cell::new(false));
            sprite.watch(&flag);
        }
        sprite.fill();
        assert!(sprite.inner.borrow().watchers.is_empty());
    }

    #[test]
    fn fill_rect_clips_against_the_buffer() {
        let sprite = Sprite::new(4, 4);
        sprite.set_draw_color(RED);
        sprite.fill_rect(-2, -2, 100, 100);
        assert_eq!(sprite.pixel_at(0, 0), Some(RED));
        assert_eq!(sprite.pixel_at(3, 3), Some(RED));
    }

    #[test]
    fn oval_fill_stays_inside_its_bounding_rect() {
        let sprite = Sprite::new(10, 10);
        sprite.set_draw_color(RED);
        sprite.fill_oval(0, 0, 10, 10);
        assert_eq!(sprite.pixel_at(5, 5), Some(RED));
        assert_eq!(sprite.pixel_at(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn line_endpoints_are_drawn() {
        let sprite = Sprite::new(8, 8);
        sprite.set_draw_color(RED);
        sprite.draw_line(0, 0, 7, 7);
        assert_eq!(sprite.pixel_at(0, 0), Some(RED));
        assert_eq!(sprite.pixel_at(7, 7), Some(RED));
        assert_eq!(sprite.pixel_at(4, 4), Some(RED));
    }

    #[test]
    fn filled_triangle_covers_its_interior_only() {
        let sprite = Sprite::new(12, 12);
        sprite.set_draw_color(RED);
        sprite.fill_polygon(&[1, 11, 1], &[1, 11, 11]);
        assert_eq!(sprite.pixel_at(2, 9), Some(RED));
        assert_eq!(sprite.pixel_at(10, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn draw_image_composites_with_alpha() {
        let dst = Sprite::new(4, 4);
        dst.set_draw_color([0, 0, 255, 255]);
        dst.fill();
        let src = Sprite::new(2, 2);
        src.set_draw_color([255, 0, 0, 255]);
        src.fill();
        dst.draw_image(&src, 1, 1);
        assert_eq!(dst.pixel_at(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(dst.pixel_at(0, 0), Some([0, 0, 255, 255]));
    }

    #[test]
    fn draw_image_onto_itself_does_not_panic() {
        let sprite = Sprite::new(4, 4);
        sprite.set_draw_color(RED);
        sprite.fill_rect(0, 0, 1, 1);
        sprite.draw_image(&sprite.clone(), 2, 2);
        assert_eq!(sprite.pixel_at(2, 2), Some(RED));
    }

    #[test]
    fn scale_resizes_the_buffer() {
        let sprite = Sprite::new(4, 4);
        sprite.set_draw_color(RED);
        sprite.fill();
        sprite.scale(8, 2);
        assert_eq!(sprite.width(), 8);
        assert_eq!(sprite.height(), 2);
        assert_eq!(sprite.pixel_at(7, 1), Some(RED));
    }

    #[test]
    fn mirror_horizontally_swaps_columns() {
        let sprite = Sprite::new(2, 1);
        sprite.set_pixel_at(0, 0, RED);
        sprite.mirror_horizontally();
        assert_eq!(sprite.pixel_at(1, 0), Some(RED));
        assert_eq!(sprite.pixel_at(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn mirror_vertically_swaps_rows() {
        let sprite = Sprite::new(1, 2);
        sprite.set_pixel_at(0, 0, RED);
        sprite.mirror_vertically();
        assert_eq!(sprite.pixel_at(0, 1), Some(RED));
    }

    #[test]
    fn quarter_turn_moves_content_around_the_center() {
        let sprite = Sprite::new(3, 3);
        sprite.set_pixel_at(2, 1, RED);
        sprite.rotate(90);
        assert_eq!(sprite.pixel_at(1, 2), Some(RED));
        assert_eq!(sprite.pixel_at(2, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn text_sprite_is_sized_to_its_content() {
        let sprite = Sprite::from_text("GO", 1, RED, None);
        assert_eq!(sprite.width(), font::text_width("GO", 1) + 4);
        assert_eq!(sprite.height(), font::text_height(1) + 4);
        let mut found = false;
        for y in 0..sprite.height() {
            for x in 0..sprite.width() {
                if sprite.pixel_at(x, y) == Some(RED) {
                    found = true;
                }
            }
        }
        assert!(found);
    }

    #[test]
    fn draw_string_uses_draw_color_and_text_scale() {
        let sprite = Sprite::new(32, 16);
        sprite.set_draw_color(RED);
        sprite.set_text_scale(1);
        sprite.draw_string("HI", 0, 0);
        let mut count = 0;
        for y in 0..16 {
            for x in 0..32 {
                if sprite.pixel_at(x, y) == Some(RED) {
                    count += 1;
                }
            }
        }
        assert!(count > 0);
    }
}
