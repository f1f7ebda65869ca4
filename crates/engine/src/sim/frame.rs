//! Read-only render snapshots and a software compositor.
//!
//! The simulation never calls into a renderer; a host asks the world
//! for a `FrameSnapshot` (cheap handles, no pixel copies) and either
//! consumes the poses itself or rasterizes them with [`compose`].

use image::{Rgba, RgbaImage};

use crate::font;
use crate::sprite::Sprite;

use super::actor::ActorId;
use super::world::World;

const OVERLAY_TEXT_SCALE: u32 = 3;
const OVERLAY_TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];
const OVERLAY_OUTLINE_COLOR: [u8; 4] = [0, 0, 0, 255];

#[derive(Clone)]
pub struct ActorPose {
    pub id: ActorId,
    pub sprite: Sprite,
    /// Pixel center.
    pub x: i32,
    pub y: i32,
    pub rotation: i32,
}

#[derive(Clone)]
pub struct TextOverlay {
    pub x: i32,
    pub y: i32,
    pub text: String,
}

#[derive(Clone)]
pub struct FrameSnapshot {
    pub width_px: u32,
    pub height_px: u32,
    pub background: Sprite,
    /// Back-to-front.
    pub actors: Vec<ActorPose>,
    pub text: Vec<TextOverlay>,
}

impl World {
    pub fn frame(&self) -> FrameSnapshot {
        let actors = self
            .paint_sequence()
            .into_iter()
            .filter_map(|id| {
                self.actor(id).map(|actor| {
                    let (x, y) = actor.location();
                    ActorPose {
                        id,
                        sprite: actor.sprite(),
                        x,
                        y,
                        rotation: actor.rotation(),
                    }
                })
            })
            .collect();
        let text = self
            .text_overlays()
            .into_iter()
            .map(|(x, y, text)| TextOverlay { x, y, text })
            .collect();
        FrameSnapshot {
            width_px: self.width_px(),
            height_px: self.height_px(),
            background: self.background(),
            actors,
            text,
        }
    }
}

/// Rasterizes a snapshot: tiled background, rotated actor sprites
/// back-to-front, then outlined overlay text centered on its position.
pub fn compose(frame: &FrameSnapshot) -> RgbaImage {
    let mut canvas = RgbaImage::new(frame.width_px.max(1), frame.height_px.max(1));
    tile_background(&mut canvas, &frame.background);
    for pose in &frame.actors {
        blit_rotated(&mut canvas, pose);
    }
    for overlay in &frame.text {
        draw_outlined_text(&mut canvas, overlay);
    }
    canvas
}

fn tile_background(canvas: &mut RgbaImage, background: &Sprite) {
    background.with_buffer(|tile| {
        let (tw, th) = (tile.width(), tile.height());
        if tw == 0 || th == 0 {
            return;
        }
        for ty in (0..canvas.height()).step_by(th as usize) {
            for tx in (0..canvas.width()).step_by(tw as usize) {
                for (sx, sy, pixel) in tile.enumerate_pixels() {
                    let dx = tx + sx;
                    let dy = ty + sy;
                    if dx < canvas.width() && dy < canvas.height() {
                        canvas.put_pixel(dx, dy, *pixel);
                    }
                }
            }
        }
    });
}

fn blit_rotated(canvas: &mut RgbaImage, pose: &ActorPose) {
    pose.sprite.with_buffer(|source| {
        let (sw, sh) = (source.width() as f64, source.height() as f64);
        let radius = (sw.hypot(sh) / 2.0).ceil() as i32;
        let radians = (pose.rotation as f64).to_radians();
        let (sin, cos) = radians.sin_cos();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let px = pose.x + dx;
                let py = pose.y + dy;
                if px < 0
                    || py < 0
                    || px as u32 >= canvas.width()
                    || py as u32 >= canvas.height()
                {
                    continue;
                }
                let ox = dx as f64 + 0.5;
                let oy = dy as f64 + 0.5;
                // Inverse mapping into the unrotated sprite.
                let sx = (ox * cos + oy * sin + sw / 2.0).floor() as i32;
                let sy = (-ox * sin + oy * cos + sh / 2.0).floor() as i32;
                if sx < 0 || sy < 0 || sx as f64 >= sw || sy as f64 >= sh {
                    continue;
                }
                let src = source.get_pixel(sx as u32, sy as u32).0;
                if src[3] == 0 {
                    continue;
                }
                let dst = canvas.get_pixel(px as u32, py as u32).0;
                canvas.put_pixel(px as u32, py as u32, Rgba(blend_over(dst, src)));
            }
        }
    });
}

fn draw_outlined_text(canvas: &mut RgbaImage, overlay: &TextOverlay) {
    let width = font::text_width(&overlay.text, OVERLAY_TEXT_SCALE) as i32;
    let height = font::text_height(OVERLAY_TEXT_SCALE) as i32;
    let left = overlay.x - width / 2;
    let top = overlay.y - height / 2;
    for (ox, oy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
        font::draw_text(
            canvas,
            left + ox,
            top + oy,
            &overlay.text,
            OVERLAY_TEXT_SCALE,
            OVERLAY_OUTLINE_COLOR,
        );
    }
    font::draw_text(
        canvas,
        left,
        top,
        &overlay.text,
        OVERLAY_TEXT_SCALE,
        OVERLAY_TEXT_COLOR,
    );
}

fn blend_over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let alpha = src[3] as u32;
    if alpha == 255 {
        return src;
    }
    let inv = 255 - alpha;
    let channel = |s: u8, d: u8| ((s as u32 * alpha + d as u32 * inv) / 255) as u8;
    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (alpha + dst[3] as u32 * inv / 255).min(255) as u8,
    ]
}
