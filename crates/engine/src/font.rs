//! Tiny 3x5 bitmap font for sprite text and frame overlays.

use image::RgbaImage;

pub(crate) const GLYPH_WIDTH: u32 = 3;
pub(crate) const GLYPH_HEIGHT: u32 = 5;

const SPACE: [u8; 5] = [0, 0, 0, 0, 0];

/// Row bitmaps for the printable ASCII range, indexed by `code - 32`.
/// Bit 2 is the leftmost column.
const GLYPHS: [[u8; 5]; 95] = [
    SPACE,                                   // ' '
    [0b010, 0b010, 0b010, 0b000, 0b010],     // !
    [0b101, 0b101, 0b000, 0b000, 0b000],     // "
    [0b101, 0b111, 0b101, 0b111, 0b101],     // #
    [0b111, 0b110, 0b111, 0b011, 0b111],     // $
    [0b101, 0b001, 0b010, 0b100, 0b101],     // %
    [0b010, 0b101, 0b010, 0b101, 0b011],     // &
    [0b010, 0b010, 0b000, 0b000, 0b000],     // '
    [0b001, 0b010, 0b010, 0b010, 0b001],     // (
    [0b100, 0b010, 0b010, 0b010, 0b100],     // )
    [0b000, 0b101, 0b010, 0b101, 0b000],     // *
    [0b000, 0b010, 0b111, 0b010, 0b000],     // +
    [0b000, 0b000, 0b000, 0b010, 0b100],     // ,
    [0b000, 0b000, 0b111, 0b000, 0b000],     // -
    [0b000, 0b000, 0b000, 0b000, 0b010],     // .
    [0b001, 0b001, 0b010, 0b100, 0b100],     // /
    [0b111, 0b101, 0b101, 0b101, 0b111],     // 0
    [0b010, 0b110, 0b010, 0b010, 0b111],     // 1
    [0b111, 0b001, 0b111, 0b100, 0b111],     // 2
    [0b111, 0b001, 0b111, 0b001, 0b111],     // 3
    [0b101, 0b101, 0b111, 0b001, 0b001],     // 4
    [0b111, 0b100, 0b111, 0b001, 0b111],     // 5
    [0b111, 0b100, 0b111, 0b101, 0b111],     // 6
    [0b111, 0b001, 0b010, 0b010, 0b010],     // 7
    [0b111, 0b101, 0b111, 0b101, 0b111],     // 8
    [0b111, 0b101, 0b111, 0b001, 0b111],     // 9
    [0b000, 0b010, 0b000, 0b010, 0b000],     // :
    [0b000, 0b010, 0b000, 0b010, 0b100],     // ;
    [0b001, 0b010, 0b100, 0b010, 0b001],     // <
    [0b000, 0b111, 0b000, 0b111, 0b000],     // =
    [0b100, 0b010, 0b001, 0b010, 0b100],     // >
    [0b111, 0b001, 0b011, 0b000, 0b010],     // ?
    [0b111, 0b101, 0b111, 0b100, 0b111],     // @
    [0b010, 0b101, 0b111, 0b101, 0b101],     // A
    [0b110, 0b101, 0b110, 0b101, 0b110],     // B
    [0b111, 0b100, 0b100, 0b100, 0b111],     // C
    [0b110, 0b101, 0b101, 0b101, 0b110],     // D
    [0b111, 0b100, 0b110, 0b100, 0b111],     // E
    [0b111, 0b100, 0b110, 0b100, 0b100],     // F
    [0b111, 0b100, 0b101, 0b101, 0b111],     // G
    [0b101, 0b101, 0b111, 0b101, 0b101],     // H
    [0b111, 0b010, 0b010, 0b010, 0b111],     // I
    [0b111, 0b001, 0b001, 0b101, 0b111],     // J
    [0b101, 0b101, 0b110, 0b101, 0b101],     // K
    [0b100, 0b100, 0b100, 0b100, 0b111],     // L
    [0b101, 0b111, 0b111, 0b101, 0b101],     // M
    [0b101, 0b111, 0b111, 0b111, 0b101],     // N
    [0b111, 0b101, 0b101, 0b101, 0b111],     // O
    [0b110, 0b101, 0b110, 0b100, 0b100],     // P
    [0b111, 0b101, 0b101, 0b111, 0b001],     // Q
    [0b110, 0b101, 0b110, 0b101, 0b101],     // R
    [0b111, 0b100, 0b111, 0b001, 0b111],     // S
    [0b111, 0b010, 0b010, 0b010, 0b010],     // T
    [0b101, 0b101, 0b101, 0b101, 0b111],     // U
    [0b101, 0b101, 0b101, 0b101, 0b010],     // V
    [0b101, 0b101, 0b111, 0b111, 0b101],     // W
    [0b101, 0b101, 0b010, 0b101, 0b101],     // X
    [0b101, 0b101, 0b010, 0b010, 0b010],     // Y
    [0b111, 0b001, 0b010, 0b100, 0b111],     // Z
    [0b110, 0b100, 0b100, 0b100, 0b110],     // [
    [0b100, 0b100, 0b010, 0b001, 0b001],     // backslash
    [0b011, 0b001, 0b001, 0b001, 0b011],     // ]
    [0b010, 0b101, 0b000, 0b000, 0b000],     // ^
    [0b000, 0b000, 0b000, 0b000, 0b111],     // _
    [0b100, 0b010, 0b000, 0b000, 0b000],     // `
    [0b000, 0b111, 0b001, 0b111, 0b111],     // a
    [0b100, 0b100, 0b110, 0b101, 0b110],     // b
    [0b000, 0b111, 0b100, 0b100, 0b111],     // c
    [0b001, 0b001, 0b111, 0b101, 0b111],     // d
    [0b000, 0b111, 0b110, 0b100, 0b111],     // e
    [0b011, 0b100, 0b110, 0b100, 0b100],     // f
    [0b000, 0b111, 0b101, 0b111, 0b001],     // g
    [0b100, 0b100, 0b110, 0b101, 0b101],     // h
    [0b010, 0b000, 0b010, 0b010, 0b010],     // i
    [0b001, 0b000, 0b001, 0b101, 0b010],     // j
    [0b100, 0b101, 0b110, 0b101, 0b101],     // k
    [0b100, 0b100, 0b100, 0b100, 0b111],     // l
    [0b000, 0b110, 0b111, 0b101, 0b101],     // m
    [0b000, 0b110, 0b101, 0b101, 0b101],     // n
    [0b000, 0b111, 0b101, 0b101, 0b111],     // o
    [0b000, 0b110, 0b101, 0b110, 0b100],     // p
    [0b000, 0b111, 0b101, 0b111, 0b001],     // q
    [0b000, 0b110, 0b101, 0b100, 0b100],     // r
    [0b000, 0b111, 0b110, 0b001, 0b111],     // s
    [0b010, 0b111, 0b010, 0b010, 0b011],     // t
    [0b000, 0b101, 0b101, 0b101, 0b111],     // u
    [0b000, 0b101, 0b101, 0b101, 0b010],     // v
    [0b000, 0b101, 0b101, 0b111, 0b010],     // w
    [0b000, 0b101, 0b010, 0b010, 0b101],     // x
    [0b000, 0b101, 0b101, 0b111, 0b001],     // y
    [0b000, 0b111, 0b001, 0b010, 0b111],     // z
    [0b011, 0b010, 0b110, 0b010, 0b011],     // {
    [0b010, 0b010, 0b010, 0b010, 0b010],     // |
    [0b110, 0b010, 0b011, 0b010, 0b110],     // }
    [0b000, 0b011, 0b110, 0b000, 0b000],     // ~
];

pub(crate) fn glyph_rows(ch: char) -> [u8; 5] {
    match ch {
        ' '..='~' => GLYPHS[ch as usize - 32],
        _ => SPACE,
    }
}

/// Horizontal advance per character at the given scale, including the
/// one-column gap.
pub(crate) fn glyph_advance(scale: u32) -> u32 {
    (GLYPH_WIDTH + 1) * scale
}

pub(crate) fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * glyph_advance(scale)
}

pub(crate) fn text_height(scale: u32) -> u32 {
    GLYPH_HEIGHT * scale
}

/// Draws `text` into `buffer` with its top-left corner at `(x, y)`,
/// clipping against the buffer edges.
pub(crate) fn draw_text(
    buffer: &mut RgbaImage,
    mut x: i32,
    y: i32,
    text: &str,
    scale: u32,
    color: [u8; 4],
) {
    for ch in text.chars() {
        draw_glyph(buffer, x, y, glyph_rows(ch), scale, color);
        x += glyph_advance(scale) as i32;
    }
}

fn draw_glyph(buffer: &mut RgbaImage, x: i32, y: i32, rows: [u8; 5], scale: u32, color: [u8; 4]) {
    let width = buffer.width() as i32;
    let height = buffer.height() as i32;
    let scale = scale.max(1) as i32;
    for (row_index, row_bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_WIDTH as i32 {
            if (row_bits & (1 << (GLYPH_WIDTH as i32 - 1 - col))) == 0 {
                continue;
            }
            for sy in 0..scale {
                let py = y + row_index as i32 * scale + sy;
                if py < 0 || py >= height {
                    continue;
                }
                for sx in 0..scale {
                    let px = x + col * scale + sx;
                    if px < 0 || px >= width {
                        continue;
                    }
                    buffer.put_pixel(px as u32, py as u32, image::Rgba(color));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];

    #[test]
    fn every_printable_ascii_character_has_a_glyph_slot() {
        for code in 32u8..=126u8 {
            // Must not panic; space is the only blank glyph besides itself.
            let rows = glyph_rows(char::from(code));
            assert_eq!(rows.len(), 5);
        }
    }

    #[test]
    fn non_ascii_characters_draw_as_blanks() {
        assert_eq!(glyph_rows('\u{e9}'), SPACE);
        assert_eq!(glyph_rows('\u{1f642}'), SPACE);
    }

    #[test]
    fn drawn_text_sets_pixels_inside_the_buffer() {
        let mut buffer = RgbaImage::new(16, 8);
        draw_text(&mut buffer, 0, 0, "A", 1, WHITE);
        assert!(buffer.pixels().any(|px| px.0 == WHITE));
    }

    #[test]
    fn negative_origin_clips_without_panicking() {
        let mut buffer = RgbaImage::new(8, 8);
        draw_text(&mut buffer, -10, -10, "XYZ", 2, WHITE);
        draw_text(&mut buffer, 100, 100, "XYZ", 2, WHITE);
    }

    #[test]
    fn width_scales_with_character_count() {
        assert_eq!(text_width("abc", 1), 12);
        assert_eq!(text_width("abc", 2), 24);
        assert_eq!(text_height(3), 15);
    }
}
