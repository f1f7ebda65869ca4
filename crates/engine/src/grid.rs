//! Integer cell/pixel conversions shared by world placement and queries.

/// Pixel coordinate of the center of `cell` for a given cell size.
pub fn cell_to_pixel_center(cell: i32, cell_size: i32) -> i32 {
    cell * cell_size + cell_size / 2
}

/// Cell index containing the pixel coordinate (floor division).
pub fn pixel_to_cell(pixel: i32, cell_size: i32) -> i32 {
    pixel.div_euclid(cell_size)
}

/// Clamps a pixel coordinate into a bounded axis of `extent_cells` cells.
pub fn clamp_to_bounds(pixel: i32, extent_cells: i32, cell_size: i32) -> i32 {
    let max = (extent_cells * cell_size - cell_size).max(0);
    pixel.clamp(0, max)
}

/// Normalizes a rotation in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: i32) -> i32 {
    ((degrees % 360) + 360) % 360
}
