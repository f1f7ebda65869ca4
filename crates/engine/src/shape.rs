//! Rotated rectangle geometry used by the spatial queries.

/// Rectangle described by its center, full extents, and a rotation in
/// degrees about the center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub cx: f64,
    pub cy: f64,
    pub half_w: f64,
    pub half_h: f64,
    pub rotation_degrees: f64,
}

impl BoundingBox {
    pub fn new(cx: f64, cy: f64, width: f64, height: f64, rotation_degrees: f64) -> Self {
        Self {
            cx,
            cy,
            half_w: width / 2.0,
            half_h: height / 2.0,
            rotation_degrees,
        }
    }

    /// Shrinks both extents by `amount` on every side, never below zero.
    pub fn inset(mut self, amount: f64) -> Self {
        self.half_w = (self.half_w - amount).max(0.0);
        self.half_h = (self.half_h - amount).max(0.0);
        self
    }

    /// Point containment, tested in the rectangle's local frame.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (lx, ly) = rotate_point(x - self.cx, y - self.cy, -self.rotation_degrees);
        lx.abs() <= self.half_w && ly.abs() <= self.half_h
    }

    pub fn corners(&self) -> [(f64, f64); 4] {
        let local = [
            (-self.half_w, -self.half_h),
            (self.half_w, -self.half_h),
            (self.half_w, self.half_h),
            (-self.half_w, self.half_h),
        ];
        local.map(|(x, y)| {
            let (rx, ry) = rotate_point(x, y, self.rotation_degrees);
            (self.cx + rx, self.cy + ry)
        })
    }

    /// Maps a point given in the rectangle's local frame into world
    /// coordinates (rotation applied, then translation).
    pub fn offset_point(&self, dx: f64, dy: f64) -> (f64, f64) {
        let (rx, ry) = rotate_point(dx, dy, self.rotation_degrees);
        (self.cx + rx, self.cy + ry)
    }

    /// Separating-axis intersection test between two rotated rectangles.
    /// Shared edges count as intersecting.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        let mine = self.corners();
        let theirs = other.corners();
        for (ax, ay) in self.axes().into_iter().chain(other.axes()) {
            let (min_a, max_a) = project(&mine, ax, ay);
            let (min_b, max_b) = project(&theirs, ax, ay);
            if max_a < min_b || max_b < min_a {
                return false;
            }
        }
        true
    }

    fn axes(&self) -> [(f64, f64); 2] {
        let radians = self.rotation_degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        [(cos, sin), (-sin, cos)]
    }
}

fn rotate_point(x: f64, y: f64, degrees: f64) -> (f64, f64) {
    let radians = degrees.to_radians();
    let (sin, cos) = radians.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

fn project(corners: &[(f64, f64); 4], ax: f64, ay: f64) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for (x, y) in corners {
        let dot = x * ax + y * ay;
        min = min.min(dot);
        max = max.max(dot);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_aligned_containment_includes_edges() {
        let rect = BoundingBox::new(10.0, 10.0, 20.0, 10.0, 0.0);
        assert!(rect.contains(10.0, 10.0));
        assert!(rect.contains(0.0, 10.0));
        assert!(rect.contains(20.0, 15.0));
        assert!(!rect.contains(20.5, 10.0));
        assert!(!rect.contains(10.0, 15.5));
    }

    #[test]
    fn inset_shrinks_edges_out_of_containment() {
        let rect = BoundingBox::new(10.0, 10.0, 20.0, 10.0, 0.0).inset(0.5);
        assert!(!rect.contains(0.0, 10.0));
        assert!(rect.contains(0.5, 10.0));
    }

    #[test]
    fn inset_never_goes_negative() {
        let rect = BoundingBox::new(0.0, 0.0, 1.0, 1.0, 0.0).inset(5.0);
        assert_eq!(rect.half_w, 0.0);
        assert_eq!(rect.half_h, 0.0);
    }

    #[test]
    fn rotated_containment_follows_the_rectangle() {
        // 20x2 bar rotated 90 degrees becomes tall instead of wide.
        let rect = BoundingBox::new(0.0, 0.0, 20.0, 2.0, 90.0);
        assert!(rect.contains(0.0, 9.0));
        assert!(!rect.contains(9.0, 0.0));
    }

    #[test]
    fn separated_rectangles_do_not_intersect() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0, 0.0);
        let b = BoundingBox::new(20.0, 0.0, 10.0, 10.0, 0.0);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn overlapping_rectangles_intersect_symmetrically() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0, 0.0);
        let b = BoundingBox::new(6.0, 6.0, 10.0, 10.0, 45.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn rotation_can_separate_narrow_rectangles() {
        // Two thin bars side by side overlap when parallel but not when
        // one is rotated away.
        let a = BoundingBox::new(0.0, 0.0, 30.0, 2.0, 0.0);
        let parallel = BoundingBox::new(0.0, 1.0, 30.0, 2.0, 0.0);
        let crossed = BoundingBox::new(0.0, 8.0, 30.0, 2.0, 0.0);
        assert!(a.intersects(&parallel));
        assert!(!a.intersects(&crossed));
        let tilted = BoundingBox::new(0.0, 8.0, 30.0, 2.0, 90.0);
        assert!(a.intersects(&tilted));
    }

    #[test]
    fn offset_point_rotates_with_the_rectangle() {
        let rect = BoundingBox::new(10.0, 10.0, 4.0, 4.0, 90.0);
        let (x, y) = rect.offset_point(5.0, 0.0);
        assert!((x - 10.0).abs() < 1e-9);
        assert!((y - 15.0).abs() < 1e-9);
    }
}
