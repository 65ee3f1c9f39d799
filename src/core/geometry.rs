use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in viewport (or page) pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// Shared area of two rectangles and that area as a fraction of the smaller one.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Overlap {
    pub area: f32,
    pub percentage: f32,
}

impl Overlap {
    pub const NONE: Overlap = Overlap {
        area: 0.0,
        percentage: 0.0,
    };
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_origin(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.left + self.right) * 0.5, (self.top + self.bottom) * 0.5)
    }

    /// Width over height; zero-height boxes have no meaningful ratio and report 0.
    pub fn aspect_ratio(&self) -> f32 {
        let height = self.height();
        if height <= 0.0 {
            0.0
        } else {
            self.width() / height
        }
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    pub fn is_finite(&self) -> bool {
        self.left.is_finite() && self.top.is_finite() && self.right.is_finite() && self.bottom.is_finite()
    }

    /// Intersection over the smaller of the two areas, so a box fully inside
    /// the other scores 1 regardless of which side is larger.
    pub fn overlap(&self, other: &Self) -> Overlap {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);

        if right < left || bottom < top {
            return Overlap::NONE;
        }

        let area = (right - left) * (bottom - top);
        let smaller = self.area().min(other.area());
        if smaller <= 0.0 {
            return Overlap { area, percentage: 0.0 };
        }

        Overlap {
            area,
            percentage: area / smaller,
        }
    }

    pub fn center_distance(&self, other: &Self) -> f32 {
        let (cx1, cy1) = self.center();
        let (cx2, cy2) = other.center();
        ((cx1 - cx2).powi(2) + (cy1 - cy2).powi(2)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn overlap_uses_smaller_area() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 15.0, 15.0);
        let overlap = a.overlap(&b);
        assert_eq!(overlap.area, 25.0);
        assert_eq!(overlap.percentage, 0.25);
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = Rect::new(0.0, 0.0, 100.0, 40.0);
        let b = Rect::new(30.0, 10.0, 60.0, 90.0);
        assert_eq!(a.overlap(&b), b.overlap(&a));
    }

    #[test]
    fn disjoint_rects_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.overlap(&b), Overlap::NONE);
    }

    #[test]
    fn contained_rect_overlaps_fully() {
        let outer = Rect::new(0.0, 0.0, 728.0, 90.0);
        let inner = Rect::new(100.0, 10.0, 200.0, 60.0);
        assert_eq!(outer.overlap(&inner).percentage, 1.0);
        assert_eq!(inner.overlap(&outer).percentage, 1.0);
    }

    #[test]
    fn degenerate_rect_reports_zero_percentage() {
        let line = Rect::new(0.0, 5.0, 10.0, 5.0);
        let b = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(line.overlap(&b).percentage, 0.0);
        assert_eq!(line.aspect_ratio(), 0.0);
    }

    #[test]
    fn computes_center_distance() {
        let a = Rect::from_origin(0.0, 0.0, 10.0, 10.0);
        let b = Rect::from_origin(3.0, 4.0, 10.0, 10.0);
        assert_eq!(a.center_distance(&b), 5.0);
    }
}
