use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in host layout units (CSS pixels, terminal
/// cells, ...). `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Area of the rectangle. Degenerate (negative) extents count as zero.
    pub fn area(&self) -> f64 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    /// Overlapping region of two rectangles, if they overlap at all.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }
}

/// Fraction of `target`'s area that lies inside `viewport`, in `[0, 1]`.
///
/// A zero-area target counts as fully visible when its origin sits inside
/// the viewport, mirroring how browsers report empty elements.
pub fn intersection_ratio(target: &Rect, viewport: &Rect) -> f64 {
    let area = target.area();
    if area <= 0.0 {
        let inside = target.x >= viewport.x
            && target.x <= viewport.right()
            && target.y >= viewport.y
            && target.y <= viewport.bottom();
        return if inside { 1.0 } else { 0.0 };
    }
    target
        .intersection(viewport)
        .map_or(0.0, |overlap| (overlap.area() / area).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_inside_is_one() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        let target = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!((intersection_ratio(&target, &viewport) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn half_below_fold() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        let target = Rect::new(0.0, 80.0, 100.0, 40.0);
        assert!((intersection_ratio(&target, &viewport) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn disjoint_is_zero() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        let target = Rect::new(0.0, 150.0, 100.0, 40.0);
        assert_eq!(intersection_ratio(&target, &viewport), 0.0);
        assert!(target.intersection(&viewport).is_none());
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn empty_target_uses_origin() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(
            intersection_ratio(&Rect::new(50.0, 50.0, 0.0, 0.0), &viewport),
            1.0
        );
        assert_eq!(
            intersection_ratio(&Rect::new(50.0, 500.0, 0.0, 0.0), &viewport),
            0.0
        );
    }
}
